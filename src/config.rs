// src/config.rs
// Explicit sizing for the memory and the HTTP adapter. Grid side length is
// carried here and threaded into the store and engine, never a free constant.

use crate::{GridError, GridResult};

pub const DEFAULT_GRID_SIZE: usize = 35;
pub const DEFAULT_MAX_ITERATIONS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryConfig {
    pub grid_size: usize,      // N: side of the square grid
    pub max_iterations: usize, // Soft cap on recall sweeps
    pub allow_zero_cells: bool, // Accept literal 0 cells as multiplicative zeros
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            allow_zero_cells: false,
        }
    }
}

impl MemoryConfig {
    pub fn new(grid_size: usize) -> Self {
        Self {
            grid_size,
            ..Self::default()
        }
    }

    /// L = N², the length of every flattened pattern
    pub fn pattern_len(&self) -> usize {
        self.grid_size * self.grid_size
    }

    pub fn validate(&self) -> GridResult<()> {
        if self.grid_size == 0 {
            return Err(GridError::Config("grid size must be at least 1".into()));
        }
        if self.max_iterations == 0 {
            return Err(GridError::Config("max iterations must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: 4,
            max_body_bytes: 1 << 20,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> GridResult<()> {
        if self.workers == 0 {
            return Err(GridError::Config("need at least one worker thread".into()));
        }
        if self.max_body_bytes == 0 {
            return Err(GridError::Config("body limit must be positive".into()));
        }
        Ok(())
    }
}
