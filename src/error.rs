// src/error.rs
// Error taxonomy for grid memory operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridError {
    /// Grid absent, null or empty
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Grid present but not N×N, or holding a cell outside the allowed values
    #[error("Malformed grid: {0}")]
    MalformedGrid(String),

    /// Listing requested before anything was memorized
    #[error("No patterns memorized")]
    NoPatterns,

    /// Configuration rejected at startup
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GridError {
    /// Errors caused by the caller's request rather than the process.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            GridError::InvalidInput(_)
                | GridError::MalformedGrid(_)
                | GridError::NoPatterns
                | GridError::Json(_)
        )
    }
}

/// Top-level result type for the crate
pub type GridResult<T> = Result<T, GridError>;
