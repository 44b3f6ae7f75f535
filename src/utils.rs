// src/utils.rs
// Grid <-> pattern conversion at the representation boundary, plus noise
// injection for exercising recall. The core never sees the 2D form.

use crate::{GridError, GridResult, MemoryConfig, Pattern};
use crate::models::Grid;
use log::debug;
use rand::Rng;

/// Flatten an N×N grid row-major into a pattern, validating shape and cells.
pub fn flatten_grid(grid: &[Vec<i64>], config: &MemoryConfig) -> GridResult<Pattern> {
    if grid.is_empty() || grid.iter().all(|row| row.is_empty()) {
        return Err(GridError::InvalidInput("grid is empty".into()));
    }

    let n = config.grid_size;
    if grid.len() != n {
        return Err(GridError::MalformedGrid(format!(
            "expected {} rows, got {}",
            n,
            grid.len()
        )));
    }

    let mut cells = Vec::with_capacity(config.pattern_len());
    for (r, row) in grid.iter().enumerate() {
        if row.len() != n {
            return Err(GridError::MalformedGrid(format!(
                "row {} has {} cells, expected {}",
                r,
                row.len(),
                n
            )));
        }
        for (c, &value) in row.iter().enumerate() {
            cells.push(validate_cell(value, config.allow_zero_cells).ok_or_else(|| {
                GridError::MalformedGrid(format!("cell ({}, {}) has value {}", r, c, value))
            })?);
        }
    }

    debug!("Flattened {}x{} grid into pattern of length {}", n, n, cells.len());
    Ok(Pattern::new(cells))
}

fn validate_cell(value: i64, allow_zero: bool) -> Option<i8> {
    match value {
        1 => Some(1),
        -1 => Some(-1),
        0 if allow_zero => Some(0),
        _ => None,
    }
}

/// Inverse of `flatten_grid`: split a pattern into rows of `grid_size` cells.
pub fn reshape(pattern: &Pattern, grid_size: usize) -> Grid {
    pattern
        .cells()
        .chunks(grid_size.max(1))
        .map(|row| row.iter().map(|&c| c as i64).collect())
        .collect()
}

/// Flip each cell's sign independently with probability `flip_probability`.
/// Zero cells stay zero; a non-finite probability flips nothing.
pub fn add_noise<R: Rng>(grid: &[Vec<i64>], flip_probability: f64, rng: &mut R) -> Grid {
    let p = if flip_probability.is_finite() {
        flip_probability.clamp(0.0, 1.0)
    } else {
        0.0
    };
    grid.iter()
        .map(|row| {
            row.iter()
                .map(|&cell| if rng.gen_bool(p) { -cell } else { cell })
                .collect()
        })
        .collect()
}
