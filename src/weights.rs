// src/weights.rs
// Hebbian outer-product learning into a dense symmetric weight matrix.
// Unlike a Willshaw net the weights are signed and accumulate without bound.

use crate::models::Grid;
use crate::utils::reshape;
use crate::{GridError, GridResult, Pattern};
use log::debug;
use ndarray::Array2;

#[derive(Debug, Clone)]
pub struct WeightStore {
    grid_size: usize,
    pattern_len: usize,
    weights: Array2<i64>,     // L×L, symmetric, zero diagonal
    memorized: Vec<Pattern>,  // Learning order, not consulted by recall
}

impl WeightStore {
    pub fn new(grid_size: usize) -> Self {
        let pattern_len = grid_size * grid_size;
        Self {
            grid_size,
            pattern_len,
            weights: Array2::zeros((pattern_len, pattern_len)),
            memorized: Vec::new(),
        }
    }

    pub fn pattern_len(&self) -> usize {
        self.pattern_len
    }

    /// Store a pattern: W[i][j] += p[i] * p[j] for every i != j.
    /// Nothing is mutated if the pattern is rejected.
    pub fn learn(&mut self, pattern: Pattern) -> GridResult<()> {
        if pattern.is_empty() {
            return Err(GridError::InvalidInput("pattern is empty".into()));
        }
        if pattern.len() != self.pattern_len {
            return Err(GridError::MalformedGrid(format!(
                "pattern length {} does not match {}",
                pattern.len(),
                self.pattern_len
            )));
        }

        let cells = pattern.cells();
        for (i, mut row) in self.weights.outer_iter_mut().enumerate() {
            let pi = cells[i] as i64;
            if pi == 0 {
                continue;
            }
            for (j, w) in row.iter_mut().enumerate() {
                if i != j {
                    *w += pi * cells[j] as i64;
                }
            }
        }

        self.memorized.push(pattern);
        debug!("Stored pattern {} (length {})", self.memorized.len(), self.pattern_len);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.weights.fill(0);
        self.memorized.clear();
    }

    pub fn pattern_count(&self) -> usize {
        self.memorized.len()
    }

    /// Every memorized pattern reshaped to grid form, in learning order
    pub fn all_grids(&self) -> Vec<Grid> {
        self.memorized
            .iter()
            .map(|p| reshape(p, self.grid_size))
            .collect()
    }

    pub fn weights(&self) -> &Array2<i64> {
        &self.weights
    }

    pub fn weight(&self, i: usize, j: usize) -> i64 {
        self.weights[[i, j]]
    }
}
