// src/recall.rs
// Energy-minimizing recall over a learned weight matrix.
// Each sweep computes every cell's net input from the snapshot taken at the
// start of the sweep, then stops as soon as a sweep leaves the energy unchanged.

use crate::config::DEFAULT_MAX_ITERATIONS;
use crate::models::RecallOutcome;
use crate::{GridError, GridResult, Pattern};
use log::debug;
use ndarray::Array2;
use rayon::prelude::*;

/// Patterns at least this long compute net inputs in parallel
const PARALLEL_MIN_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecallEngine {
    max_iterations: usize,
}

impl Default for RecallEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITERATIONS)
    }
}

impl RecallEngine {
    pub fn new(max_iterations: usize) -> Self {
        Self { max_iterations }
    }

    /// E = -Σ_{i<j} W[i][j] · v[i] · v[j]
    pub fn energy(weights: &Array2<i64>, state: &[i8]) -> i64 {
        let n = state.len();
        let mut energy = 0i64;
        for i in 0..n {
            let si = state[i] as i64;
            if si == 0 {
                continue;
            }
            let row = weights.row(i);
            let partial: i64 = (i + 1..n).map(|j| row[j] * state[j] as i64).sum();
            energy -= si * partial;
        }
        energy
    }

    /// Σ_j W[i][j] · state[j]
    pub fn net_input(weights: &Array2<i64>, state: &[i8], i: usize) -> i64 {
        weights
            .row(i)
            .iter()
            .zip(state)
            .map(|(&w, &s)| w * s as i64)
            .sum()
    }

    /// Zero net input maps to -1, never left unchanged.
    fn activate(net: i64) -> i8 {
        if net > 0 {
            1
        } else {
            -1
        }
    }

    fn sweep(weights: &Array2<i64>, prev: &[i8]) -> Vec<i8> {
        if prev.len() >= PARALLEL_MIN_LEN {
            (0..prev.len())
                .into_par_iter()
                .map(|i| Self::activate(Self::net_input(weights, prev, i)))
                .collect()
        } else {
            (0..prev.len())
                .map(|i| Self::activate(Self::net_input(weights, prev, i)))
                .collect()
        }
    }

    /// Iterate sweeps from `noisy` until the energy stops changing or the
    /// iteration cap is reached. Hitting the cap is not an error.
    pub fn recall(&self, weights: &Array2<i64>, noisy: &Pattern) -> GridResult<RecallOutcome> {
        if noisy.is_empty() {
            return Err(GridError::InvalidInput("no grid data received".into()));
        }
        let (rows, cols) = weights.dim();
        if rows != cols || noisy.len() != rows {
            return Err(GridError::MalformedGrid(format!(
                "pattern length {} does not match weight matrix {}x{}",
                noisy.len(),
                rows,
                cols
            )));
        }

        let mut state = noisy.cells().to_vec();
        let mut energy = Self::energy(weights, &state);
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            state = Self::sweep(weights, &state);
            iterations += 1;

            let next_energy = Self::energy(weights, &state);
            debug!("Sweep {}: energy {} -> {}", iterations, energy, next_energy);
            if next_energy == energy {
                converged = true;
                break;
            }
            energy = next_energy;
        }

        if !converged {
            debug!("Recall stopped at iteration cap {} with energy {}", self.max_iterations, energy);
        }

        Ok(RecallOutcome {
            pattern: Pattern::new(state),
            energy,
            iterations,
            converged,
        })
    }
}
