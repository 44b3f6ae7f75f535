// src/memory.rs
// Process-wide associative memory: one weight store behind a reader/writer
// lock plus the recall engine. Exposes the five grid-level operations the
// transport layer consumes.

use crate::models::Grid;
use crate::utils::{flatten_grid, reshape};
use crate::{GridError, GridResult, MemoryConfig, RecallEngine, WeightStore};
use log::{debug, info};
use serde::Serialize;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecallResponse {
    pub grid: Grid,
    pub energy: i64,
}

#[derive(Debug)]
pub struct HopfieldMemory {
    config: MemoryConfig,
    store: RwLock<WeightStore>,
    engine: RecallEngine,
}

impl HopfieldMemory {
    pub fn new(config: MemoryConfig) -> GridResult<Self> {
        config.validate()?;
        info!(
            "Hopfield memory ready: {}x{} grid, {} weights, max {} sweeps",
            config.grid_size,
            config.grid_size,
            config.pattern_len() * config.pattern_len(),
            config.max_iterations
        );
        Ok(Self {
            config,
            store: RwLock::new(WeightStore::new(config.grid_size)),
            engine: RecallEngine::new(config.max_iterations),
        })
    }

    // Poisoned locks are recovered: the store is only mutated after validation.
    fn read_store(&self) -> RwLockReadGuard<'_, WeightStore> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_store(&self) -> RwLockWriteGuard<'_, WeightStore> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hebbian-learn one grid
    pub fn learn(&self, grid: &[Vec<i64>]) -> GridResult<()> {
        let pattern = flatten_grid(grid, &self.config)?;
        let mut store = self.write_store();
        store.learn(pattern)?;
        info!("Pattern memorized ({} total)", store.pattern_count());
        Ok(())
    }

    /// Clean up a noisy grid against the current weights
    pub fn recall(&self, grid: &[Vec<i64>]) -> GridResult<RecallResponse> {
        let pattern = flatten_grid(grid, &self.config)?;
        let outcome = {
            let store = self.read_store();
            self.engine.recall(store.weights(), &pattern)?
        };
        debug!(
            "Recall finished after {} sweeps (converged: {}, energy: {})",
            outcome.iterations, outcome.converged, outcome.energy
        );
        Ok(RecallResponse {
            grid: reshape(&outcome.pattern, self.config.grid_size),
            energy: outcome.energy,
        })
    }

    /// Every memorized grid in learning order
    pub fn recall_all(&self) -> GridResult<Vec<Grid>> {
        let store = self.read_store();
        if store.pattern_count() == 0 {
            return Err(GridError::NoPatterns);
        }
        Ok(store.all_grids())
    }

    pub fn pattern_count(&self) -> usize {
        self.read_store().pattern_count()
    }

    pub fn clear(&self) {
        self.write_store().clear();
        info!("Memory cleared");
    }

    /// Run a closure against a consistent view of the store
    pub fn with_store<R>(&self, f: impl FnOnce(&WeightStore) -> R) -> R {
        f(&self.read_store())
    }
}
