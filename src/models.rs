// src/models.rs
// Value types shared by the store, the engine and the transport layer

/// Transport form: N rows of N integer cells, row-major
pub type Grid = Vec<Vec<i64>>;

/// Flattened cell vector of length L = N².
/// Learned and recalled patterns are bipolar (-1 / +1); a literal 0 only
/// appears when the memory was configured to accept zero cells.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    cells: Vec<i8>,
}

impl Pattern {
    pub fn new(cells: Vec<i8>) -> Self {
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[i8] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<i8> {
        self.cells
    }

    pub fn is_bipolar(&self) -> bool {
        self.cells.iter().all(|&c| c == 1 || c == -1)
    }

    /// Number of positions where the two patterns disagree
    pub fn hamming_distance(&self, other: &Pattern) -> usize {
        self.cells
            .iter()
            .zip(&other.cells)
            .filter(|(a, b)| a != b)
            .count()
            + self.cells.len().abs_diff(other.cells.len())
    }
}

impl From<Vec<i8>> for Pattern {
    fn from(cells: Vec<i8>) -> Self {
        Self::new(cells)
    }
}

/// Result of one recall run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecallOutcome {
    pub pattern: Pattern,
    pub energy: i64,       // Energy of `pattern`
    pub iterations: usize, // Sweeps actually performed
    pub converged: bool,   // false when the iteration cap was hit
}
