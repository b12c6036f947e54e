//! Read-only seam onto the bound data source.
//!
//! The engine never owns the data it addresses; it only needs the row
//! population to bound row-derived slots, and stable row keys when
//! expansion state is persisted.

/// Minimal data-source surface consumed by the slot space.
pub trait RowProvider {
    /// Total number of flat rows in the source.
    fn row_count(&self) -> usize;

    /// Stable key for a row, used when persisting expansion state with a
    /// caller-supplied key function. Defaults to no key.
    fn row_key(&self, index: usize) -> Option<String> {
        let _ = index;
        None
    }
}

/// In-memory provider over a plain vector of row keys. Handy for tests
/// and debug tooling.
#[derive(Debug, Clone, Default)]
pub struct VecRowProvider {
    keys: Vec<String>,
}

impl VecRowProvider {
    pub fn new(keys: Vec<String>) -> Self {
        Self { keys }
    }

    pub fn with_count(count: usize) -> Self {
        Self {
            keys: (0..count).map(|i| format!("row-{i}")).collect(),
        }
    }
}

impl RowProvider for VecRowProvider {
    fn row_count(&self) -> usize {
        self.keys.len()
    }

    fn row_key(&self, index: usize) -> Option<String> {
        self.keys.get(index).cloned()
    }
}
