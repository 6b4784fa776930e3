//! Configuration for the snapshot history.

use serde::{Deserialize, Serialize};

/// Configuration for [`crate::History`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of unpinned snapshots kept at once. Pinned
    /// snapshots (nodes carrying `ForceSnapshot`) do not count against
    /// this limit.
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { capacity: 200 }
    }
}

impl HistoryConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}
