use serde::{Deserialize, Serialize};

/// Counters for a single document walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    pub located: usize,
    pub unlocated: usize,
    pub inexact_ends: usize,
}

/// Indexing statistics for one rebuild
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub documents: usize,
    pub paths: usize,
    pub unlocated_keys: usize,
    pub inexact_ends: usize,
    pub collisions: usize,
    pub time_ms: u64,
}

impl IndexStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_document(&mut self, stats: &DocumentStats) {
        self.documents += 1;
        self.unlocated_keys += stats.unlocated;
        self.inexact_ends += stats.inexact_ends;
    }
}
