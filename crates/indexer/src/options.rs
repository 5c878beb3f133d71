use serde::{Deserialize, Serialize};

/// Lines examined past a key before a container end is approximated.
pub const DEFAULT_MAX_SCAN_LINES: usize = 5_000;

/// Which definition survives when several documents define the same path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The document processed later overrides earlier ones.
    #[default]
    LastWins,
    /// The first definition is kept, later ones are dropped.
    FirstWins,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexOptions {
    pub max_scan_lines: usize,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            max_scan_lines: DEFAULT_MAX_SCAN_LINES,
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

impl IndexOptions {
    #[must_use]
    pub const fn with_max_scan_lines(mut self, lines: usize) -> Self {
        self.max_scan_lines = lines;
        self
    }

    #[must_use]
    pub const fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }
}
