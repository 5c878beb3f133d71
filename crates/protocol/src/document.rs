use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Opaque identifier of an indexed source document (usually its path).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path component, used for short "defined in" labels.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0
            .rsplit(|c| c == '/' || c == '\\')
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&Path> for DocumentId {
    fn from(value: &Path) -> Self {
        let mut normalized = value.to_string_lossy().to_string();
        if normalized.contains('\\') {
            normalized = normalized.replace('\\', "/");
        }
        Self(normalized)
    }
}
