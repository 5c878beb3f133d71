use crate::DocumentId;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const TOP_LEVEL_SORT_PREFIX: &str = "0_";
pub const CHILD_SORT_PREFIX: &str = "1_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CompletionKind {
    TopLevelKey,
    ChildProperty,
}

/// One completion suggestion for a partially typed dotted path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CompletionCandidate {
    pub name: String,
    pub insert_text: String,
    pub kind: CompletionKind,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    pub sort_key: String,
}

impl CompletionCandidate {
    #[must_use]
    pub fn top_level(name: &str) -> Self {
        Self {
            name: name.to_string(),
            insert_text: name.to_string(),
            kind: CompletionKind::TopLevelKey,
            detail: "Top-level key".to_string(),
            documentation: None,
            sort_key: format!("{TOP_LEVEL_SORT_PREFIX}{name}"),
        }
    }

    #[must_use]
    pub fn child(name: &str, detail: String, documentation: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            insert_text: name.to_string(),
            kind: CompletionKind::ChildProperty,
            detail,
            documentation,
            sort_key: format!("{CHILD_SORT_PREFIX}{name}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

/// Display payload for hovering a resolved directive path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HoverPayload {
    pub path: String,
    pub value_text: String,
    pub value_kind: ValueKind,
    pub document_id: DocumentId,
    pub file_name: String,
    /// 1-based line of the key declaration.
    pub line: usize,
    pub markdown: String,
}

/// Jump target for go-to-definition (0-based line and column).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DefinitionTarget {
    pub document_id: DocumentId,
    pub line: usize,
    pub column: usize,
}
