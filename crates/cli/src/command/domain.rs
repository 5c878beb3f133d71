use anyhow::Result;
use datapath_indexer::{IndexStats, PathCollision, Value};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandRequest {
    Index { include_paths: bool },
    Complete(CursorPayload),
    Hover(CursorPayload),
    Definition(CursorPayload),
    Check { files: Vec<PathBuf> },
    Find { query: String, limit: usize },
}

impl CommandRequest {
    pub const fn action(&self) -> CommandAction {
        match self {
            Self::Index { .. } => CommandAction::Index,
            Self::Complete(_) => CommandAction::Complete,
            Self::Hover(_) => CommandAction::Hover,
            Self::Definition(_) => CommandAction::Definition,
            Self::Check { .. } => CommandAction::Check,
            Self::Find { .. } => CommandAction::Find,
        }
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommandAction {
    Index,
    Complete,
    Hover,
    Definition,
    Check,
    Find,
}

/// Template position, 0-based line and char column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorPayload {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub status: CommandStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<CommandAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<Hint>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub meta: ResponseMeta,
    /// Process exit code; not part of the JSON output.
    #[serde(skip)]
    pub exit_code: u8,
}

impl CommandResponse {
    pub fn error(message: String) -> Self {
        Self {
            status: CommandStatus::Error,
            action: None,
            message: Some(message),
            hints: Vec::new(),
            data: Value::Null,
            meta: ResponseMeta::default(),
            exit_code: 2,
        }
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Ok,
    Error,
}

#[derive(Debug, Serialize, Clone)]
pub struct Hint {
    #[serde(rename = "type")]
    pub kind: HintKind,
    pub text: String,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HintKind {
    Info,
    Warn,
}

#[derive(Debug, Serialize, Default, Clone)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_generation: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_documents: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_paths: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing_index_ms: Option<u64>,
}

pub struct CommandOutcome {
    pub data: Value,
    pub hints: Vec<Hint>,
    pub meta: ResponseMeta,
    pub exit_code: u8,
    pub started: Instant,
}

impl CommandOutcome {
    pub fn from_value<T: Serialize>(value: T) -> Result<Self> {
        Ok(Self {
            data: serde_json::to_value(value)?,
            hints: Vec::new(),
            meta: ResponseMeta::default(),
            exit_code: 0,
            started: Instant::now(),
        })
    }

    pub fn hint(&mut self, kind: HintKind, text: impl Into<String>) {
        self.hints.push(Hint {
            kind,
            text: text.into(),
        });
    }
}

#[derive(Debug, Serialize)]
pub struct IndexOutput {
    pub stats: IndexStats,
    pub documents: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub collisions: Vec<PathCollision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<Vec<PathSummary>>,
}

#[derive(Debug, Serialize)]
pub struct PathSummary {
    pub path: String,
    pub document: String,
    pub line: usize,
    pub column: usize,
    pub kind: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CheckOutput {
    pub files: usize,
    pub directives: usize,
    pub unresolved: Vec<CheckFinding>,
}

#[derive(Debug, Serialize)]
pub struct CheckFinding {
    pub file: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace_prefix: Option<String>,
    pub line: usize,
    pub start_column: usize,
    pub end_column: usize,
}
