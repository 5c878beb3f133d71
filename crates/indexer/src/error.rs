use datapath_protocol::DocumentId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("JSON parse error in {document} at line {line}, column {column}: {message}")]
    Parse {
        document: DocumentId,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Indexing task failed: {0}")]
    Task(String),

    #[error("{0}")]
    Other(String),
}

impl IndexerError {
    pub(crate) fn parse(document: &DocumentId, err: &serde_json::Error) -> Self {
        Self::Parse {
            document: document.clone(),
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }

    #[must_use]
    pub const fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}
