//! # Datapath Protocol
//!
//! Types shared between the indexer, the resolver and the command line front end.
//! Everything here is plain data: serializable, cheap to clone, free of behaviour beyond
//! position arithmetic.

mod document;
mod line_index;
mod payload;

pub use document::DocumentId;
pub use line_index::{byte_offset_of_char, char_column, LineIndex};
pub use payload::{
    CompletionCandidate, CompletionKind, DefinitionTarget, HoverPayload, ValueKind,
    CHILD_SORT_PREFIX, TOP_LEVEL_SORT_PREFIX,
};

/// Separator between the segments of a dotted path.
pub const PATH_SEPARATOR: char = '.';
