//! # Datapath Indexer
//!
//! Flattens JSON data documents into a table of dotted key paths, each pointing back to
//! the line where the key is declared.
//!
//! ## Pipeline
//!
//! ```text
//! Documents
//!     │
//!     ├──> Parser (serde_json, key order preserved)
//!     │      └─> Value tree
//!     │
//!     ├──> Walker (forward-only key search)
//!     │      └─> path -> { document, line, column, end, value }
//!     │
//!     └──> Publisher (atomic snapshot swap)
//!            └─> Arc<PathIndex> for readers
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use datapath_indexer::{IndexPublisher, SourceDocument};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let publisher = IndexPublisher::default();
//!     let docs = vec![SourceDocument::new("data.json", r#"{"Hero": {"title": "Hi"}}"#)];
//!     publisher.rebuild(docs).await?;
//!
//!     let index = publisher.snapshot();
//!     println!("Hero.title declared on line {}", index.get("Hero.title").unwrap().start_line);
//!     Ok(())
//! }
//! ```

mod error;
mod indexer;
mod locate;
mod options;
mod path_index;
mod publisher;
mod stats;
mod watcher;

pub use error::{IndexerError, Result};
pub use indexer::{
    build_path_index, build_path_index_parallel, index_document, BuiltIndex, DocumentIndex,
};
pub use options::{DuplicatePolicy, IndexOptions, DEFAULT_MAX_SCAN_LINES};
pub use path_index::{IndexEntry, PathCollision, PathIndex, SourceDocument};
pub use publisher::{IndexPublisher, PublishedIndex, RebuildOutcome, RebuildTicket};
pub use serde_json::Value;
pub use stats::{DocumentStats, IndexStats};
pub use watcher::{IndexUpdate, IndexerHealth, StreamingIndexer, StreamingIndexerConfig};
