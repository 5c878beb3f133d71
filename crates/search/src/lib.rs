//! # Datapath Search
//!
//! Answers editor queries against a published [`PathIndex`](datapath_indexer::PathIndex):
//!
//! - **Completion**: immediate children or top-level keys for a partially typed path
//! - **Hover / definition**: the value and declaration site behind a directive
//! - **Check**: directives that reference paths missing from the index
//! - **Find**: fuzzy search over every indexed path

mod fuzzy;
mod navigator;
mod resolver;

pub use fuzzy::{PathFinder, PathMatch};
pub use navigator::{Navigator, NavigatorConfig, UnresolvedDirective};
pub use resolver::{
    resolve_location, suggest, value_kind, PathResolver, DEFAULT_PREVIEW_MAX_CHARS,
};
