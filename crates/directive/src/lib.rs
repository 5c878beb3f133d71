//! # Datapath Directive
//!
//! Recognizes template output directives such as `{{%- s(Hero.title) %}}` and
//! `{{%= CONST.Video.kind %}}` in arbitrary text and extracts the dotted path they reference.
//!
//! The parser knows nothing about indexed data: every query is a total function returning
//! `Option` or `Vec`.

mod grammar;
mod parser;
mod types;

pub use parser::{DirectiveParser, DEFAULT_NAMESPACES};
pub use types::{
    CompletionQuery, DirectiveForm, DirectiveMatch, DirectiveOccurrence, DirectiveSpan,
    OutputFunction,
};
