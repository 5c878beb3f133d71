use serde::Serialize;

/// Output function of a wrapped-call directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFunction {
    /// `s(..)`, HTML-escaped string output.
    Escaped,
    /// `o(..)`, raw or object output.
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum DirectiveForm {
    /// `{{%- s(path) %}}`; `transform` records the optional `-` after the opening marker.
    WrappedCall {
        function: OutputFunction,
        transform: bool,
    },
    /// `{{%= path %}}`
    BareExpression,
}

/// Position of a whole directive, opening marker through closing marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DirectiveSpan {
    pub line: usize,
    pub start_column: usize,
    /// Exclusive.
    pub end_column: usize,
}

impl DirectiveSpan {
    /// Both ends count as inside, so a cursor right after the closing marker still matches.
    #[must_use]
    pub const fn contains(&self, column: usize) -> bool {
        self.start_column <= column && column <= self.end_column
    }
}

/// Directive found under a cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectiveMatch {
    /// Trimmed inner expression, namespace prefix included.
    pub full_path: String,
    pub namespace_prefix: Option<String>,
    /// `full_path` up to the end of the segment under the cursor.
    pub partial_path_at_cursor: String,
    pub span: DirectiveSpan,
    pub form: DirectiveForm,
}

/// One directive found by a bulk scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectiveOccurrence {
    pub path: String,
    pub namespace_prefix: Option<String>,
    pub form: DirectiveForm,
    pub span: DirectiveSpan,
}

/// Text typed so far inside a possibly unclosed directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionQuery {
    pub partial_path: String,
    /// Char column where the segment being typed starts.
    pub replace_start: usize,
    /// Char column of the cursor.
    pub replace_end: usize,
}
