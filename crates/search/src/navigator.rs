use crate::resolver::{
    pretty_json, resolve_location, value_kind, PathResolver, DEFAULT_PREVIEW_MAX_CHARS,
};
use datapath_directive::{DirectiveParser, DirectiveSpan, DEFAULT_NAMESPACES};
use datapath_indexer::{IndexEntry, PathIndex, Value};
use datapath_protocol::{CompletionCandidate, DefinitionTarget, HoverPayload};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    /// Characters of pretty JSON shown for object and array candidates.
    pub preview_max_chars: usize,
    /// Leading tokens that may be stripped when a directive path is not indexed as written.
    pub namespaces: Vec<String>,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            preview_max_chars: DEFAULT_PREVIEW_MAX_CHARS,
            namespaces: DEFAULT_NAMESPACES.iter().map(ToString::to_string).collect(),
        }
    }
}

/// A directive whose path is missing from the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedDirective {
    pub path: String,
    pub namespace_prefix: Option<String>,
    pub span: DirectiveSpan,
}

/// Completion, hover and go-to-definition for directives in template text.
///
/// Every query takes the index snapshot explicitly, so a caller holding an `Arc<PathIndex>`
/// answers consistently even while a rebuild is being published.
#[derive(Debug, Clone)]
pub struct Navigator {
    parser: DirectiveParser,
    resolver: PathResolver,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(NavigatorConfig::default())
    }
}

impl Navigator {
    #[must_use]
    pub fn new(config: NavigatorConfig) -> Self {
        Self {
            parser: DirectiveParser::with_namespaces(config.namespaces),
            resolver: PathResolver::new(config.preview_max_chars),
        }
    }

    #[must_use]
    pub const fn parser(&self) -> &DirectiveParser {
        &self.parser
    }

    /// Candidates for the path being typed at `cursor`; empty outside a directive.
    #[must_use]
    pub fn complete(
        &self,
        index: &PathIndex,
        line_text: &str,
        cursor: usize,
    ) -> Vec<CompletionCandidate> {
        self.parser
            .completion_query_at(line_text, cursor)
            .map(|query| self.resolver.suggest(index, &query.partial_path))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn hover(&self, index: &PathIndex, line_text: &str, cursor: usize) -> Option<HoverPayload> {
        let entry = self.resolve_at(index, line_text, cursor)?;
        let value_text = display_value(&entry.value);
        let file_name = entry.document_id.file_name().to_string();
        let line = entry.start_line + 1;
        let markdown = format!("```json\n{value_text}\n```\n\nDefined in: {file_name}:{line}");

        Some(HoverPayload {
            path: entry.path.clone(),
            value_kind: value_kind(&entry.value),
            value_text,
            document_id: entry.document_id.clone(),
            file_name,
            line,
            markdown,
        })
    }

    #[must_use]
    pub fn definition(
        &self,
        index: &PathIndex,
        line_text: &str,
        cursor: usize,
    ) -> Option<DefinitionTarget> {
        self.resolve_at(index, line_text, cursor)
            .map(|entry| DefinitionTarget {
                document_id: entry.document_id.clone(),
                line: entry.start_line,
                column: entry.start_column,
            })
    }

    /// Directives in `text` whose path cannot be resolved, in document order.
    #[must_use]
    pub fn check(&self, index: &PathIndex, text: &str) -> Vec<UnresolvedDirective> {
        self.parser
            .extract_all(text)
            .into_iter()
            .filter(|o| resolve_location(index, &o.path, o.namespace_prefix.as_deref()).is_none())
            .map(|o| UnresolvedDirective {
                path: o.path,
                namespace_prefix: o.namespace_prefix,
                span: o.span,
            })
            .collect()
    }

    fn resolve_at<'i>(
        &self,
        index: &'i PathIndex,
        line_text: &str,
        cursor: usize,
    ) -> Option<&'i IndexEntry> {
        let found = self.parser.match_at(line_text, cursor)?;
        let entry = resolve_location(index, &found.full_path, found.namespace_prefix.as_deref());
        if entry.is_none() {
            log::debug!("Directive path {} is not indexed", found.full_path);
        }
        entry
    }
}

/// Strings quoted, containers pretty-printed, other scalars as literals.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{s}\""),
        Value::Array(_) | Value::Object(_) => pretty_json(value),
        scalar => scalar.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn string_values_are_quoted_verbatim() {
        assert_eq!(display_value(&Value::from("say \"hi\"")), "\"say \"hi\"\"");
        assert_eq!(display_value(&Value::from(3)), "3");
        assert_eq!(display_value(&Value::Null), "null");
        assert_eq!(display_value(&serde_json::json!([1])), "[\n  1\n]");
    }

    #[test]
    fn config_defaults() {
        let config = NavigatorConfig::default();
        assert_eq!(config.preview_max_chars, 200);
        assert_eq!(config.namespaces, vec!["CONST", "ENV", "EVENT", "CONFIG", "PAGE"]);

        let partial: NavigatorConfig = serde_json::from_str(r#"{"namespaces": ["SITE"]}"#).unwrap();
        assert_eq!(partial.preview_max_chars, 200);
        assert_eq!(partial.namespaces, vec!["SITE"]);
    }
}
