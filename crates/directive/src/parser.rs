use crate::grammar::{RawDirective, DIRECTIVE_GRAMMARS, OPEN_GRAMMARS};
use crate::types::{CompletionQuery, DirectiveMatch, DirectiveOccurrence, DirectiveSpan};
use datapath_protocol::{byte_offset_of_char, char_column, LineIndex, PATH_SEPARATOR};
use std::collections::HashSet;

/// Leading tokens that name a category of data rather than an indexed key.
pub const DEFAULT_NAMESPACES: [&str; 5] = ["CONST", "ENV", "EVENT", "CONFIG", "PAGE"];

/// Finds directives in text and splits their path expressions.
///
/// Columns and cursors are char offsets within a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveParser {
    namespaces: Vec<String>,
}

impl Default for DirectiveParser {
    fn default() -> Self {
        Self::with_namespaces(DEFAULT_NAMESPACES)
    }
}

impl DirectiveParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespaces<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            namespaces: namespaces.into_iter().map(Into::into).collect(),
        }
    }

    /// Directive on `line_text` whose span contains `cursor`.
    ///
    /// Grammars are tried in priority order and each is scanned left to right; the first
    /// containing span wins. The reported span line is 0.
    #[must_use]
    pub fn match_at(&self, line_text: &str, cursor: usize) -> Option<DirectiveMatch> {
        self.match_line(line_text, 0, cursor)
    }

    /// Same as [`DirectiveParser::match_at`] for a position inside a whole document.
    #[must_use]
    pub fn match_in_document(
        &self,
        text: &str,
        line: usize,
        column: usize,
    ) -> Option<DirectiveMatch> {
        let line_text = LineIndex::new(text).line_text(line)?;
        self.match_line(line_text, line, column)
    }

    fn match_line(&self, line_text: &str, line: usize, cursor: usize) -> Option<DirectiveMatch> {
        DIRECTIVE_GRAMMARS.iter().find_map(|grammar| {
            grammar.matches(line_text).find_map(|raw| {
                let span = span_of(line_text, line, &raw);
                span.contains(cursor).then(|| self.build_match(line_text, &raw, span, cursor))
            })
        })
    }

    fn build_match(
        &self,
        line_text: &str,
        raw: &RawDirective,
        span: DirectiveSpan,
        cursor: usize,
    ) -> DirectiveMatch {
        let expression = &line_text[raw.expression.clone()];
        let expression_column = char_column(line_text, raw.expression.start);
        let partial = partial_path_at(expression, cursor.checked_sub(expression_column));

        DirectiveMatch {
            full_path: expression.to_string(),
            namespace_prefix: self.namespace_of(expression).map(str::to_string),
            partial_path_at_cursor: partial.to_string(),
            span,
            form: raw.form,
        }
    }

    /// Every closed directive in `text`, in document order.
    #[must_use]
    pub fn extract_all(&self, text: &str) -> Vec<DirectiveOccurrence> {
        let lines = LineIndex::new(text);
        let mut occurrences = Vec::new();

        for line in 0..lines.line_count() {
            let Some(line_text) = lines.line_text(line) else {
                continue;
            };
            for grammar in &DIRECTIVE_GRAMMARS {
                occurrences.extend(grammar.matches(line_text).map(|raw| {
                    let path = &line_text[raw.expression.clone()];
                    DirectiveOccurrence {
                        path: path.to_string(),
                        namespace_prefix: self.namespace_of(path).map(str::to_string),
                        form: raw.form,
                        span: span_of(line_text, line, &raw),
                    }
                }));
            }
        }

        occurrences.sort_by_key(|o| (o.span.line, o.span.start_column));
        log::trace!("Found {} directives", occurrences.len());
        occurrences
    }

    /// Distinct directive paths in `text`, in order of first appearance.
    #[must_use]
    pub fn extract_all_paths(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.extract_all(text)
            .into_iter()
            .filter_map(|occurrence| {
                seen.insert(occurrence.path.clone()).then_some(occurrence.path)
            })
            .collect()
    }

    /// What has been typed so far inside a directive that may not be closed yet.
    #[must_use]
    pub fn completion_query_at(&self, line_text: &str, cursor: usize) -> Option<CompletionQuery> {
        OPEN_GRAMMARS.iter().find_map(|grammar| {
            grammar.matches(line_text).find_map(|open| {
                let start = char_column(line_text, open.span.start);
                let end = char_column(line_text, open.span.end);
                if cursor < start || cursor > end {
                    return None;
                }

                let typed_end = byte_offset_of_char(line_text, cursor)
                    .clamp(open.capture.start, open.capture.end);
                let typed = &line_text[open.capture.start..typed_end];
                let segment_start = match typed.rfind(PATH_SEPARATOR) {
                    Some(dot) => open.capture.start + dot + PATH_SEPARATOR.len_utf8(),
                    None => open.capture.start + (typed.len() - typed.trim_start().len()),
                };

                Some(CompletionQuery {
                    partial_path: typed.trim().to_string(),
                    replace_start: char_column(line_text, segment_start).min(cursor),
                    replace_end: cursor,
                })
            })
        })
    }

    fn namespace_of<'e>(&self, expression: &'e str) -> Option<&'e str> {
        self.namespaces.iter().find_map(|namespace| {
            expression
                .strip_prefix(namespace.as_str())
                .filter(|rest| rest.starts_with(PATH_SEPARATOR))
                .map(|_| &expression[..namespace.len()])
        })
    }
}

fn span_of(line_text: &str, line: usize, raw: &RawDirective) -> DirectiveSpan {
    DirectiveSpan {
        line,
        start_column: char_column(line_text, raw.span.start),
        end_column: char_column(line_text, raw.span.end),
    }
}

/// Path up to the end of the segment at char offset `offset`, or the whole path when the
/// offset falls outside it.
fn partial_path_at(path: &str, offset: Option<usize>) -> &str {
    let Some(offset) = offset else {
        return path;
    };
    if offset > path.chars().count() {
        return path;
    }
    let from = byte_offset_of_char(path, offset);
    match path[from..].find(PATH_SEPARATOR) {
        Some(dot) => &path[..from + dot],
        None => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DirectiveForm, OutputFunction};
    use pretty_assertions::assert_eq;

    fn parser() -> DirectiveParser {
        DirectiveParser::default()
    }

    #[test]
    fn cursor_inside_segment_extends_to_segment_end() {
        let line = "<h1>{{%= Hero.default.title %}}</h1>";
        let cursor = line.find("default").unwrap() + 2;
        let found = parser().match_at(line, cursor).unwrap();

        assert_eq!(found.full_path, "Hero.default.title");
        assert_eq!(found.partial_path_at_cursor, "Hero.default");
        assert_eq!(found.namespace_prefix, None);
        assert_eq!(found.form, DirectiveForm::BareExpression);
        assert_eq!(
            found.span,
            DirectiveSpan {
                line: 0,
                start_column: 4,
                end_column: 31,
            }
        );
    }

    #[test]
    fn namespace_prefix_is_kept_in_full_path() {
        let line = r#""kind": "{{%- s(CONST.Video.videoTypes.MOVIE) %}}""#;
        let found = parser().match_at(line, line.find("Video").unwrap()).unwrap();

        assert_eq!(found.full_path, "CONST.Video.videoTypes.MOVIE");
        assert_eq!(found.namespace_prefix.as_deref(), Some("CONST"));
        assert_eq!(found.partial_path_at_cursor, "CONST.Video");
        assert_eq!(
            found.form,
            DirectiveForm::WrappedCall {
                function: OutputFunction::Escaped,
                transform: true,
            }
        );
    }

    #[test]
    fn namespace_needs_separator() {
        let found = parser().match_at("{{%= CONSTANTS.a %}}", 0).unwrap();
        assert_eq!(found.namespace_prefix, None);

        let custom = DirectiveParser::with_namespaces(["SITE"]);
        let found = custom.match_at("{{%= SITE.a %}}", 0).unwrap();
        assert_eq!(found.namespace_prefix.as_deref(), Some("SITE"));
    }

    #[test]
    fn span_bounds_are_inclusive() {
        let line = "ab {{%o(x.y)%}} cd";
        let found = parser().match_at(line, 3).unwrap();
        assert_eq!(found.span.end_column, 15);
        assert!(parser().match_at(line, 15).is_some());
        assert!(parser().match_at(line, 2).is_none());
        assert!(parser().match_at(line, 16).is_none());
        assert_eq!(
            found.form,
            DirectiveForm::WrappedCall {
                function: OutputFunction::Raw,
                transform: false,
            }
        );
    }

    #[test]
    fn cursor_outside_expression_gives_full_path() {
        let line = "{{%= a.b.c %}}";
        assert_eq!(parser().match_at(line, 0).unwrap().partial_path_at_cursor, "a.b.c");
        assert_eq!(parser().match_at(line, 13).unwrap().partial_path_at_cursor, "a.b.c");
        // on the last segment
        assert_eq!(parser().match_at(line, 9).unwrap().partial_path_at_cursor, "a.b.c");
        // directly on a separator: the segment before it
        assert_eq!(parser().match_at(line, 6).unwrap().partial_path_at_cursor, "a");
    }

    #[test]
    fn every_directive_on_a_line_is_reachable() {
        let line = "{{%= first %}} {{%- s(second) %}}";
        let found = parser().match_at(line, 20).unwrap();
        assert_eq!(found.full_path, "second");
        let found = parser().match_at(line, 5).unwrap();
        assert_eq!(found.full_path, "first");
    }

    #[test]
    fn malformed_directives_are_ignored() {
        let p = parser();
        assert!(p.match_at("{{%= %}}", 3).is_none());
        assert!(p.match_at("{{%- x(a.b) %}}", 3).is_none());
        assert!(p.match_at("{{%= a } %}}", 3).is_none());
        assert!(p.match_at("{{%- s(a.b %}}", 3).is_none());
        assert!(p.match_at("plain text", 3).is_none());
    }

    #[test]
    fn columns_count_chars() {
        let line = "título {{%= a.b %}}";
        let found = parser().match_at(line, 8).unwrap();
        assert_eq!(found.span.start_column, 7);
        assert_eq!(found.span.end_column, 19);
    }

    #[test]
    fn match_in_document_selects_line() {
        let text = "<p>\r\n  {{%= Footer.copyright %}}\r\n</p>";
        let found = parser().match_in_document(text, 1, 10).unwrap();
        assert_eq!(found.full_path, "Footer.copyright");
        assert_eq!(found.partial_path_at_cursor, "Footer");
        assert_eq!(found.span.line, 1);
        assert!(parser().match_in_document(text, 5, 0).is_none());
    }

    #[test]
    fn extract_all_paths_dedups_in_order() {
        let text = "{{%= b.x %}}\n<a>{{%- s(a.y) %}} {{%= b.x %}}</a>\n{{%o(CONST.c)%}}";
        assert_eq!(parser().extract_all_paths(text), vec!["b.x", "a.y", "CONST.c"]);

        let all = parser().extract_all(text);
        assert_eq!(all.len(), 4);
        assert_eq!(all[1].path, "a.y");
        assert_eq!(all[1].span.line, 1);
        assert_eq!(all[1].span.start_column, 3);
        assert_eq!(all[3].namespace_prefix.as_deref(), Some("CONST"));
    }

    #[test]
    fn completion_query_on_unclosed_directive() {
        let line = "<h1>{{%- s(Hero.def";
        let query = parser().completion_query_at(line, line.chars().count()).unwrap();
        assert_eq!(
            query,
            CompletionQuery {
                partial_path: "Hero.def".into(),
                replace_start: 16,
                replace_end: 19,
            }
        );
    }

    #[test]
    fn completion_query_stops_at_cursor() {
        let line = "{{%=  Hero.title %}}";
        let query = parser().completion_query_at(line, 11).unwrap();
        assert_eq!(query.partial_path, "Hero.");
        assert_eq!((query.replace_start, query.replace_end), (11, 11));

        let empty = parser().completion_query_at("{{%= ", 5).unwrap();
        assert_eq!(empty.partial_path, "");
        assert_eq!((empty.replace_start, empty.replace_end), (5, 5));

        assert!(parser().completion_query_at("no directive", 3).is_none());
    }
}
