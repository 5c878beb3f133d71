//! Fixed grammar tables for template output directives.
//!
//! A closed directive has the shape `open [-] ws function( inner ) ws close` or
//! `open ws inner ws close`. Grammars are tried in table order and matched left to right
//! without overlap.

use crate::types::{DirectiveForm, OutputFunction};
use std::ops::Range;

pub(crate) const DIRECTIVE_OPEN: &str = "{{%";
pub(crate) const BARE_OPEN: &str = "{{%=";
pub(crate) const DIRECTIVE_CLOSE: &str = "%}}";

const OUTPUT_FUNCTIONS: &[(char, OutputFunction)] =
    &[('s', OutputFunction::Escaped), ('o', OutputFunction::Raw)];

pub(crate) struct Grammar {
    open: &'static str,
    /// Whether a `-` may follow the opening marker.
    transform_flag: bool,
    /// Empty for the bare form.
    functions: &'static [(char, OutputFunction)],
    /// Character that may never appear inside the captured expression.
    excluded: char,
    close: &'static str,
}

pub(crate) const DIRECTIVE_GRAMMARS: [Grammar; 2] = [
    Grammar {
        open: DIRECTIVE_OPEN,
        transform_flag: true,
        functions: OUTPUT_FUNCTIONS,
        excluded: ')',
        close: DIRECTIVE_CLOSE,
    },
    Grammar {
        open: BARE_OPEN,
        transform_flag: false,
        functions: &[],
        excluded: '}',
        close: DIRECTIVE_CLOSE,
    },
];

/// Byte offsets of one closed directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawDirective {
    pub span: Range<usize>,
    /// Trimmed inner expression.
    pub expression: Range<usize>,
    pub form: DirectiveForm,
}

impl Grammar {
    pub(crate) fn matches<'g, 't>(&'g self, text: &'t str) -> Matches<'g, 't> {
        Matches {
            grammar: self,
            text,
            pos: 0,
        }
    }

    fn match_from(&self, text: &str, start: usize) -> Option<RawDirective> {
        if !text.get(start..)?.starts_with(self.open) {
            return None;
        }
        let mut pos = start + self.open.len();
        let mut transform = false;
        if self.transform_flag && text[pos..].starts_with('-') {
            pos += 1;
            transform = true;
        }
        pos = skip_whitespace(text, pos);

        let (inner, after_inner, form) = if self.functions.is_empty() {
            let close_at = pos + text[pos..].find(self.close)?;
            (pos..close_at, close_at, DirectiveForm::BareExpression)
        } else {
            let name = text[pos..].chars().next()?;
            let (_, function) = self.functions.iter().find(|(c, _)| *c == name)?;
            pos += name.len_utf8();
            if !text[pos..].starts_with('(') {
                return None;
            }
            pos += 1;
            let paren_at = pos + text[pos..].find(self.excluded)?;
            let form = DirectiveForm::WrappedCall {
                function: *function,
                transform,
            };
            (pos..paren_at, skip_whitespace(text, paren_at + 1), form)
        };

        let inner_text = &text[inner.clone()];
        if inner_text.contains(|c| c == self.excluded || c == '\n') {
            return None;
        }
        if !text[after_inner..].starts_with(self.close) {
            return None;
        }

        let expression = inner_text.trim();
        if expression.is_empty() {
            return None;
        }
        let expression_start = inner.start + (inner_text.len() - inner_text.trim_start().len());

        Some(RawDirective {
            span: start..after_inner + self.close.len(),
            expression: expression_start..expression_start + expression.len(),
            form,
        })
    }
}

fn skip_whitespace(text: &str, pos: usize) -> usize {
    text.len() - text[pos..].trim_start().len()
}

pub(crate) struct Matches<'g, 't> {
    grammar: &'g Grammar,
    text: &'t str,
    pos: usize,
}

impl Iterator for Matches<'_, '_> {
    type Item = RawDirective;

    fn next(&mut self) -> Option<RawDirective> {
        loop {
            let start = self.pos + self.text.get(self.pos..)?.find(self.grammar.open)?;
            if let Some(found) = self.grammar.match_from(self.text, start) {
                self.pos = found.span.end;
                return Some(found);
            }
            // opening markers start with an ASCII byte
            self.pos = start + 1;
        }
    }
}

/// Prefix-only grammar used while a directive is still being typed.
pub(crate) struct OpenGrammar {
    open: &'static str,
    transform_flag: bool,
    functions: &'static [(char, OutputFunction)],
    stops: &'static [char],
}

pub(crate) const OPEN_GRAMMARS: [OpenGrammar; 2] = [
    OpenGrammar {
        open: DIRECTIVE_OPEN,
        transform_flag: true,
        functions: OUTPUT_FUNCTIONS,
        stops: &[')'],
    },
    OpenGrammar {
        open: BARE_OPEN,
        transform_flag: false,
        functions: &[],
        stops: &['}', '%'],
    },
];

/// Byte offsets of a possibly unclosed directive prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OpenDirective {
    pub span: Range<usize>,
    /// Untrimmed text typed so far, possibly empty.
    pub capture: Range<usize>,
}

impl OpenGrammar {
    pub(crate) fn matches<'a>(&'a self, line: &'a str) -> impl Iterator<Item = OpenDirective> + 'a {
        let mut pos = 0;
        std::iter::from_fn(move || loop {
            let start = pos + line.get(pos..)?.find(self.open)?;
            if let Some(found) = self.match_from(line, start) {
                pos = found.span.end;
                return Some(found);
            }
            pos = start + 1;
        })
    }

    fn match_from(&self, line: &str, start: usize) -> Option<OpenDirective> {
        let mut rest = line.get(start..)?.strip_prefix(self.open)?;
        if self.transform_flag {
            rest = rest.strip_prefix('-').unwrap_or(rest);
        }
        rest = rest.trim_start();

        if !self.functions.is_empty() {
            let name = rest.chars().next()?;
            if !self.functions.iter().any(|(c, _)| *c == name) {
                return None;
            }
            rest = rest[name.len_utf8()..].strip_prefix('(')?;
        }

        let capture_start = line.len() - rest.len();
        let capture_len = rest
            .find(|c: char| self.stops.contains(&c))
            .unwrap_or(rest.len());
        let capture_end = capture_start + capture_len;

        Some(OpenDirective {
            span: start..capture_end,
            capture: capture_start..capture_end,
        })
    }
}
