//! Textual location of keys and container ends inside raw JSON text.
//!
//! Every search here starts at a caller-supplied floor offset and only moves forward.

use std::borrow::Cow;

/// A key declaration `"key" :` found in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct KeyOccurrence {
    /// Offset of the opening quote of the key.
    pub key_start: usize,
    /// Offset of the first non-whitespace byte after the `:`.
    pub value_start: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ContainerEnd {
    pub offset: usize,
    pub exact: bool,
}

/// First declaration of `key` in `text[floor..ceiling]`.
///
/// Every string token is decoded before comparison, so escaped spellings such as `"\u0078"`
/// match `x`. Tokens not followed by `:` are values and are skipped whole.
pub(crate) fn find_key(
    text: &str,
    key: &str,
    floor: usize,
    ceiling: usize,
) -> Option<KeyOccurrence> {
    let ceiling = ceiling.min(text.len());
    let mut pos = floor;
    while pos < ceiling {
        let open = pos + text.get(pos..ceiling)?.find('"')?;
        let close = closing_quote(text.as_bytes(), open)?;
        let after_token = close + 1;

        if let Some(after_colon) = skip_json_whitespace(&text[after_token..]).strip_prefix(':') {
            if decode_string(&text[open..after_token]).as_deref() == Some(key) {
                let value = skip_json_whitespace(after_colon);
                return Some(KeyOccurrence {
                    key_start: open,
                    value_start: text.len() - value.len(),
                });
            }
        }
        pos = after_token;
    }
    None
}

fn closing_quote(bytes: &[u8], open: usize) -> Option<usize> {
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(open + 1) {
        match b {
            _ if escaped => escaped = false,
            b'\\' => escaped = true,
            b'"' => return Some(i),
            _ => {}
        }
    }
    None
}

/// Contents of a quoted JSON string token.
fn decode_string(token: &str) -> Option<Cow<'_, str>> {
    if token.contains('\\') {
        serde_json::from_str::<String>(token).ok().map(Cow::Owned)
    } else {
        token.get(1..token.len() - 1).map(Cow::Borrowed)
    }
}

/// Balanced-bracket scan for the end of the container starting at or after `value_start`.
///
/// Counting begins with the first opening bracket; brackets inside string literals are
/// ignored. The scan stops at `limit`, in which case the last examined offset is returned as
/// an inexact end.
pub(crate) fn scan_container_end(text: &str, value_start: usize, limit: usize) -> ContainerEnd {
    let bytes = text.as_bytes();
    let limit = limit.min(bytes.len());
    let mut depth = 0usize;
    let mut opened = false;
    let mut in_string = false;
    let mut escaped = false;

    let mut i = value_start;
    while i < limit {
        let b = bytes[i];
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
        } else {
            match b {
                b'"' => in_string = true,
                b'{' | b'[' => {
                    depth += 1;
                    opened = true;
                }
                b'}' | b']' => {
                    depth = depth.saturating_sub(1);
                    if opened && depth == 0 {
                        return ContainerEnd {
                            offset: i,
                            exact: true,
                        };
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }

    ContainerEnd {
        offset: limit.saturating_sub(1).max(value_start),
        exact: false,
    }
}

fn skip_json_whitespace(text: &str) -> &str {
    text.trim_start_matches(|c| matches!(c, ' ' | '\t' | '\n' | '\r'))
}
