//! Conversion between byte offsets and (line, column) positions.
//!
//! Lines are 0-based. Columns are 0-based and counted in chars (Unicode scalar values), so a
//! column never points into the middle of a multi-byte character.

/// Line start table for one text.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { text, line_starts }
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Line containing `offset` (offsets past the end clamp to the last line).
    #[must_use]
    pub fn line_of(&self, offset: usize) -> usize {
        let offset = offset.min(self.text.len());
        self.line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1)
    }

    /// `(line, column)` of a byte offset.
    #[must_use]
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.text.len());
        let line = self.line_of(offset);
        let start = self.line_starts[line];
        (line, char_column(&self.text[start..], offset - start))
    }

    /// Text of `line` without its terminator (`\n` or `\r\n`).
    #[must_use]
    pub fn line_text(&self, line: usize) -> Option<&'a str> {
        let start = *self.line_starts.get(line)?;
        let end = self
            .line_starts
            .get(line + 1)
            .map_or(self.text.len(), |next| next - 1);
        let raw = &self.text[start..end];
        Some(raw.strip_suffix('\r').unwrap_or(raw))
    }

    /// Byte offset of the first byte of the line that lies `lines` lines after `line`.
    /// Clamps to the end of the text.
    #[must_use]
    pub fn offset_after_lines(&self, line: usize, lines: usize) -> usize {
        self.line_starts
            .get(line.saturating_add(lines))
            .copied()
            .unwrap_or(self.text.len())
    }
}

/// Number of chars in `text[..byte_offset]`; offsets inside a char round down.
#[must_use]
pub fn char_column(text: &str, byte_offset: usize) -> usize {
    let mut boundary = byte_offset.min(text.len());
    while boundary > 0 && !text.is_char_boundary(boundary) {
        boundary -= 1;
    }
    text[..boundary].chars().count()
}

/// Byte offset of the `char_offset`-th char of `text`, clamped to `text.len()`.
#[must_use]
pub fn byte_offset_of_char(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map_or(text.len(), |(byte, _)| byte)
}
