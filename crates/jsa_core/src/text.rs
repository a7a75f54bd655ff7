//! Source locations.
//!
//! Offsets count `char`s from the start of the source, which is how the
//! scanner walks the text. Lines and columns shown to users are 1-based.

use serde::Serialize;
use std::fmt;

/// A char offset from the start of the source.
pub type TextPos = u32;

/// A start offset and a length, as carried by tokens and diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Serialize)]
pub struct TextSpan {
    pub start: TextPos,
    pub length: TextPos,
}

impl TextSpan {
    #[inline]
    pub fn new(start: TextPos, length: TextPos) -> Self {
        Self { start, length }
    }

    #[inline]
    pub fn from_bounds(start: TextPos, end: TextPos) -> Self {
        debug_assert!(end >= start);
        Self::new(start, end - start)
    }

    /// Zero-length span, used for diagnostics at end of input.
    #[inline]
    pub fn empty(pos: TextPos) -> Self {
        Self::new(pos, 0)
    }

    /// Exclusive end offset.
    #[inline]
    pub fn end(&self) -> TextPos {
        self.start + self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl fmt::Debug for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end())
    }
}

/// Start and end offsets of a syntax node.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextRange {
    pub pos: TextPos,
    /// Exclusive.
    pub end: TextPos,
}

impl TextRange {
    #[inline]
    pub fn new(pos: TextPos, end: TextPos) -> Self {
        Self { pos, end }
    }

    #[inline]
    pub fn to_span(&self) -> TextSpan {
        TextSpan::from_bounds(self.pos, self.end)
    }
}

impl fmt::Debug for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.pos, self.end)
    }
}

/// A 1-based line and column, as reported to users.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Maps char offsets to positions.
#[derive(Debug, Clone)]
pub struct LineMap {
    /// Offset of the first char of every line.
    starts: Vec<TextPos>,
    /// Number of chars in the source.
    len: TextPos,
}

impl LineMap {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        let mut len = 0;
        for ch in text.chars() {
            len += 1;
            if ch == '\n' {
                starts.push(len);
            }
        }
        Self { starts, len }
    }

    /// Position of `pos`, clamped to one past the last char.
    pub fn position_of(&self, pos: TextPos) -> Position {
        let pos = pos.min(self.len);
        let line = self.starts.partition_point(|&start| start <= pos) - 1;
        Position::new(line as u32 + 1, pos - self.starts[line] + 1)
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_bounds() {
        let span = TextSpan::from_bounds(5, 15);
        assert_eq!(span, TextSpan::new(5, 10));
        assert_eq!(span.end(), 15);
        assert!(TextSpan::empty(3).is_empty());
        assert_eq!(TextRange::new(2, 6).to_span(), TextSpan::new(2, 4));
    }

    #[test]
    fn test_positions_are_one_based() {
        let map = LineMap::new("line1\nline2\nline3");
        assert_eq!(map.line_count(), 3);
        assert_eq!(map.position_of(0), Position::new(1, 1));
        assert_eq!(map.position_of(5), Position::new(1, 6));
        assert_eq!(map.position_of(6), Position::new(2, 1));
        assert_eq!(map.position_of(8), Position::new(2, 3));
        assert_eq!(map.position_of(12), Position::new(3, 1));
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        let map = LineMap::new("é\nx");
        assert_eq!(map.position_of(2), Position::new(2, 1));
    }

    #[test]
    fn test_clamps_past_end() {
        assert_eq!(LineMap::new("ab").position_of(99), Position::new(1, 3));
        assert_eq!(LineMap::new("").position_of(0), Position::new(1, 1));
        assert_eq!(LineMap::new("a\n").position_of(2), Position::new(2, 1));
    }
}
