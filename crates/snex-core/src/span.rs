//! Source locations for parser diagnostics.

use std::fmt;
use std::ops::Range;

/// A location in SNEX source text.
///
/// Stores the 1-based line and column of the first byte together with the
/// byte length of the covered region.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// 1-based source line.
    pub line: u32,
    /// 1-based byte column.
    pub col: u32,
    /// Length in bytes.
    pub len: u32,
}

impl Span {
    #[inline]
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        Self { line, col, len }
    }

    /// Translate a byte range of `source` into a line/column span.
    ///
    /// Offsets past the end of the source clamp to the last position.
    pub fn from_range(source: &str, range: Range<usize>) -> Self {
        let start = range.start.min(source.len());
        let end = range.end.clamp(start, source.len());

        let before = &source.as_bytes()[..start];
        let line = before.iter().filter(|b| **b == b'\n').count() as u32 + 1;
        let line_start = before
            .iter()
            .rposition(|b| *b == b'\n')
            .map(|p| p + 1)
            .unwrap_or(0);

        Self {
            line,
            col: (start - line_start) as u32 + 1,
            len: (end - start) as u32,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}
