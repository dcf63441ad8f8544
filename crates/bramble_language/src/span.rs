//! Source location tracking.
//!
//! Every token, parse node, and AST node carries a `Span` so that compile
//! errors can point at the offending line and column.

/// A span of source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset where this span starts.
    pub start: usize,
    /// Byte offset where this span ends (exclusive).
    pub end: usize,
    /// 1-based line number where this span starts.
    pub line: u32,
    /// 1-based column number where this span starts.
    pub column: u32,
}

impl Span {
    /// Creates a new span.
    #[must_use]
    pub const fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// A zero-width span for nodes built without source text.
    #[must_use]
    pub const fn synthetic() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Creates a span covering the range from this span to another.
    #[must_use]
    pub fn to(self, other: Self) -> Self {
        Self {
            start: self.start,
            end: other.end.max(self.end),
            line: self.line,
            column: self.column,
        }
    }

    /// Returns true if the span was produced by the source reader.
    #[must_use]
    pub const fn is_located(&self) -> bool {
        self.line > 0
    }

    /// Returns the text this span covers in the given source.
    #[must_use]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.end).unwrap_or("")
    }
}
