//! Source location tracking

use serde::{Deserialize, Serialize};

/// A span in the source code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl From<Span> for std::ops::Range<usize> {
    fn from(span: Span) -> Self {
        span.start..span.end
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(range: std::ops::Range<usize>) -> Self {
        Span::new(range.start, range.end)
    }
}

/// A value with source location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Spanned<U> {
        Spanned {
            node: f(self.node),
            span: self.span,
        }
    }
}

/// Byte offset to 1-based line number lookup
///
/// Runtime errors are tagged with a line rather than a span, so the
/// interpreter keeps one of these for the source it is running.
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    /// Byte offset of the first character of every line after the first
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let line_starts = source
            .char_indices()
            .filter(|(_, c)| *c == '\n')
            .map(|(i, _)| i + 1)
            .collect();
        LineIndex { line_starts }
    }

    /// Line containing `offset` (1-based)
    pub fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset) + 1
    }

    /// Byte range of a 1-based line, excluding the newline
    pub fn line_range(&self, line: usize, source_len: usize) -> std::ops::Range<usize> {
        let start = match line {
            0 | 1 => 0,
            n => self.line_starts.get(n - 2).copied().unwrap_or(source_len),
        };
        let end = self
            .line_starts
            .get(line.saturating_sub(1))
            .map(|next| next - 1)
            .unwrap_or(source_len);
        start..end.max(start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge_non_overlapping() {
        let a = Span::new(0, 5);
        let b = Span::new(10, 15);
        let merged = a.merge(b);
        assert_eq!(merged.start, 0);
        assert_eq!(merged.end, 15);
    }

    #[test]
    fn test_span_merge_reversed_order() {
        let merged = Span::new(10, 20).merge(Span::new(0, 5));
        assert_eq!(merged, Span::new(0, 20));
    }

    #[test]
    fn test_span_display() {
        assert_eq!(format!("{}", Span::new(42, 99)), "42..99");
    }

    #[test]
    fn test_span_range_conversion() {
        let range: std::ops::Range<usize> = Span::new(5, 15).into();
        assert_eq!(range, 5..15);
        let span: Span = (10..20usize).into();
        assert_eq!(span, Span::new(10, 20));
    }

    #[test]
    fn test_spanned_map() {
        let s = Spanned::new(10, Span::new(0, 5));
        let mapped = s.map(|n| n * 2);
        assert_eq!(mapped.node, 20);
        assert_eq!(mapped.span, Span::new(0, 5));
    }

    // --- LineIndex ---

    #[test]
    fn test_line_of_single_line() {
        let index = LineIndex::new("let x = 1;");
        assert_eq!(index.line_of(0), 1);
        assert_eq!(index.line_of(9), 1);
    }

    #[test]
    fn test_line_of_multi_line() {
        let source = "let a = [];\nlet b = 2;\n\na.pop();";
        let index = LineIndex::new(source);
        assert_eq!(index.line_of(0), 1);
        assert_eq!(index.line_of(11), 1); // the newline itself
        assert_eq!(index.line_of(12), 2);
        assert_eq!(index.line_of(source.find("a.pop").unwrap()), 4);
    }

    #[test]
    fn test_line_of_empty_index() {
        let index = LineIndex::default();
        assert_eq!(index.line_of(0), 1);
        assert_eq!(index.line_of(500), 1);
    }

    #[test]
    fn test_line_range() {
        let source = "first\nsecond\nthird";
        let index = LineIndex::new(source);
        assert_eq!(&source[index.line_range(1, source.len())], "first");
        assert_eq!(&source[index.line_range(2, source.len())], "second");
        assert_eq!(&source[index.line_range(3, source.len())], "third");
    }

    #[test]
    fn test_line_range_past_end() {
        let source = "only";
        let index = LineIndex::new(source);
        assert_eq!(index.line_range(7, source.len()), 4..4);
    }
}
