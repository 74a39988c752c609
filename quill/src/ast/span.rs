//! Source location tracking

use serde::{Deserialize, Serialize};

/// A byte range in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`
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

/// A node paired with the source range it was parsed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge_non_overlapping() {
        let merged = Span::new(0, 5).merge(Span::new(10, 15));
        assert_eq!(merged, Span::new(0, 15));
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
    fn test_span_range_conversions() {
        let range: std::ops::Range<usize> = Span::new(5, 15).into();
        assert_eq!(range, 5..15);
        assert_eq!(Span::from(3..7), Span::new(3, 7));
    }

    #[test]
    fn test_spanned_map_keeps_span() {
        let s = Spanned::new(21, Span::new(1, 3)).map(|n| n * 2);
        assert_eq!(s.node, 42);
        assert_eq!(s.span, Span::new(1, 3));
    }
}
