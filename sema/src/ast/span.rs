//! Source location tracking

use serde::{Deserialize, Serialize};

/// A byte range in the source handed over by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
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

/// A syntax node together with its location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }

    /// Wraps `node` with an empty span; used for synthesized nodes.
    pub fn synthetic(node: T) -> Self {
        Self {
            node,
            span: Span::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_range() {
        let span = Span::new(4, 11);
        assert_eq!(span.to_string(), "4..11");
        let range: std::ops::Range<usize> = span.into();
        assert_eq!(range, 4..11);
    }

    #[test]
    fn test_synthetic_has_default_span() {
        let node = Spanned::synthetic("count");
        assert_eq!(node.span, Span::default());
        assert_eq!(node.node, "count");
    }
}
