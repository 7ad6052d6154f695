use serde::{Deserialize, Serialize};

/// Byte-offset span in a source unit.
///
/// `file_id` identifies the unit, so spans from different files never compare
/// equal. The type resolver keys its tables by `Span`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub file_id: u32,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end, file_id: 0 }
    }

    pub fn with_file(start: usize, end: usize, file_id: u32) -> Self {
        Self { start, end, file_id }
    }

    pub fn dummy() -> Self {
        Self { start: 0, end: 0, file_id: 0 }
    }

    /// Span covering `self` through `other`. Both must belong to the same file.
    pub fn to(self, other: Span) -> Span {
        Span { start: self.start, end: other.end, file_id: self.file_id }
    }

    /// Byte range for slicing the unit's source.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

/// A value annotated with its source span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }

    pub fn dummy(node: T) -> Self {
        Self { node, span: Span::dummy() }
    }
}
