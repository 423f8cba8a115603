//! Edit plans: text changes anchored at byte offsets of an unmodified source.
//!
//! Planning never touches the tree; [`EditPlan::apply`] produces the new text
//! in one pass. Offsets always refer to the original source.

use std::fmt;

use crate::error::{Result, RtsError};

/// Half-open byte range `[start, end)` of the original source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start {} after end {}", start, end);
        Self { start, end }
    }

    pub fn at(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Adjacent spans and insertion points at a boundary do not overlap
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditKind {
    Insert,
    Replace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub kind: EditKind,
    pub span: Span,
    pub text: String,
}

/// An ordered collection of edits against one source text.
///
/// Insertions at the same offset are applied in the order they were added.
#[derive(Debug, Clone, Default)]
pub struct EditPlan {
    edits: Vec<Edit>,
}

impl EditPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, offset: usize, text: impl Into<String>) {
        self.edits.push(Edit {
            kind: EditKind::Insert,
            span: Span::at(offset),
            text: text.into(),
        });
    }

    pub fn replace(&mut self, span: Span, text: impl Into<String>) {
        self.edits.push(Edit {
            kind: EditKind::Replace,
            span,
            text: text.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Produce the edited text.
    ///
    /// Fails when an edit falls outside `source`, splits a UTF-8 character,
    /// or when two replacements (or an insertion strictly inside a
    /// replacement) overlap.
    pub fn apply(&self, source: &str) -> Result<String> {
        let mut ordered: Vec<&Edit> = self.edits.iter().collect();
        // Stable: same-offset insertions keep their planning order
        ordered.sort_by_key(|e| e.span.start);

        let added: usize = self.edits.iter().map(|e| e.text.len()).sum();
        let mut out = String::with_capacity(source.len() + added);
        let mut cursor = 0usize;
        for edit in ordered {
            let span = edit.span;
            if span.end > source.len()
                || !source.is_char_boundary(span.start)
                || !source.is_char_boundary(span.end)
            {
                return Err(RtsError::InstrumentationFailure {
                    path: String::new(),
                    message: format!("edit at {} is outside the source", span),
                });
            }
            if span.start < cursor {
                return Err(RtsError::InstrumentationFailure {
                    path: String::new(),
                    message: format!("edit at {} overlaps a previous replacement", span),
                });
            }
            out.push_str(&source[cursor..span.start]);
            out.push_str(&edit.text);
            cursor = span.end;
        }
        out.push_str(&source[cursor..]);
        Ok(out)
    }
}
