//! Versioned document and change maps.
//!
//! A `Document` is only ever mutated through [`Document::apply`], which takes
//! a batch of edits expressed against the current version and returns a
//! [`ChangeSet`] describing how old positions translate to new ones.

use std::ops::Range;
use std::sync::Arc;

use thiserror::Error;

use crate::text::EditorRope;
use crate::types::{Edit, Selection};

/// Errors rejecting a transaction before it touches the document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DocumentError {
    /// Edit range extends past the end of the document.
    #[error("edit range {start}..{end} is outside the document (len {len})")]
    OutOfBounds { start: usize, end: usize, len: usize },

    /// Edit boundary splits a UTF-8 sequence.
    #[error("offset {0} is not on a char boundary")]
    NotCharBoundary(usize),

    /// Edits in one transaction must be sorted and must not overlap.
    #[error("edit at {0} overlaps or precedes the previous edit")]
    Unordered(usize),
}

/// Which side a position sticks to when text is inserted exactly at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Before,
    After,
}

/// One replaced span: `from_a..to_a` in the old document became
/// `from_b..to_b` in the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangedSpan {
    pub from_a: usize,
    pub to_a: usize,
    pub from_b: usize,
    pub to_b: usize,
}

/// Position mapping produced by applying a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangeSet {
    spans: Vec<ChangedSpan>,
    len_before: usize,
    len_after: usize,
}

impl ChangeSet {
    /// Build the change map for sorted, non-overlapping edits.
    fn from_edits(edits: &[Edit], len_before: usize) -> Self {
        let mut delta: isize = 0;
        let spans = edits
            .iter()
            .map(|edit| {
                let from_b = (edit.range.start as isize + delta) as usize;
                let to_b = from_b + edit.insert.len();
                delta += edit.delta();
                ChangedSpan {
                    from_a: edit.range.start,
                    to_a: edit.range.end,
                    from_b,
                    to_b,
                }
            })
            .collect();
        Self {
            spans,
            len_before,
            len_after: (len_before as isize + delta) as usize,
        }
    }

    pub fn spans(&self) -> &[ChangedSpan] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans
            .iter()
            .all(|s| s.from_a == s.to_a && s.from_b == s.to_b)
    }

    pub fn len_before(&self) -> usize {
        self.len_before
    }

    pub fn len_after(&self) -> usize {
        self.len_after
    }

    /// Smallest old-document range covering every change.
    pub fn touched_a(&self) -> Option<Range<usize>> {
        let first = self.spans.first()?;
        let last = self.spans.last()?;
        Some(first.from_a..last.to_a)
    }

    /// Smallest new-document range covering every change.
    pub fn touched_b(&self) -> Option<Range<usize>> {
        let first = self.spans.first()?;
        let last = self.spans.last()?;
        Some(first.from_b..last.to_b)
    }

    /// Map an old position into the new document.
    ///
    /// Positions strictly inside a replaced span collapse to one of its ends
    /// according to `assoc`; positions at a span boundary keep their side.
    pub fn map_pos(&self, pos: usize, assoc: Assoc) -> usize {
        let mut delta: isize = 0;
        for span in &self.spans {
            if pos < span.from_a {
                break;
            }
            if pos > span.to_a {
                delta = span.to_b as isize - span.to_a as isize;
                continue;
            }
            let deletes = span.from_a < span.to_a;
            if deletes && pos == span.from_a {
                return span.from_b;
            }
            if deletes && pos == span.to_a {
                return span.to_b;
            }
            return match assoc {
                Assoc::Before => span.from_b,
                Assoc::After => span.to_b,
            };
        }
        (pos as isize + delta) as usize
    }

    /// Map a range, returning `None` when it collapses to nothing.
    ///
    /// The start sticks after insertions and the end sticks before them, so
    /// text typed at either boundary falls outside the mapped range.
    pub fn map_range(&self, range: Range<usize>) -> Option<Range<usize>> {
        if range.start == range.end {
            let at = self.map_pos(range.start, Assoc::After);
            return Some(at..at);
        }
        let start = self.map_pos(range.start, Assoc::After);
        let end = self.map_pos(range.end, Assoc::Before);
        (start < end).then_some(start..end)
    }

    pub fn map_selection(&self, selection: Selection) -> Selection {
        Selection::new(
            self.map_pos(selection.anchor, Assoc::After),
            self.map_pos(selection.head, Assoc::After),
        )
    }
}

/// A line of the document. `to` excludes the line break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    /// 1-based line number.
    pub number: usize,
    pub from: usize,
    pub to: usize,
}

/// Immutable-per-version text with a line index.
#[derive(Clone, Debug)]
pub struct Document {
    rope: EditorRope,
    text: Arc<str>,
    version: u64,
}

impl Document {
    pub fn new(text: &str) -> Self {
        Self {
            rope: EditorRope::from(text),
            text: Arc::from(text),
            version: 0,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Shared handle to the current text, cheap to hand to other tasks.
    pub fn snapshot(&self) -> Arc<str> {
        self.text.clone()
    }

    pub fn slice(&self, range: Range<usize>) -> Option<&str> {
        self.text.get(range)
    }

    pub fn lines_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// The line containing `pos`.
    pub fn line_at(&self, pos: usize) -> Line {
        let idx = self.rope.byte_to_line(pos);
        self.line_by_index(idx)
    }

    /// Line by 1-based number.
    pub fn line(&self, number: usize) -> Option<Line> {
        if number == 0 || number > self.lines_count() {
            return None;
        }
        Some(self.line_by_index(number - 1))
    }

    fn line_by_index(&self, idx: usize) -> Line {
        let from = self.rope.line_to_byte(idx);
        let next = self.rope.line_to_byte(idx + 1);
        let bytes = self.text.as_bytes();
        let mut to = next;
        if to > from && bytes[to - 1] == b'\n' {
            to -= 1;
            if to > from && bytes[to - 1] == b'\r' {
                to -= 1;
            }
        }
        Line {
            number: idx + 1,
            from,
            to,
        }
    }

    /// Apply a batch of edits and move to the next version.
    ///
    /// Edits are given in current-version coordinates, sorted by position
    /// and non-overlapping. Nothing is applied if any edit is invalid.
    pub fn apply(&mut self, edits: &[Edit]) -> Result<ChangeSet, DocumentError> {
        let len = self.len();
        let mut prev_end = 0;
        for edit in edits {
            let Range { start, end } = edit.range;
            if start > end || end > len {
                return Err(DocumentError::OutOfBounds { start, end, len });
            }
            if start < prev_end {
                return Err(DocumentError::Unordered(start));
            }
            for offset in [start, end] {
                if !self.text.is_char_boundary(offset) {
                    return Err(DocumentError::NotCharBoundary(offset));
                }
            }
            prev_end = end;
        }

        for edit in edits.iter().rev() {
            self.rope.replace(edit.range.clone(), &edit.insert);
        }
        self.text = Arc::from(self.rope.to_string());
        self.version += 1;

        let changes = ChangeSet::from_edits(edits, len);
        tracing::trace!(
            target: "scrivo::document",
            version = self.version,
            edits = edits.len(),
            len_after = changes.len_after(),
            "applied transaction"
        );
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_multiple_edits_in_old_coordinates() {
        let mut doc = Document::new("hello world");
        let changes = doc
            .apply(&[Edit::replace(0..5, "goodbye"), Edit::insert(11, "!")])
            .unwrap();
        assert_eq!(doc.text(), "goodbye world!");
        assert_eq!(doc.version(), 1);
        assert_eq!(changes.len_before(), 11);
        assert_eq!(changes.len_after(), 14);
        assert_eq!(changes.touched_b(), Some(0..14));
    }

    #[test]
    fn invalid_edits_leave_document_untouched() {
        let mut doc = Document::new("héllo");
        assert_eq!(
            doc.apply(&[Edit::insert(2, "x")]),
            Err(DocumentError::NotCharBoundary(2))
        );
        assert_eq!(
            doc.apply(&[Edit::delete(3..10)]),
            Err(DocumentError::OutOfBounds {
                start: 3,
                end: 10,
                len: 6
            })
        );
        assert_eq!(
            doc.apply(&[Edit::insert(4, "a"), Edit::insert(1, "b")]),
            Err(DocumentError::Unordered(1))
        );
        assert_eq!(doc.text(), "héllo");
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn map_pos_around_insertion() {
        let mut doc = Document::new("abcdef");
        let changes = doc.apply(&[Edit::insert(3, "XY")]).unwrap();
        assert_eq!(changes.map_pos(1, Assoc::Before), 1);
        assert_eq!(changes.map_pos(3, Assoc::Before), 3);
        assert_eq!(changes.map_pos(3, Assoc::After), 5);
        assert_eq!(changes.map_pos(4, Assoc::Before), 6);
    }

    #[test]
    fn map_pos_around_deletion() {
        let mut doc = Document::new("abcdefgh");
        let changes = doc.apply(&[Edit::delete(2..5)]).unwrap();
        assert_eq!(doc.text(), "abfgh");
        assert_eq!(changes.map_pos(2, Assoc::After), 2);
        assert_eq!(changes.map_pos(3, Assoc::Before), 2);
        assert_eq!(changes.map_pos(3, Assoc::After), 2);
        assert_eq!(changes.map_pos(5, Assoc::Before), 2);
        assert_eq!(changes.map_pos(7, Assoc::Before), 4);
    }

    #[test]
    fn map_range_drops_collapsed_ranges() {
        let mut doc = Document::new("one two three");
        let changes = doc.apply(&[Edit::delete(4..8)]).unwrap();
        assert_eq!(changes.map_range(4..7), None);
        assert_eq!(changes.map_range(8..13), Some(4..9));
        assert_eq!(changes.map_range(0..3), Some(0..3));
    }

    #[test]
    fn map_range_excludes_text_typed_at_edges() {
        let mut doc = Document::new("ab**x**cd");
        let changes = doc
            .apply(&[Edit::insert(2, "<"), Edit::insert(7, ">")])
            .unwrap();
        assert_eq!(changes.map_range(2..7), Some(3..8));
    }

    #[test]
    fn lines_exclude_breaks() {
        let doc = Document::new("# Title\r\n\nbody\nlast");
        assert_eq!(doc.lines_count(), 4);
        assert_eq!(
            doc.line_at(3),
            Line {
                number: 1,
                from: 0,
                to: 7
            }
        );
        assert_eq!(
            doc.line(2),
            Some(Line {
                number: 2,
                from: 9,
                to: 9
            })
        );
        assert_eq!(doc.line(4).map(|l| (l.from, l.to)), Some((15, 19)));
        assert_eq!(doc.line(5), None);
    }
}
