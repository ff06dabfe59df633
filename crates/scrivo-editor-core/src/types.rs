//! Core editor types: selection, viewport, and edit descriptions.
//!
//! All offsets in this crate are UTF-8 byte offsets into the document text.

use std::ops::Range;

use smol_str::SmolStr;

/// Anchor and head byte offsets. The head is where the caret sits; either
/// may come first.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    pub fn collapsed(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn to_range(&self) -> Range<usize> {
        self.start()..self.end()
    }

    pub fn clamp(self, len: usize) -> Self {
        Self::new(self.anchor.min(len), self.head.min(len))
    }
}

/// The currently rendered document range.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub from: usize,
    pub to: usize,
}

impl Viewport {
    pub fn new(from: usize, to: usize) -> Self {
        Self {
            from: from.min(to),
            to: from.max(to),
        }
    }

    /// A viewport covering a whole document of `len` bytes.
    pub fn whole(len: usize) -> Self {
        Self { from: 0, to: len }
    }

    pub fn clamp(self, len: usize) -> Self {
        Self::new(self.from.min(len), self.to.min(len))
    }
}

/// One replacement in a transaction, in pre-transaction coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edit {
    pub range: Range<usize>,
    pub insert: SmolStr,
}

impl Edit {
    pub fn insert(at: usize, text: impl Into<SmolStr>) -> Self {
        Self {
            range: at..at,
            insert: text.into(),
        }
    }

    pub fn delete(range: Range<usize>) -> Self {
        Self {
            range,
            insert: SmolStr::default(),
        }
    }

    pub fn replace(range: Range<usize>, text: impl Into<SmolStr>) -> Self {
        Self {
            range,
            insert: text.into(),
        }
    }

    /// Byte length change this edit causes.
    pub fn delta(&self) -> isize {
        self.insert.len() as isize - self.range.len() as isize
    }
}

/// Screen-space rectangle reported by the host layout.
#[derive(Clone, Debug, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}
