//! Decorations and decoration sets.
//!
//! A [`DecorationSet`] is the output of one rebuild pass: decorations sorted
//! by start offset, then by kind rank so that at a shared boundary line
//! classes come first, then widgets placed before, replacements, marks and
//! finally widgets placed after. Overlapping decorations are allowed.

use std::ops::Range;

use smol_str::SmolStr;

use crate::document::{Assoc, ChangeSet};
use crate::widget::Widget;

/// Which side of its position a point widget renders on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecorationKind {
    /// Adds a class to the covered text.
    Mark { class: SmolStr },
    /// Adds a class to the line starting at `from`.
    Line { class: SmolStr },
    /// Inserts a widget at `from` without hiding anything.
    Widget {
        widget: Widget,
        side: Side,
        block: bool,
    },
    /// Hides the covered text, optionally showing a widget in its place.
    Replace { widget: Option<Widget>, block: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decoration {
    pub from: usize,
    pub to: usize,
    pub kind: DecorationKind,
}

impl Decoration {
    pub fn mark(range: Range<usize>, class: impl Into<SmolStr>) -> Self {
        Self {
            from: range.start,
            to: range.end,
            kind: DecorationKind::Mark {
                class: class.into(),
            },
        }
    }

    pub fn line(line_start: usize, class: impl Into<SmolStr>) -> Self {
        Self {
            from: line_start,
            to: line_start,
            kind: DecorationKind::Line {
                class: class.into(),
            },
        }
    }

    pub fn widget(at: usize, widget: Widget, side: Side, block: bool) -> Self {
        Self {
            from: at,
            to: at,
            kind: DecorationKind::Widget {
                widget,
                side,
                block,
            },
        }
    }

    pub fn replace(range: Range<usize>, widget: Widget, block: bool) -> Self {
        Self {
            from: range.start,
            to: range.end,
            kind: DecorationKind::Replace {
                widget: Some(widget),
                block,
            },
        }
    }

    /// Hide text without a substitute.
    pub fn hide(range: Range<usize>) -> Self {
        Self {
            from: range.start,
            to: range.end,
            kind: DecorationKind::Replace {
                widget: None,
                block: false,
            },
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.from..self.to
    }

    pub fn widget_ref(&self) -> Option<&Widget> {
        match &self.kind {
            DecorationKind::Widget { widget, .. } => Some(widget),
            DecorationKind::Replace { widget, .. } => widget.as_ref(),
            _ => None,
        }
    }

    pub fn class(&self) -> Option<&str> {
        match &self.kind {
            DecorationKind::Mark { class } | DecorationKind::Line { class } => Some(class),
            _ => None,
        }
    }

    pub fn is_replace(&self) -> bool {
        matches!(self.kind, DecorationKind::Replace { .. })
    }

    /// Whether this decoration makes any text in `range` unreadable.
    pub fn hides_any_of(&self, range: &Range<usize>) -> bool {
        self.is_replace() && self.from < range.end && self.to > range.start
    }

    fn rank(&self) -> u8 {
        match &self.kind {
            DecorationKind::Line { .. } => 0,
            DecorationKind::Widget {
                side: Side::Before, ..
            } => 1,
            DecorationKind::Replace { .. } => 2,
            DecorationKind::Mark { .. } => 3,
            DecorationKind::Widget {
                side: Side::After, ..
            } => 4,
        }
    }

    fn map(self, changes: &ChangeSet) -> Option<Self> {
        let (from, to) = match &self.kind {
            DecorationKind::Mark { .. } | DecorationKind::Replace { .. } => {
                let mapped = changes.map_range(self.range())?;
                if mapped.is_empty() {
                    return None;
                }
                (mapped.start, mapped.end)
            }
            DecorationKind::Line { .. } => {
                let at = changes.map_pos(self.from, Assoc::Before);
                (at, at)
            }
            DecorationKind::Widget { side, .. } => {
                let assoc = match side {
                    Side::Before => Assoc::After,
                    Side::After => Assoc::Before,
                };
                let at = changes.map_pos(self.from, assoc);
                (at, at)
            }
        };
        Some(Self { from, to, ..self })
    }
}

/// Accumulates decorations during a tree walk.
#[derive(Debug, Default)]
pub struct DecorationBuilder {
    decorations: Vec<Decoration>,
}

impl DecorationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, decoration: Decoration) {
        self.decorations.push(decoration);
    }

    pub fn mark(&mut self, range: Range<usize>, class: impl Into<SmolStr>) {
        self.add(Decoration::mark(range, class));
    }

    pub fn line(&mut self, line_start: usize, class: impl Into<SmolStr>) {
        self.add(Decoration::line(line_start, class));
    }

    pub fn hide(&mut self, range: Range<usize>) {
        if !range.is_empty() {
            self.add(Decoration::hide(range));
        }
    }

    pub fn len(&self) -> usize {
        self.decorations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorations.is_empty()
    }

    pub fn finish(self) -> DecorationSet {
        DecorationSet::from_vec(self.decorations)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecorationSet {
    decorations: Vec<Decoration>,
}

impl DecorationSet {
    pub fn empty() -> Self {
        Self::default()
    }

    fn from_vec(mut decorations: Vec<Decoration>) -> Self {
        // Stable: insertion order breaks ties.
        decorations.sort_by_key(|d| (d.from, d.rank()));
        Self { decorations }
    }

    /// Union of several sets.
    pub fn merge<'a>(sets: impl IntoIterator<Item = &'a DecorationSet>) -> Self {
        Self::from_vec(
            sets.into_iter()
                .flat_map(|set| set.decorations.iter().cloned())
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.decorations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Decoration> {
        self.decorations.iter()
    }

    /// Decorations touching `range`, boundaries inclusive.
    pub fn in_range(&self, range: Range<usize>) -> impl Iterator<Item = &Decoration> {
        self.decorations
            .iter()
            .filter(move |d| d.from <= range.end && d.to >= range.start)
    }

    /// Widgets in decoration order.
    pub fn widgets(&self) -> impl Iterator<Item = (&Decoration, &Widget)> {
        self.decorations
            .iter()
            .filter_map(|d| d.widget_ref().map(|w| (d, w)))
    }

    /// Carry the set through a document change. Ranges that collapse to
    /// nothing are dropped.
    pub fn map(&self, changes: &ChangeSet) -> Self {
        Self::from_vec(
            self.decorations
                .iter()
                .cloned()
                .filter_map(|d| d.map(changes))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a DecorationSet {
    type Item = &'a Decoration;
    type IntoIter = std::slice::Iter<'a, Decoration>;

    fn into_iter(self) -> Self::IntoIter {
        self.decorations.iter()
    }
}
