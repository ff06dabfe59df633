//! Viewport-aware rebuild controller.
//!
//! Decorations are kept in three fields, each with its own invalidation
//! rule:
//!
//! | Change          | Style | MathTable | Image                                  |
//! |-----------------|-------|-----------|----------------------------------------|
//! | Document edit   | full  | full      | full if viewport changed, set empty or edit in scope, else mapped |
//! | Selection only  | full  | full      | full if the caret changed images       |
//! | Viewport only   | kept  | kept      | full                                   |
//!
//! [`FieldState::apply`] is a pure function from the previous state and a
//! [`Change`] to the next state.

use std::ops::Range;

use crate::decoration::DecorationSet;
use crate::document::{Assoc, ChangeSet};
use crate::ext::{self, DecorateContext};
use crate::syntax::{NodeKind, SyntaxTree};
use crate::types::{Selection, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Headings, emphasis, blockquotes, code, tasks, rules, frontmatter.
    Style,
    MathTable,
    /// Viewport-scoped image decorations.
    Image,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Style, Field::MathTable, Field::Image];

    /// Compute this field's decorations from scratch.
    pub fn compute(self, cx: &DecorateContext) -> DecorationSet {
        match self {
            Field::Style => DecorationSet::merge(&[
                ext::heading::decorations(cx),
                ext::emphasis::decorations(cx),
                ext::blockquote::decorations(cx),
                ext::code::decorations(cx),
                ext::task::decorations(cx),
                ext::hr::decorations(cx),
                ext::frontmatter::decorations(cx),
            ]),
            Field::MathTable => DecorationSet::merge(&[
                ext::math::decorations(cx),
                ext::table::decorations(cx),
            ]),
            Field::Image => ext::image::decorations(cx),
        }
    }

    /// Where `compute` looks. Only images are viewport-scoped.
    pub fn scope(self, cx: &DecorateContext) -> Range<usize> {
        match self {
            Field::Image => ext::image::scan_range(cx),
            Field::Style | Field::MathTable => 0..cx.doc.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Recomputed from the tree.
    Full,
    /// Previous set mapped through the edit.
    Mapped,
    /// Previous set reused as is.
    Kept,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildReport {
    pub style: Outcome,
    pub math_table: Outcome,
    pub image: Outcome,
}

impl RebuildReport {
    pub fn get(&self, field: Field) -> Outcome {
        match field {
            Field::Style => self.style,
            Field::MathTable => self.math_table,
            Field::Image => self.image,
        }
    }

    pub fn all(outcome: Outcome) -> Self {
        Self {
            style: outcome,
            math_table: outcome,
            image: outcome,
        }
    }
}

/// One transaction as the fields see it.
#[derive(Debug, Clone, Copy)]
pub struct Change<'a> {
    /// Present when the document changed.
    pub changes: Option<&'a ChangeSet>,
    pub selection: Selection,
    pub viewport: Viewport,
}

/// Last inputs and output of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldState {
    pub field: Field,
    pub decorations: DecorationSet,
    pub selection: Selection,
    pub viewport: Viewport,
    /// Document range the decorations were computed over.
    pub scope: Range<usize>,
    /// Number of full computations so far, the initial one included.
    pub rebuilds: u64,
}

impl FieldState {
    pub fn init(field: Field, cx: &DecorateContext) -> Self {
        Self {
            field,
            decorations: field.compute(cx),
            selection: cx.selection,
            viewport: cx.viewport,
            scope: field.scope(cx),
            rebuilds: 1,
        }
    }

    /// Next state after `change`. `cx` describes the document after it.
    pub fn apply(&self, change: &Change, cx: &DecorateContext) -> (Self, Outcome) {
        let selection_changed = change.selection != self.selection;
        let viewport_changed = change.viewport != self.viewport;
        let outcome = match (self.field, change.changes) {
            (Field::Style | Field::MathTable, Some(_)) => Outcome::Full,
            (Field::Style | Field::MathTable, None) if selection_changed => Outcome::Full,
            (Field::Style | Field::MathTable, None) => Outcome::Kept,
            (Field::Image, Some(changes))
                if viewport_changed
                    || self.decorations.is_empty()
                    || edit_in_scope(changes, &self.scope) =>
            {
                Outcome::Full
            }
            (Field::Image, Some(_)) => Outcome::Mapped,
            (Field::Image, None) if viewport_changed => Outcome::Full,
            (Field::Image, None)
                if selection_changed
                    && image_under(cx.tree, self.selection) != image_under(cx.tree, change.selection) =>
            {
                Outcome::Full
            }
            (Field::Image, None) => Outcome::Kept,
        };

        let (decorations, scope, rebuilds) = match (outcome, change.changes) {
            (Outcome::Full, _) => (
                self.field.compute(cx),
                self.field.scope(cx),
                self.rebuilds + 1,
            ),
            (Outcome::Mapped, Some(changes)) => (
                self.decorations.map(changes),
                changes.map_pos(self.scope.start, Assoc::Before)
                    ..changes.map_pos(self.scope.end, Assoc::After),
                self.rebuilds,
            ),
            _ => (self.decorations.clone(), self.scope.clone(), self.rebuilds),
        };
        tracing::trace!(
            target: "scrivo::rebuild",
            field = ?self.field,
            ?outcome,
            decorations = decorations.len(),
            "field updated"
        );
        let next = Self {
            field: self.field,
            decorations,
            selection: change.selection,
            viewport: change.viewport,
            scope,
            rebuilds,
        };
        (next, outcome)
    }
}

/// Mapping is only trusted for edits outside the range that was decorated.
fn edit_in_scope(changes: &ChangeSet, scope: &Range<usize>) -> bool {
    changes
        .touched_a()
        .is_some_and(|touched| touched.start <= scope.end && touched.end >= scope.start)
}

/// The image around a selection, as far as image decorations care: its
/// range and whether the caret is in its path.
fn image_under(tree: &SyntaxTree, selection: Selection) -> Option<(Range<usize>, bool)> {
    tree.enclosing(selection.to_range(), |kind| kind == NodeKind::Image)
        .map(|image| {
            (
                image.range(),
                crate::active::is_caret_in_image_path(image, selection),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtensionConfig;
    use crate::document::Document;
    use crate::types::Edit;

    struct Snapshot {
        doc: Document,
        tree: SyntaxTree,
        config: ExtensionConfig,
    }

    impl Snapshot {
        fn new(text: &str) -> Self {
            Self {
                doc: Document::new(text),
                tree: SyntaxTree::parse(text),
                config: ExtensionConfig::default(),
            }
        }

        fn cx(&self, selection: Selection, viewport: Viewport) -> DecorateContext<'_> {
            DecorateContext {
                tree: &self.tree,
                doc: &self.doc,
                selection,
                viewport,
                config: &self.config,
            }
        }
    }

    const TEXT: &str = "plain words here\n\n![a](a.png) ![b](b.png)";

    fn whole() -> Viewport {
        Viewport::whole(TEXT.len())
    }

    fn moved(state: &FieldState, snap: &Snapshot, caret: usize) -> Outcome {
        let selection = Selection::collapsed(caret);
        let change = Change {
            changes: None,
            selection,
            viewport: state.viewport,
        };
        state.apply(&change, &snap.cx(selection, state.viewport)).1
    }

    #[test]
    fn selection_moves_in_plain_text_keep_images() {
        let snap = Snapshot::new(TEXT);
        let state = FieldState::init(Field::Image, &snap.cx(Selection::collapsed(2), whole()));
        assert_eq!(moved(&state, &snap, 9), Outcome::Kept);

        let style = FieldState::init(Field::Style, &snap.cx(Selection::collapsed(2), whole()));
        assert_eq!(moved(&style, &snap, 9), Outcome::Full);
    }

    #[test]
    fn caret_crossing_images_rebuilds() {
        let snap = Snapshot::new(TEXT);
        // Inside the first path, then inside the second.
        let state = FieldState::init(Field::Image, &snap.cx(Selection::collapsed(24), whole()));
        assert_eq!(moved(&state, &snap, 36), Outcome::Full);
        assert_eq!(moved(&state, &snap, 25), Outcome::Kept);
    }

    #[test]
    fn viewport_only_touches_images() {
        let snap = Snapshot::new(TEXT);
        let sel = Selection::collapsed(0);
        let change = Change {
            changes: None,
            selection: sel,
            viewport: Viewport::new(0, 10),
        };
        for field in Field::ALL {
            let state = FieldState::init(field, &snap.cx(sel, whole()));
            let (next, outcome) = state.apply(&change, &snap.cx(sel, change.viewport));
            let expected = match field {
                Field::Image => Outcome::Full,
                _ => Outcome::Kept,
            };
            assert_eq!(outcome, expected, "{field:?}");
            assert_eq!(next.viewport, change.viewport);
        }
    }

    #[test]
    fn offscreen_edits_map_images_unless_viewport_moved() {
        let before = Snapshot::new(TEXT);
        let sel = Selection::collapsed(0);
        // Only the image line is on screen.
        let state = FieldState::init(Field::Image, &before.cx(sel, Viewport::new(18, 41)));
        assert_eq!(state.decorations.len(), 2);

        let mut doc = Document::new(TEXT);
        let changes = doc.apply(&[Edit::insert(0, "x")]).unwrap();
        let after = Snapshot {
            tree: before.tree.update(doc.text(), &changes),
            doc,
            config: ExtensionConfig::default(),
        };

        let same_viewport = Change {
            changes: Some(&changes),
            selection: sel,
            viewport: state.viewport,
        };
        let (next, outcome) = state.apply(&same_viewport, &after.cx(sel, state.viewport));
        assert_eq!(outcome, Outcome::Mapped);
        assert_eq!(next.rebuilds, state.rebuilds);
        assert_eq!(next.decorations.iter().next().map(|d| d.from), Some(19));

        let grown = Viewport::whole(after.doc.len());
        let scrolled = Change {
            viewport: grown,
            ..same_viewport
        };
        let (next, outcome) = state.apply(&scrolled, &after.cx(sel, grown));
        assert_eq!(outcome, Outcome::Full);
        assert_eq!(next.rebuilds, state.rebuilds + 1);
    }

    #[test]
    fn visible_edit_rebuilds_images_even_at_same_length() {
        let before = Snapshot::new(TEXT);
        let sel = Selection::collapsed(0);
        let state = FieldState::init(Field::Image, &before.cx(sel, whole()));

        let mut doc = Document::new(TEXT);
        let changes = doc.apply(&[Edit::replace(23..28, "z.png")]).unwrap();
        let after = Snapshot {
            tree: before.tree.update(doc.text(), &changes),
            doc,
            config: ExtensionConfig::default(),
        };
        let change = Change {
            changes: Some(&changes),
            selection: sel,
            viewport: whole(),
        };
        let (next, outcome) = state.apply(&change, &after.cx(sel, whole()));
        assert_eq!(outcome, Outcome::Full);
        let (_, first) = next.decorations.widgets().next().unwrap();
        assert_eq!(
            first,
            &crate::widget::Widget::Image {
                src: "z.png".into(),
                tracking: false
            }
        );
    }

    #[test]
    fn path_edit_on_the_viewports_first_line_rebuilds() {
        let before = Snapshot::new(TEXT);
        let sel = Selection::collapsed(0);
        // Starts after the first image but on its line.
        let viewport = Viewport::new(30, 41);
        let state = FieldState::init(Field::Image, &before.cx(sel, viewport));
        assert_eq!(state.scope, 18..41);
        assert_eq!(state.decorations.len(), 2);

        let mut doc = Document::new(TEXT);
        let changes = doc.apply(&[Edit::replace(23..28, "q.jpg")]).unwrap();
        let after = Snapshot {
            tree: before.tree.update(doc.text(), &changes),
            doc,
            config: ExtensionConfig::default(),
        };
        let change = Change {
            changes: Some(&changes),
            selection: sel,
            viewport,
        };
        let (next, outcome) = state.apply(&change, &after.cx(sel, viewport));
        assert_eq!(outcome, Outcome::Full);
        let fresh = FieldState::init(Field::Image, &after.cx(sel, viewport));
        assert_eq!(next.decorations, fresh.decorations);
        let (_, first) = next.decorations.widgets().next().unwrap();
        assert_eq!(
            first,
            &crate::widget::Widget::Image {
                src: "q.jpg".into(),
                tracking: false
            }
        );
    }

    #[test]
    fn empty_image_set_rebuilds_on_edit() {
        let text = "no images";
        let before = Snapshot::new(text);
        let sel = Selection::collapsed(0);
        let viewport = Viewport::whole(text.len());
        let state = FieldState::init(Field::Image, &before.cx(sel, viewport));

        let mut doc = Document::new(text);
        let changes = doc.apply(&[Edit::insert(9, " ![c](c.png)")]).unwrap();
        let after = Snapshot {
            tree: before.tree.update(doc.text(), &changes),
            doc,
            config: ExtensionConfig::default(),
        };
        let change = Change {
            changes: Some(&changes),
            selection: sel,
            viewport,
        };
        let (next, outcome) = state.apply(&change, &after.cx(sel, viewport));
        assert_eq!(outcome, Outcome::Full);
        assert_eq!(next.decorations.len(), 1);
    }
}
