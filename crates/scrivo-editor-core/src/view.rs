//! The editor view: one document, its decorations and everything wired to
//! them.
//!
//! [`EditorView::dispatch`] is the single entry point for changes. It applies
//! the edits, updates the syntax tree, runs the rebuild controller and then
//! syncs the overlay store. Widget DOM is brought up to date separately by
//! [`EditorView::materialize`], which the host calls before painting.
//!
//! `EditorView` is a cheap handle; clones share the same view. No internal
//! borrow is held while overlay watchers, bus handlers or the change
//! listener run, so those may call back into the view.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;

use smol_str::SmolStr;

use crate::active;
use crate::config::ExtensionConfig;
use crate::decoration::DecorationSet;
use crate::document::{Assoc, ChangeSet, Document, DocumentError};
use crate::ext::DecorateContext;
use crate::ext::gutter::CodeLineNumbers;
use crate::ext::task;
use crate::keymap::{KeyCombo, KeydownResult, Keymap, KeymapSlot};
use crate::overlay::{EventBus, OverlayController, OverlayEvent, OverlayState, OverlayStore};
use crate::platform::Platform;
use crate::rebuild::{Change, Field, FieldState, Outcome, RebuildReport};
use crate::render::Renderers;
use crate::syntax::SyntaxTree;
use crate::types::{Edit, Rect, Selection, Viewport};
use crate::widget::{
    ImageCache, LayoutObservers, Materialized, WidgetEnv, WidgetManager, WidgetStats,
};

/// A batch of edits plus an optional new selection and viewport.
///
/// Edits are in pre-transaction coordinates, sorted and non-overlapping.
/// Without an explicit selection the current one is mapped through the
/// edits; the same goes for the viewport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    pub edits: Vec<Edit>,
    pub selection: Option<Selection>,
    pub viewport: Option<Viewport>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edit(mut self, edit: Edit) -> Self {
        self.edits.push(edit);
        self
    }

    pub fn select(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn caret(self, offset: usize) -> Self {
        self.select(Selection::collapsed(offset))
    }

    pub fn scroll(mut self, viewport: Viewport) -> Self {
        self.viewport = Some(viewport);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty() && self.selection.is_none() && self.viewport.is_none()
    }
}

struct ViewState {
    doc: Document,
    tree: SyntaxTree,
    selection: Selection,
    viewport: Viewport,
    style: FieldState,
    math_table: FieldState,
    image: FieldState,
    gutter: CodeLineNumbers,
}

impl ViewState {
    fn field(&self, field: Field) -> &FieldState {
        match field {
            Field::Style => &self.style,
            Field::MathTable => &self.math_table,
            Field::Image => &self.image,
        }
    }

    fn merged(&self) -> DecorationSet {
        DecorationSet::merge([
            &self.style.decorations,
            &self.math_table.decorations,
            &self.image.decorations,
        ])
    }
}

type ChangeListener = Rc<dyn Fn(Arc<str>)>;

struct ViewInner {
    config: ExtensionConfig,
    state: RefCell<ViewState>,
    widgets: RefCell<WidgetManager>,
    observers: LayoutObservers,
    bus: EventBus,
    overlay: OverlayStore,
    keymap: KeymapSlot,
    controller: OverlayController,
    listener: RefCell<Option<ChangeListener>>,
    focus_requested: Cell<bool>,
}

#[derive(Clone)]
pub struct EditorView(Rc<ViewInner>);

impl EditorView {
    pub fn new(text: &str, platform: Platform, config: ExtensionConfig) -> Self {
        Self::with_renderers(text, platform, Renderers::default(), config)
    }

    pub fn with_renderers(
        text: &str,
        platform: Platform,
        renderers: Renderers,
        config: ExtensionConfig,
    ) -> Self {
        let doc = Document::new(text);
        let tree = SyntaxTree::parse(text);
        let selection = Selection::collapsed(0);
        let viewport = Viewport::whole(doc.len());
        let gutter = CodeLineNumbers::compute(&tree, doc.text());
        let (style, math_table, image) = {
            let cx = DecorateContext {
                tree: &tree,
                doc: &doc,
                selection,
                viewport,
                config: &config,
            };
            (
                FieldState::init(Field::Style, &cx),
                FieldState::init(Field::MathTable, &cx),
                FieldState::init(Field::Image, &cx),
            )
        };
        let state = ViewState {
            doc,
            tree,
            selection,
            viewport,
            style,
            math_table,
            image,
            gutter,
        };

        let inner = Rc::new_cyclic(|weak: &Weak<ViewInner>| {
            let bus = EventBus::new();
            let overlay = OverlayStore::new();
            let observers = LayoutObservers::default();

            let anchor_store = overlay.clone();
            let env = WidgetEnv {
                platform,
                renderers,
                config: config.clone(),
                observers: observers.clone(),
                images: ImageCache::default(),
                anchor: Some(Rc::new(move |rect: Rect| {
                    anchor_store.update(|s| {
                        if s.caret_in_image {
                            s.anchor = Some(rect);
                        }
                    });
                })),
            };

            let on_selected = weak.clone();
            let controller = OverlayController::new(bus.clone(), move |path| {
                if let Some(inner) = on_selected.upgrade() {
                    EditorView(inner).apply_image_selection(path);
                }
            });

            ViewInner {
                keymap: KeymapSlot::new(bus.clone()),
                config,
                state: RefCell::new(state),
                widgets: RefCell::new(WidgetManager::new(env)),
                observers,
                bus,
                overlay,
                controller,
                listener: RefCell::new(None),
                focus_requested: Cell::new(false),
            }
        });

        let view = Self(inner);
        view.install_overlay_watchers();
        view.sync_overlay();
        view
    }

    fn install_overlay_watchers(&self) {
        let weak = Rc::downgrade(&self.0);
        self.0.overlay.watch(
            |s| s.caret_in_image,
            move |_, &inside| {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                if inside {
                    inner.keymap.set(Keymap::OverlayActive);
                    inner.controller.register();
                } else {
                    inner.keymap.set(Keymap::Empty);
                    inner.controller.unregister();
                    inner.bus.publish(&OverlayEvent::OverlayClose);
                }
            },
        );

        let bus = self.0.bus.clone();
        self.0.overlay.watch(
            |s| (s.caret_in_image, s.src.clone()),
            move |_, (inside, src)| {
                if *inside {
                    bus.publish(&OverlayEvent::ImageSourceChanged(src.clone()));
                }
            },
        );
    }

    // === Transactions ===

    /// Apply a transaction and bring decorations and overlay state up to
    /// date. An invalid edit leaves the view untouched.
    pub fn dispatch(&self, tr: Transaction) -> Result<RebuildReport, DocumentError> {
        let (report, changed) = {
            let mut guard = self.0.state.borrow_mut();
            let state = &mut *guard;

            let changes = if tr.edits.is_empty() {
                None
            } else {
                Some(state.doc.apply(&tr.edits)?)
            };
            if let Some(changes) = &changes {
                state.tree = state.tree.update(state.doc.text(), changes);
                state.gutter = CodeLineNumbers::compute(&state.tree, state.doc.text());
            }

            let len = state.doc.len();
            state.selection = match (tr.selection, &changes) {
                (Some(selection), _) => selection.clamp(len),
                (None, Some(changes)) => changes.map_selection(state.selection),
                (None, None) => state.selection,
            };
            state.viewport = match (tr.viewport, &changes) {
                (Some(viewport), _) => viewport.clamp(len),
                (None, Some(changes)) => map_viewport(state.viewport, changes),
                (None, None) => state.viewport,
            };

            let change = Change {
                changes: changes.as_ref(),
                selection: state.selection,
                viewport: state.viewport,
            };
            let cx = DecorateContext {
                tree: &state.tree,
                doc: &state.doc,
                selection: state.selection,
                viewport: state.viewport,
                config: &self.0.config,
            };
            let (style, style_outcome) = state.style.apply(&change, &cx);
            let (math_table, math_outcome) = state.math_table.apply(&change, &cx);
            let (image, image_outcome) = state.image.apply(&change, &cx);
            state.style = style;
            state.math_table = math_table;
            state.image = image;

            let report = RebuildReport {
                style: style_outcome,
                math_table: math_outcome,
                image: image_outcome,
            };
            tracing::debug!(
                target: "scrivo::rebuild",
                version = state.doc.version(),
                edits = tr.edits.len(),
                ?report,
                "dispatched transaction"
            );
            (report, changes.map(|_| state.doc.snapshot()))
        };

        self.sync_overlay();
        if let Some(text) = changed {
            let listener = self.0.listener.borrow().clone();
            if let Some(listener) = listener {
                listener(text);
            }
        }
        Ok(report)
    }

    /// Recompute every field from scratch.
    pub fn rebuild_all(&self) -> RebuildReport {
        let mut guard = self.0.state.borrow_mut();
        let state = &mut *guard;
        let cx = DecorateContext {
            tree: &state.tree,
            doc: &state.doc,
            selection: state.selection,
            viewport: state.viewport,
            config: &self.0.config,
        };
        let rebuilt = |previous: &FieldState| FieldState {
            rebuilds: previous.rebuilds + 1,
            ..FieldState::init(previous.field, &cx)
        };
        let (style, math_table, image) = (
            rebuilt(&state.style),
            rebuilt(&state.math_table),
            rebuilt(&state.image),
        );
        state.style = style;
        state.math_table = math_table;
        state.image = image;
        RebuildReport::all(Outcome::Full)
    }

    /// Flip the task checkbox whose marker starts at `from`. On success the
    /// host should return focus to the editor (see
    /// [`take_focus_request`](Self::take_focus_request)).
    pub fn toggle_task(&self, from: usize) -> bool {
        let edit = task::toggle_edit(self.0.state.borrow().doc.text(), from);
        let Some(edit) = edit else {
            tracing::debug!(target: "scrivo::view", from, "no task marker to toggle");
            return false;
        };
        match self.dispatch(Transaction::new().edit(edit)) {
            Ok(_) => {
                self.0.focus_requested.set(true);
                true
            }
            Err(err) => {
                tracing::warn!(target: "scrivo::view", %err, "task toggle rejected");
                false
            }
        }
    }

    pub fn take_focus_request(&self) -> bool {
        self.0.focus_requested.replace(false)
    }

    /// Called with the new text after every transaction that edits the
    /// document.
    pub fn set_change_listener(&self, listener: impl Fn(Arc<str>) + 'static) {
        *self.0.listener.borrow_mut() = Some(Rc::new(listener));
    }

    // === Overlay ===

    fn sync_overlay(&self) {
        let focus = {
            let state = self.0.state.borrow();
            active::image_at(&state.tree, state.doc.text(), state.selection)
        };
        self.0.overlay.update(|s| match focus {
            Some(focus) => {
                s.caret_in_image = focus.caret_in_path;
                s.active_range = Some(focus.path);
                s.src = focus.src;
                if !s.caret_in_image {
                    s.anchor = None;
                }
            }
            None => *s = OverlayState::default(),
        });
    }

    /// Replace the published image path with `path` and close the overlay.
    fn apply_image_selection(&self, path: SmolStr) {
        let Some(range) = self.0.overlay.get().active_range else {
            tracing::warn!(target: "scrivo::overlay", %path, "image selected with no active image");
            return;
        };
        let caret = range.start + path.len();
        let tr = Transaction::new()
            .edit(Edit::replace(range, path))
            .caret(caret);
        if let Err(err) = self.dispatch(tr) {
            tracing::warn!(target: "scrivo::overlay", %err, "could not apply selected image");
        }
        self.close_overlay();
    }

    /// Drop overlay focus until the caret next enters an image path.
    pub fn close_overlay(&self) {
        self.0.overlay.update(|s| {
            s.caret_in_image = false;
            s.anchor = None;
        });
    }

    pub fn overlay(&self) -> OverlayState {
        self.0.overlay.get()
    }

    pub fn bus(&self) -> &EventBus {
        &self.0.bus
    }

    pub fn keymap(&self) -> Keymap {
        self.0.keymap.current()
    }

    pub fn overlay_registered(&self) -> bool {
        self.0.controller.is_registered()
    }

    pub fn handle_key(&self, combo: &KeyCombo) -> KeydownResult {
        self.0.keymap.handle(combo)
    }

    // === Widgets ===

    /// Reconcile widget DOM with the current decorations.
    pub fn materialize(&self) -> Vec<Materialized> {
        let decorations = self.decorations();
        self.0.widgets.borrow_mut().reconcile(&decorations)
    }

    pub fn widget_stats(&self) -> WidgetStats {
        self.0.widgets.borrow().stats()
    }

    pub fn images(&self) -> ImageCache {
        self.0.widgets.borrow().images().clone()
    }

    /// Copy the code behind a header widget to the clipboard.
    pub fn copy_code(&self, dom_id: u64) -> bool {
        self.0.widgets.borrow().copy_code(dom_id)
    }

    /// Host report of a widget's new screen box.
    pub fn notify_layout(&self, dom_id: u64, rect: Rect) -> usize {
        self.0.observers.notify(dom_id, rect)
    }

    pub fn observer_count(&self) -> usize {
        self.0.observers.len()
    }

    // === Queries ===

    /// All decorations, merged and sorted.
    pub fn decorations(&self) -> DecorationSet {
        self.0.state.borrow().merged()
    }

    pub fn field_decorations(&self, field: Field) -> DecorationSet {
        self.0.state.borrow().field(field).decorations.clone()
    }

    /// Full computations of `field` since the view was created.
    pub fn rebuild_count(&self, field: Field) -> u64 {
        self.0.state.borrow().field(field).rebuilds
    }

    /// Gutter number for a 1-based document line, if it is inside a code
    /// block.
    pub fn line_number_marker(&self, line: usize) -> Option<usize> {
        let state = self.0.state.borrow();
        let line = state.doc.line(line)?;
        state.gutter.marker_at(line.from)
    }

    pub fn text(&self) -> Arc<str> {
        self.0.state.borrow().doc.snapshot()
    }

    pub fn version(&self) -> u64 {
        self.0.state.borrow().doc.version()
    }

    pub fn selection(&self) -> Selection {
        self.0.state.borrow().selection
    }

    pub fn viewport(&self) -> Viewport {
        self.0.state.borrow().viewport
    }

    pub fn tree(&self) -> SyntaxTree {
        self.0.state.borrow().tree.clone()
    }
}

fn map_viewport(viewport: Viewport, changes: &ChangeSet) -> Viewport {
    Viewport::new(
        changes.map_pos(viewport.from, Assoc::Before),
        changes.map_pos(viewport.to, Assoc::After),
    )
}

impl std::fmt::Debug for EditorView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.0.state.borrow();
        f.debug_struct("EditorView")
            .field("version", &state.doc.version())
            .field("selection", &state.selection)
            .field("viewport", &state.viewport)
            .field("decorations", &state.merged().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestPlatform;

    fn view(text: &str) -> (EditorView, TestPlatform) {
        let platform = TestPlatform::default();
        let view = EditorView::new(text, platform.platform(), ExtensionConfig::default());
        (view, platform)
    }

    #[test]
    fn edits_map_selection_and_bump_version() {
        let (view, _) = view("hello world");
        view.dispatch(Transaction::new().caret(6)).unwrap();
        view.dispatch(Transaction::new().edit(Edit::insert(0, ">> ")))
            .unwrap();
        assert_eq!(&*view.text(), ">> hello world");
        assert_eq!(view.selection(), Selection::collapsed(9));
        assert_eq!(view.version(), 1);
    }

    #[test]
    fn invalid_edit_changes_nothing() {
        let (view, _) = view("abc");
        let before = view.decorations();
        let err = view
            .dispatch(Transaction::new().edit(Edit::delete(2..9)))
            .unwrap_err();
        assert!(matches!(err, DocumentError::OutOfBounds { .. }));
        assert_eq!(&*view.text(), "abc");
        assert_eq!(view.decorations(), before);
    }

    #[test]
    fn empty_transaction_keeps_everything() {
        let (view, _) = view("# T\n\n![a](a.png)");
        let report = view.dispatch(Transaction::new()).unwrap();
        assert_eq!(report, RebuildReport::all(Outcome::Kept));
    }

    #[test]
    fn change_listener_sees_edits_only() {
        let (view, _) = view("a");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        view.set_change_listener(move |text| sink.borrow_mut().push(text.to_string()));
        view.dispatch(Transaction::new().caret(1)).unwrap();
        view.dispatch(Transaction::new().edit(Edit::insert(1, "b")))
            .unwrap();
        assert_eq!(*seen.borrow(), vec!["ab".to_string()]);
    }

    #[test]
    fn overlay_follows_caret_into_image_path() {
        let (view, _) = view("see ![cat](img/cat.png) here");
        assert!(!view.overlay().caret_in_image);
        assert_eq!(view.keymap(), Keymap::Empty);

        view.dispatch(Transaction::new().caret(14)).unwrap();
        let overlay = view.overlay();
        assert!(overlay.caret_in_image);
        assert_eq!(overlay.active_range, Some(11..22));
        assert_eq!(overlay.src, "img/cat.png");
        assert_eq!(view.keymap(), Keymap::OverlayActive);
        assert!(view.overlay_registered());

        // On the alt text: still the image, not its path.
        view.dispatch(Transaction::new().caret(7)).unwrap();
        assert!(!view.overlay().caret_in_image);
        assert_eq!(view.keymap(), Keymap::Empty);
        assert!(!view.overlay_registered());
    }

    #[test]
    fn gutter_markers_by_line_number() {
        let (view, _) = view("x\n```\na\nb\n```");
        assert_eq!(view.line_number_marker(1), None);
        assert_eq!(view.line_number_marker(3), Some(1));
        assert_eq!(view.line_number_marker(4), Some(2));
        assert_eq!(view.line_number_marker(5), None);
        assert_eq!(view.line_number_marker(9), None);
    }
}
