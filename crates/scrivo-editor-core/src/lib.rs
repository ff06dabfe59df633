//! scrivo-editor-core: live markdown decoration engine.
//!
//! This crate provides:
//! - `Document` - versioned text with change maps
//! - `SyntaxTree` - incremental markdown tree with math, frontmatter and
//!   both table syntaxes
//! - Decoration extensions, each a pure function of tree, selection and
//!   viewport
//! - `WidgetManager` - deferred widget DOM with id-based reuse
//! - Overlay bus, store and keymap conditioning for the image picker
//! - `EditorView` - the facade tying it together
//!
//! Everything here is single-threaded and runtime-agnostic. Async host
//! services come in through [`Platform`].

pub mod active;
pub mod config;
pub mod decoration;
pub mod document;
pub mod ext;
pub mod keymap;
pub mod overlay;
pub mod platform;
pub mod rebuild;
pub mod render;
pub mod syntax;
pub mod testing;
pub mod text;
pub mod types;
pub mod view;
pub mod widget;

pub use config::ExtensionConfig;
pub use decoration::{Decoration, DecorationBuilder, DecorationKind, DecorationSet, Side};
pub use document::{Assoc, ChangeSet, Document, DocumentError, Line};
pub use ext::DecorateContext;
pub use keymap::{Key, KeyCombo, KeydownResult, Keymap, Modifiers};
pub use overlay::{
    EventBus, EventKind, HotKey, ImagePicker, OverlayEvent, OverlayState, PickerState,
};
pub use platform::{Clipboard, LocalSpawner, PathIndex, Platform, PlatformError, Timer};
pub use rebuild::{Field, Outcome, RebuildReport};
pub use render::{MathRenderer, Renderers, TableRenderer};
pub use smol_str::SmolStr;
pub use syntax::{NodeKind, SyntaxNode, SyntaxTree};
pub use text::EditorRope;
pub use types::{Edit, Rect, Selection, Viewport};
pub use view::{EditorView, Transaction};
pub use widget::{DomHandle, Materialized, TableSyntax, Widget, WidgetId, WidgetKind, WidgetStats};
