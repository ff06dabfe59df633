//! scrivo-editor-native: the tokio and filesystem side of the editor.
//!
//! - [`platform`] - tokio spawner and timer, filesystem path index, system
//!   clipboard, bundled as a core [`Platform`](scrivo_editor_core::Platform)
//! - [`store`] - note persistence keyed by path
//! - [`autosave`] - per-path debounced writes
//! - [`config`] - JSON editor settings
//! - [`telemetry`] - tracing subscriber setup

pub mod autosave;
pub mod config;
pub mod error;
pub mod platform;
pub mod store;
pub mod telemetry;

pub use autosave::AutoSaver;
pub use config::EditorConfig;
pub use error::{ConfigError, StoreError};
pub use platform::{ArboardClipboard, FsPathIndex, TokioSpawner, TokioTimer, native_platform};
pub use store::{FsNoteStore, NoteStore};
