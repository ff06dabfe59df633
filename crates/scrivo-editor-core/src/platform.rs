//! Platform abstraction traits for editor collaborators.
//!
//! The decoration engine is synchronous and single-threaded. Everything that
//! can take time (path lookups, timers) or touches the host (clipboard) is
//! reached through these traits so the same engine runs under tokio, in a
//! browser, or in tests with hand-driven fakes.

use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use futures_util::future::LocalBoxFuture;

/// Opaque failure reported by a host collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct PlatformError(pub String);

impl From<&str> for PlatformError {
    fn from(s: &str) -> Self {
        PlatformError(s.to_string())
    }
}

/// Async existence check against the host's file index.
///
/// Queried with fully resolved paths. Lookup failures resolve to `false`.
pub trait PathIndex {
    fn exists(&self, path: &Path) -> LocalBoxFuture<'static, bool>;
}

/// Runs `!Send` futures on the UI thread's executor.
pub trait LocalSpawner {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>);
}

pub trait Timer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

pub trait Clipboard {
    fn write_text(&self, text: &str) -> Result<(), PlatformError>;
}

/// The host services a view needs.
#[derive(Clone)]
pub struct Platform {
    pub spawner: Rc<dyn LocalSpawner>,
    pub paths: Rc<dyn PathIndex>,
    pub clipboard: Rc<dyn Clipboard>,
    pub timer: Rc<dyn Timer>,
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_error_displays_its_message() {
        let err: PlatformError = "clipboard unavailable".into();
        assert_eq!(err.to_string(), "clipboard unavailable");
        assert!(std::error::Error::source(&err).is_none());
    }
}
