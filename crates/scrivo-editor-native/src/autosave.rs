//! Debounced persistence of edited notes.
//!
//! Each [`AutoSaver::schedule`] call snapshots a path together with the
//! content to write there. Rescheduling the same path restarts its quiet
//! period and replaces the content; other paths keep their own timers, so
//! switching notes mid-debounce still writes the old note's text under the
//! old note's path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::store::NoteStore;

struct Pending {
    content: Arc<str>,
    generation: u64,
}

struct Inner<S> {
    store: S,
    debounce: Duration,
    pending: Mutex<HashMap<PathBuf, Pending>>,
    generation: AtomicU64,
}

impl<S: NoteStore> Inner<S> {
    fn pending(&self) -> MutexGuard<'_, HashMap<PathBuf, Pending>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write the snapshot scheduled as `generation`, if it is still the
    /// latest one for `path`.
    async fn fire(&self, path: &Path, generation: u64) -> bool {
        let content = {
            let mut pending = self.pending();
            let latest = pending
                .get(path)
                .is_some_and(|p| p.generation == generation);
            if latest {
                pending.remove(path).map(|p| p.content)
            } else {
                None
            }
        };
        match content {
            Some(content) => self.write(path, &content).await,
            None => {
                tracing::trace!(target: "scrivo::autosave", path = %path.display(), generation, "superseded");
                false
            }
        }
    }

    async fn write(&self, path: &Path, content: &str) -> bool {
        match self.store.write(path, content).await {
            Ok(()) => {
                tracing::debug!(target: "scrivo::autosave", path = %path.display(), bytes = content.len(), "saved");
                true
            }
            Err(e) => {
                tracing::warn!(target: "scrivo::autosave", error = %e, "save failed");
                false
            }
        }
    }
}

/// Per-path debounced writer over a [`NoteStore`].
///
/// Must be used from within a tokio runtime.
pub struct AutoSaver<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for AutoSaver<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S> std::fmt::Debug for AutoSaver<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoSaver")
            .field("debounce", &self.inner.debounce)
            .finish_non_exhaustive()
    }
}

impl<S: NoteStore> AutoSaver<S> {
    pub fn new(store: S, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                debounce,
                pending: Mutex::new(HashMap::new()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn store(&self) -> &S {
        &self.inner.store
    }

    pub fn debounce(&self) -> Duration {
        self.inner.debounce
    }

    /// Queue `content` for `path`, restarting that path's quiet period.
    pub fn schedule(&self, path: impl Into<PathBuf>, content: impl Into<Arc<str>>) {
        let path = path.into();
        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed);
        self.inner.pending().insert(
            path.clone(),
            Pending {
                content: content.into(),
                generation,
            },
        );
        tracing::trace!(target: "scrivo::autosave", path = %path.display(), generation, "save scheduled");

        let inner = self.inner.clone();
        tokio::spawn(async move {
            tokio::time::sleep(inner.debounce).await;
            inner.fire(&path, generation).await;
        });
    }

    pub fn is_pending(&self, path: &Path) -> bool {
        self.inner.pending().contains_key(path)
    }

    pub fn pending_count(&self) -> usize {
        self.inner.pending().len()
    }

    /// Write `content` immediately, dropping any queued snapshot for `path`.
    pub async fn save_now(&self, path: impl AsRef<Path>, content: &str) -> bool {
        let path = path.as_ref();
        self.inner.pending().remove(path);
        self.inner.write(path, content).await
    }

    /// Write every queued snapshot now. Returns whether all writes
    /// succeeded.
    pub async fn flush(&self) -> bool {
        let drained: Vec<_> = {
            let mut pending = self.inner.pending();
            pending.drain().map(|(path, p)| (path, p.content)).collect()
        };
        let mut ok = true;
        for (path, content) in drained {
            ok &= self.inner.write(&path, &content).await;
        }
        ok
    }
}
