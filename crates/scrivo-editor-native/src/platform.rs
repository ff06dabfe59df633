//! Tokio and filesystem implementations of the core platform traits.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use futures_util::future::LocalBoxFuture;
use scrivo_editor_core::{Clipboard, LocalSpawner, PathIndex, Platform, PlatformError, Timer};

/// Spawns onto the current [`tokio::task::LocalSet`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSpawner;

impl LocalSpawner for TokioSpawner {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        tokio::task::spawn_local(task);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioTimer;

impl Timer for TokioTimer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Answers image lookups straight from the filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsPathIndex;

impl PathIndex for FsPathIndex {
    fn exists(&self, path: &Path) -> LocalBoxFuture<'static, bool> {
        let path = path.to_path_buf();
        Box::pin(async move {
            match tokio::fs::metadata(&path).await {
                Ok(meta) => meta.is_file(),
                Err(e) => {
                    tracing::trace!(target: "scrivo::widget", path = %path.display(), error = %e, "image lookup missed");
                    false
                }
            }
        })
    }
}

/// System clipboard, opened on first use.
#[derive(Default)]
pub struct ArboardClipboard {
    clipboard: RefCell<Option<arboard::Clipboard>>,
}

impl std::fmt::Debug for ArboardClipboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArboardClipboard")
            .field("open", &self.clipboard.borrow().is_some())
            .finish()
    }
}

impl Clipboard for ArboardClipboard {
    fn write_text(&self, text: &str) -> Result<(), PlatformError> {
        let mut slot = self.clipboard.borrow_mut();
        if slot.is_none() {
            let opened = arboard::Clipboard::new().map_err(|e| PlatformError(e.to_string()))?;
            *slot = Some(opened);
        }
        let Some(clipboard) = slot.as_mut() else {
            return Err("clipboard unavailable".into());
        };
        clipboard
            .set_text(text.to_owned())
            .map_err(|e| PlatformError(e.to_string()))
    }
}

/// Everything a native view needs. Spawned work requires a running
/// `LocalSet`.
pub fn native_platform() -> Platform {
    Platform {
        spawner: Rc::new(TokioSpawner),
        paths: Rc::new(FsPathIndex),
        clipboard: Rc::new(ArboardClipboard::default()),
        timer: Rc::new(TokioTimer),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use scrivo_editor_core::{EditorView, ExtensionConfig, Transaction, WidgetKind};
    use tokio::task::LocalSet;

    use super::*;

    #[tokio::test]
    async fn spawned_tasks_run_on_the_local_set() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let ran = Rc::new(Cell::new(false));
                let flag = ran.clone();
                let (tx, rx) = tokio::sync::oneshot::channel();
                TokioSpawner.spawn_local(Box::pin(async move {
                    flag.set(true);
                    let _ = tx.send(());
                }));
                rx.await.unwrap();
                assert!(ran.get());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn timer_follows_tokio_time() {
        let start = tokio::time::Instant::now();
        TokioTimer.sleep(Duration::from_secs(3)).await;
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test]
    async fn path_index_only_finds_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("cat.png");
        std::fs::write(&file, b"png").unwrap();

        assert!(FsPathIndex.exists(&file).await);
        assert!(!FsPathIndex.exists(&dir.path().join("dog.png")).await);
        assert!(!FsPathIndex.exists(dir.path()).await);
    }

    #[tokio::test]
    async fn existing_images_upgrade_in_a_native_view() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cat.png"), b"png").unwrap();
        let config = ExtensionConfig {
            notes_root: dir.path().to_path_buf(),
            ..Default::default()
        };

        let local = LocalSet::new();
        local
            .run_until(async move {
                let platform = native_platform();
                let text = "![cat](cat.png)\n\nafter";
                let view = EditorView::new(text, platform, config);
                view.dispatch(Transaction::new().caret(text.len())).unwrap();

                let mounted = view.materialize();
                assert_eq!(mounted[0].id.kind, WidgetKind::Image);
                let dom = mounted[0].dom.clone();

                for _ in 0..200 {
                    if dom.inner_html().starts_with("<img") {
                        break;
                    }
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
                assert!(dom.inner_html().starts_with("<img"));
            })
            .await;
    }
}
