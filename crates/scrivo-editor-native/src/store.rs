//! Note persistence keyed by path.
//!
//! Notes are plain UTF-8 markdown. The store never interprets content.

use std::future::Future;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// Read and write whole notes.
pub trait NoteStore: Send + Sync + 'static {
    fn read(&self, path: &Path) -> impl Future<Output = Result<String, StoreError>> + Send;

    fn write(&self, path: &Path, content: &str)
    -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Notes as files under a root directory.
#[derive(Debug, Clone)]
pub struct FsNoteStore {
    root: PathBuf,
}

impl FsNoteStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative paths are taken from the root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl NoteStore for FsNoteStore {
    fn read(&self, path: &Path) -> impl Future<Output = Result<String, StoreError>> + Send {
        let path = self.resolve(path);
        async move {
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| StoreError::Read { path, source })
        }
    }

    fn write(
        &self,
        path: &Path,
        content: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        let path = self.resolve(path);
        let content = content.to_owned();
        async move {
            if let Some(parent) = path.parent() {
                if let Err(source) = tokio::fs::create_dir_all(parent).await {
                    return Err(StoreError::Write { path, source });
                }
            }
            match tokio::fs::write(&path, content).await {
                Ok(()) => {
                    tracing::trace!(target: "scrivo::autosave", path = %path.display(), "note written");
                    Ok(())
                }
                Err(source) => Err(StoreError::Write { path, source }),
            }
        }
    }
}
