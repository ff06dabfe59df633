//! Settings the decoration extensions and widgets read.

use std::path::{Path, PathBuf};
use std::time::Duration;

use smol_str::SmolStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionConfig {
    /// Image extensions worth an existence check, lowercase, no dot.
    pub image_extensions: Vec<SmolStr>,
    /// Directory relative image paths resolve against.
    pub notes_root: PathBuf,
    /// How long the code header shows its "copied" icon.
    pub copy_feedback: Duration,
    /// Extra lines above and below the viewport that get image decorations.
    pub viewport_margin_lines: usize,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            image_extensions: ["png", "jpg", "jpeg", "gif"]
                .into_iter()
                .map(SmolStr::new_static)
                .collect(),
            notes_root: PathBuf::new(),
            copy_feedback: Duration::from_secs(3),
            viewport_margin_lines: 0,
        }
    }
}

impl ExtensionConfig {
    pub fn accepts_image(&self, src: &str) -> bool {
        let Some(ext) = Path::new(src).extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.image_extensions
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(ext))
    }

    pub fn resolve(&self, src: &str) -> PathBuf {
        let path = Path::new(src);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.notes_root.join(path)
        }
    }
}
