//! Editor settings on disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use scrivo_editor_core::{ExtensionConfig, SmolStr};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Quiet period before an edited note is written back.
    pub autosave_debounce_ms: u64,
    pub image_extensions: Vec<String>,
    /// Directory relative image paths resolve against.
    pub notes_root: PathBuf,
    pub copy_feedback_ms: u64,
    pub viewport_margin_lines: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            autosave_debounce_ms: 2000,
            image_extensions: ["png", "jpg", "jpeg", "gif"].map(String::from).to_vec(),
            notes_root: PathBuf::new(),
            copy_feedback_ms: 3000,
            viewport_margin_lines: 0,
        }
    }
}

impl EditorConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(
                    target: "scrivo::config",
                    path = %path.display(),
                    "no config file, using defaults"
                );
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::parse(path, &raw)
    }

    fn parse(path: &Path, raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    /// The part of the settings the decoration engine reads.
    pub fn extension_config(&self) -> ExtensionConfig {
        ExtensionConfig {
            image_extensions: self
                .image_extensions
                .iter()
                .map(|ext| SmolStr::new(ext.trim_start_matches('.').to_ascii_lowercase()))
                .collect(),
            notes_root: self.notes_root.clone(),
            copy_feedback: Duration::from_millis(self.copy_feedback_ms),
            viewport_margin_lines: self.viewport_margin_lines,
        }
    }
}

impl From<&EditorConfig> for ExtensionConfig {
    fn from(config: &EditorConfig) -> Self {
        config.extension_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EditorConfig::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.autosave_debounce(), Duration::from_secs(2));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("editor.json");
        std::fs::write(
            &path,
            r#"{ "notes_root": "/notes", "image_extensions": [".PNG", "webp"] }"#,
        )
        .unwrap();

        let config = EditorConfig::load(&path).unwrap();
        assert_eq!(config.notes_root, PathBuf::from("/notes"));
        assert_eq!(config.copy_feedback_ms, 3000);

        let ext = ExtensionConfig::from(&config);
        assert_eq!(ext.image_extensions, vec![SmolStr::new("png"), SmolStr::new("webp")]);
        assert!(ext.accepts_image("a.WEBP"));
        assert!(!ext.accepts_image("a.gif"));
        assert_eq!(ext.copy_feedback, Duration::from_secs(3));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("editor.json");
        std::fs::write(&path, "{ autosave").unwrap();
        let err = EditorConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("editor.json"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = EditorConfig::parse(Path::new("x.json"), r#"{ "theme": "dark" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn defaults_match_extension_defaults() {
        assert_eq!(
            EditorConfig::default().extension_config(),
            ExtensionConfig::default()
        );
    }
}
