use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Note storage errors
#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum StoreError {
    #[error("failed to read note {}", path.display())]
    #[diagnostic(code(store::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write note {}", path.display())]
    #[diagnostic(code(store::write))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            StoreError::Read { path, .. } | StoreError::Write { path, .. } => path,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config file {}", path.display())]
    #[diagnostic(code(config::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}", path.display())]
    #[diagnostic(
        code(config::parse),
        help("the config file is JSON; unknown keys are rejected")
    )]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
