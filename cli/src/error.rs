use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop a scaffold run.
///
/// Validation is the only class a user can recover from (by answering the
/// prompt again). The rest abort the whole run.
#[derive(Debug, Error)]
pub enum KitError {
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Download failed: {0}")]
    Network(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Archive entry '{0}' points outside the installation folder")]
    PathTraversal(String),

    #[error("Could not write {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Installer error: {0}")]
    Installer(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl KitError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}

pub type KitResult<T> = std::result::Result<T, KitError>;
