//! Error types for fragment-fs

use std::path::PathBuf;

/// Result type for fragment-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in fragment-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Nothing to trash at {path}")]
    NothingToTrash { path: PathBuf },

    #[error("No backup for {path} under key '{key}' (expected {backup})")]
    BackupMissing {
        path: PathBuf,
        key: String,
        backup: PathBuf,
    },

    #[error("Invalid backup key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Failed to parse {format} config at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Failed to serialize {format} config for {path}: {message}")]
    ConfigSerialize {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported config format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
