//! Error types for fragment-core

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Result type for fragment-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Why a target can never be brought into compliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnfixableReason {
    /// Nothing exists at the path (dangling symlinks included)
    NotFound,
    /// The path is a symlink, directory, or other non-regular file
    NotRegularFile,
}

impl fmt::Display for UnfixableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "file not found"),
            Self::NotRegularFile => write!(f, "not a regular file"),
        }
    }
}

/// Broad failure classes, for callers that branch on the kind of failure
/// rather than its details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Unfixable,
    EngineRejected,
    Io,
    /// The file was moved to the trash but not rewritten; only undo
    /// brings it back
    UndoRequired,
    ContractViolation,
}

/// Errors that can occur in fragment-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Target cannot be managed at all
    #[error("Cannot manage {path}: {reason}")]
    Unfixable {
        path: PathBuf,
        reason: UnfixableReason,
    },

    /// The fragment engine refused the request
    #[error("Fragment engine rejected {path}: {message}")]
    EngineRejected { path: PathBuf, message: String },

    /// Moving the file to the trash failed; nothing was changed
    #[error("Failed to back up {path}")]
    Backup {
        path: PathBuf,
        #[source]
        source: fragment_fs::Error,
    },

    /// The rewrite failed after the original was trashed
    #[error("Rewrite of {path} failed after backup under key '{key}'; undo is required")]
    UndoRequired {
        path: PathBuf,
        key: String,
        #[source]
        source: fragment_fs::Error,
    },

    /// Caller passed something the contract forbids
    #[error("Contract violation: {message}")]
    ContractViolation { message: String },

    /// Filesystem error from fragment-fs
    #[error(transparent)]
    Fs(#[from] fragment_fs::Error),
}

impl Error {
    pub fn contract(message: impl Into<String>) -> Self {
        Self::ContractViolation {
            message: message.into(),
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Self::Unfixable { .. } => Category::Unfixable,
            Self::EngineRejected { .. } => Category::EngineRejected,
            Self::Backup { .. } | Self::Fs(_) => Category::Io,
            Self::UndoRequired { .. } => Category::UndoRequired,
            Self::ContractViolation { .. } => Category::ContractViolation,
        }
    }
}
