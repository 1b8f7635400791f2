//! Error types for fragment-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from fragment-core
    #[error(transparent)]
    Core(#[from] fragment_core::Error),

    /// Error from fragment-fs
    #[error(transparent)]
    Fs(#[from] fragment_fs::Error),

    /// JSON rendering error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }

    /// Follow-up advice printed under the error, if any.
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Core(fragment_core::Error::UndoRequired { key, .. }) => Some(format!(
                "the original file is in the trash under key '{key}'; run `fragment undo` with the recipe from `check`"
            )),
            _ => None,
        }
    }
}
