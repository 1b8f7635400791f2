//! Evaluation results returned to the caller

use crate::undo::UndoRecipe;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Where the target stands after an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// The file already satisfies the request; nothing was or would be done
    AlreadyCorrect,
    /// Check phase found work to do
    Pending,
    /// Fix phase rewrote the file
    Applied,
}

impl Status {
    /// Whether the evaluation found (or made) a change.
    pub fn is_change(self) -> bool {
        !matches!(self, Self::AlreadyCorrect)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyCorrect => write!(f, "already correct"),
            Self::Pending => write!(f, "pending"),
            Self::Applied => write!(f, "applied"),
        }
    }
}

/// Structured result of one controller evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub status: Status,
    /// Engine message, passed through verbatim
    pub message: String,
    /// Steps that reverse the change, set whenever a change is pending or applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub undo: Option<UndoRecipe>,
    /// Unified diff preview (check phase only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
    pub checksum_before: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum_after: Option<String>,
    /// Where the pre-change file was trashed (fix phase only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
    /// Soft failures that did not stop the evaluation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Evaluation {
    /// Result for a file that needs no change.
    pub fn already_correct(message: impl Into<String>, checksum: String) -> Self {
        Self {
            status: Status::AlreadyCorrect,
            message: message.into(),
            undo: None,
            diff: None,
            checksum_before: checksum,
            checksum_after: None,
            backup: None,
            warnings: Vec::new(),
        }
    }

    /// Result for a change found in check phase.
    pub fn pending(
        message: impl Into<String>,
        undo: UndoRecipe,
        diff: String,
        checksum_before: String,
        checksum_after: String,
    ) -> Self {
        Self {
            status: Status::Pending,
            message: message.into(),
            undo: Some(undo),
            diff: Some(diff),
            checksum_before,
            checksum_after: Some(checksum_after),
            backup: None,
            warnings: Vec::new(),
        }
    }

    /// Result for a change made in fix phase.
    pub fn applied(
        message: impl Into<String>,
        undo: UndoRecipe,
        backup: PathBuf,
        checksum_before: String,
        checksum_after: String,
    ) -> Self {
        Self {
            status: Status::Applied,
            message: message.into(),
            undo: Some(undo),
            diff: None,
            checksum_before,
            checksum_after: Some(checksum_after),
            backup: Some(backup),
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}
