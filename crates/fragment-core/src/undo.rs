//! Undo recipes
//!
//! A recipe is data, not a closure: the check phase returns it so the outer
//! engine can persist it before the fix runs. For a fragment rewrite under
//! backup key `k` the recipe is:
//!
//! ```text
//! 1. untrash <path> k     restore the pre-change file
//! 2. trash   <path> kn    move the post-change file out of the way
//! ```
//!
//! [`UndoRecipe::rollback`] executes the steps as a stack, last declared
//! first, so the rewritten file is moved aside before the original is put
//! back in its place.

use crate::transaction::TransactionId;
use fragment_fs::BackupService;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndoAction {
    Untrash,
    Trash,
}

impl fmt::Display for UndoAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Untrash => write!(f, "untrash"),
            Self::Trash => write!(f, "trash"),
        }
    }
}

/// One named restore step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoStep {
    pub action: UndoAction,
    pub path: PathBuf,
    pub key: String,
}

impl UndoStep {
    pub fn untrash(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            action: UndoAction::Untrash,
            path: path.into(),
            key: key.into(),
        }
    }

    pub fn trash(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            action: UndoAction::Trash,
            path: path.into(),
            key: key.into(),
        }
    }

    /// The step that cancels this one.
    pub fn inverse(&self) -> Self {
        let action = match self.action {
            UndoAction::Untrash => UndoAction::Trash,
            UndoAction::Trash => UndoAction::Untrash,
        };
        Self {
            action,
            path: self.path.clone(),
            key: self.key.clone(),
        }
    }

    /// Run this step against `backup`.
    pub fn apply(&self, backup: &dyn BackupService) -> fragment_fs::Result<PathBuf> {
        tracing::debug!(action = %self.action, path = %self.path.display(), key = %self.key, "Applying undo step");
        match self.action {
            UndoAction::Untrash => backup.untrash(&self.path, &self.key),
            UndoAction::Trash => backup.trash(&self.path, &self.key),
        }
    }
}

impl fmt::Display for UndoStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.action, self.path.display(), self.key)
    }
}

/// Ordered restore steps for one change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoRecipe {
    pub steps: Vec<UndoStep>,
}

impl UndoRecipe {
    pub fn new(steps: Vec<UndoStep>) -> Self {
        Self { steps }
    }

    /// The two-step recipe that reverses a trash-and-rewrite of `path`.
    pub fn for_rewrite(path: &Path, txn: &TransactionId) -> Self {
        Self::new(vec![
            UndoStep::untrash(path, txn.backup_key()),
            UndoStep::trash(path, txn.rollback_key()),
        ])
    }

    pub fn steps(&self) -> &[UndoStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Replay the recipe, last declared step first.
    ///
    /// Every backup the recipe restores from must exist before any step
    /// runs. If a step still fails, the steps already applied are reversed
    /// so the target is left as it was found.
    pub fn rollback(&self, backup: &dyn BackupService) -> fragment_fs::Result<()> {
        for step in self.steps.iter().filter(|s| s.action == UndoAction::Untrash) {
            if !backup.has_backup(&step.path, &step.key) {
                return Err(fragment_fs::Error::BackupMissing {
                    path: step.path.clone(),
                    key: step.key.clone(),
                    backup: backup.backup_location(&step.path, &step.key),
                });
            }
        }

        let mut applied: Vec<&UndoStep> = Vec::with_capacity(self.steps.len());
        for step in self.steps.iter().rev() {
            if let Err(e) = step.apply(backup) {
                for done in applied.iter().rev() {
                    if let Err(revert) = done.inverse().apply(backup) {
                        tracing::warn!(step = %done, error = %revert, "Could not revert undo step");
                    }
                }
                return Err(e);
            }
            applied.push(step);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fragment_fs::Trash;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<String>>,
        fail_untrash: Option<&'static str>,
    }

    impl BackupService for Recorder {
        fn trash(&self, path: &Path, key: &str) -> fragment_fs::Result<PathBuf> {
            self.calls.borrow_mut().push(format!("trash {key}"));
            Ok(path.to_path_buf())
        }

        fn untrash(&self, path: &Path, key: &str) -> fragment_fs::Result<PathBuf> {
            self.calls.borrow_mut().push(format!("untrash {key}"));
            if self.fail_untrash == Some(key) {
                return Err(fragment_fs::Error::BackupMissing {
                    path: path.to_path_buf(),
                    key: key.to_string(),
                    backup: path.to_path_buf(),
                });
            }
            Ok(path.to_path_buf())
        }

        fn backup_location(&self, path: &Path, _key: &str) -> PathBuf {
            path.to_path_buf()
        }

        fn has_backup(&self, _path: &Path, _key: &str) -> bool {
            true
        }
    }

    #[test]
    fn rewrite_recipe_declares_untrash_then_trash() {
        let txn = TransactionId::new("1a2b3c4d5e6f").unwrap();
        let recipe = UndoRecipe::for_rewrite(Path::new("/etc/hosts"), &txn);

        assert_eq!(
            recipe.steps(),
            &[
                UndoStep::untrash("/etc/hosts", "1a2b3c4d"),
                UndoStep::trash("/etc/hosts", "1a2b3c4dn"),
            ]
        );
    }

    #[test]
    fn rollback_runs_last_step_first() {
        let txn = TransactionId::new("abcdefgh").unwrap();
        let recipe = UndoRecipe::for_rewrite(Path::new("/tmp/f"), &txn);
        let recorder = Recorder::default();

        recipe.rollback(&recorder).unwrap();

        assert_eq!(
            *recorder.calls.borrow(),
            vec!["trash abcdefghn".to_string(), "untrash abcdefgh".to_string()]
        );
    }

    #[test]
    fn failed_step_reverts_earlier_steps() {
        let txn = TransactionId::new("abcdefgh").unwrap();
        let recipe = UndoRecipe::for_rewrite(Path::new("/tmp/f"), &txn);
        let recorder = Recorder {
            fail_untrash: Some("abcdefgh"),
            ..Recorder::default()
        };

        assert!(recipe.rollback(&recorder).is_err());

        assert_eq!(
            *recorder.calls.borrow(),
            vec![
                "trash abcdefghn".to_string(),
                "untrash abcdefgh".to_string(),
                "untrash abcdefghn".to_string()
            ]
        );
    }

    #[test]
    fn missing_backup_leaves_current_file_in_place() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hosts");
        fs::write(&path, "rewritten\n").unwrap();

        let txn = TransactionId::new("aaaaaaaa").unwrap();
        let err = UndoRecipe::for_rewrite(&path, &txn)
            .rollback(&Trash)
            .unwrap_err();

        assert!(matches!(err, fragment_fs::Error::BackupMissing { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "rewritten\n");
        assert!(!Trash::has_backup(&path, &txn.rollback_key()));
    }

    #[test]
    fn rollback_restores_trashed_original() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config");
        fs::write(&path, "before\n").unwrap();

        let txn = TransactionId::new("00000000").unwrap();
        Trash.trash(&path, txn.backup_key()).unwrap();
        fs::write(&path, "after\n").unwrap();

        UndoRecipe::for_rewrite(&path, &txn).rollback(&Trash).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "before\n");
        assert!(Trash::has_backup(&path, &txn.rollback_key()));
        assert!(!Trash::has_backup(&path, txn.backup_key()));
    }

    #[test]
    fn recipe_serializes_as_plain_data() {
        let txn = TransactionId::new("deadbeef").unwrap();
        let recipe = UndoRecipe::for_rewrite(Path::new("/srv/app.conf"), &txn);
        let json = serde_json::to_value(&recipe).unwrap();

        assert_eq!(json["steps"][0]["action"], "untrash");
        assert_eq!(json["steps"][1]["key"], "deadbeefn");

        let back: UndoRecipe = serde_json::from_value(json).unwrap();
        assert_eq!(back, recipe);
    }
}
