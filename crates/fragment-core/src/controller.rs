//! Fragment transaction controller
//!
//! One call to [`FragmentController::evaluate`] runs one phase of the
//! check/fix protocol against a single file:
//!
//! ```text
//! Start -> Classified{Unfixable | Proceed}
//!       -> EngineEvaluated{NoChange | Error | Changed}
//!       -> Check: Reported | Fix: Mutated | Failed
//! ```
//!
//! Nothing survives between calls. The fix phase re-reads the file and asks
//! the engine again rather than trusting what the check phase saw.

use crate::error::UnfixableReason;
use crate::report::Evaluation;
use crate::request::FragmentRequest;
use crate::transaction::{Phase, TransactionId};
use crate::undo::UndoRecipe;
use crate::{Error, Result};
use fragment_blocks::{FragmentEngine, FragmentOutcome, MarkerEngine};
use fragment_fs::checksum::compute_content_checksum;
use fragment_fs::{BackupService, FileSnapshot, OwnerRestore, Trash, io};
use similar::TextDiff;
use std::path::Path;

/// Lines of context around each hunk of the check-phase diff
const DIFF_CONTEXT: usize = 3;

/// Drives one fragment request through the check or fix phase.
#[derive(Debug, Clone, Default)]
pub struct FragmentController<E = MarkerEngine, B = Trash> {
    engine: E,
    backup: B,
}

impl FragmentController {
    /// Controller with the marker engine and same-directory trash.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: FragmentEngine, B: BackupService> FragmentController<E, B> {
    /// Controller over caller-supplied collaborators.
    pub fn with_parts(engine: E, backup: B) -> Self {
        Self { engine, backup }
    }

    pub fn backup(&self) -> &B {
        &self.backup
    }

    /// Run `phase` for `request`.
    ///
    /// # Errors
    ///
    /// - [`Error::ContractViolation`] for a request missing required fields
    /// - [`Error::Unfixable`] when the target is missing or not a regular file
    /// - [`Error::EngineRejected`] when the engine refuses the request
    /// - [`Error::Backup`] when the fix phase cannot trash the original
    /// - [`Error::UndoRequired`] when the rewrite fails after the original
    ///   was trashed
    /// - [`Error::Fs`] for any other I/O failure, such as unreadable content
    pub fn evaluate(
        &self,
        request: &FragmentRequest,
        phase: Phase,
        txn: &TransactionId,
    ) -> Result<Evaluation> {
        request.validate()?;
        let path = request.path.as_path();
        tracing::debug!(path = %path.display(), id = %request.id, %phase, txn = %txn, "Evaluating fragment");

        let snapshot = classify(path)?;

        let outcome = if request.should_exist {
            self.engine.insert(
                &snapshot.content,
                &request.id,
                &request.payload,
                &request.attrs,
                &request.format,
            )
        } else {
            self.engine
                .delete(&snapshot.content, &request.id, &request.format)
        };

        let checksum_before = compute_content_checksum(&snapshot.content);
        match outcome {
            FragmentOutcome::NoChange { message } => {
                tracing::debug!(path = %path.display(), "Already correct");
                Ok(Evaluation::already_correct(message, checksum_before))
            }
            FragmentOutcome::Error { message } => Err(Error::EngineRejected {
                path: path.to_path_buf(),
                message,
            }),
            FragmentOutcome::Changed { new_text, message } => {
                let undo = UndoRecipe::for_rewrite(path, txn);
                let checksum_after = compute_content_checksum(&new_text);
                match phase {
                    Phase::Check => {
                        let diff = render_diff(path, &snapshot.content, &new_text);
                        Ok(Evaluation::pending(
                            message,
                            undo,
                            diff,
                            checksum_before,
                            checksum_after,
                        ))
                    }
                    Phase::Fix => {
                        let (backup, owner) = self.rewrite(&snapshot, &new_text, txn)?;
                        let mut eval = Evaluation::applied(
                            message,
                            undo,
                            backup,
                            checksum_before,
                            checksum_after,
                        );
                        if let OwnerRestore::Failed(reason) = owner {
                            tracing::warn!(path = %path.display(), %reason, "Could not restore owner");
                            eval = eval.with_warning(format!(
                                "could not restore owner {}:{} on {}: {}",
                                snapshot.uid,
                                snapshot.gid,
                                path.display(),
                                reason
                            ));
                        }
                        Ok(eval)
                    }
                }
            }
        }
    }

    /// Trash the original, then write `new_text` with its metadata.
    fn rewrite(
        &self,
        snapshot: &FileSnapshot,
        new_text: &str,
        txn: &TransactionId,
    ) -> Result<(std::path::PathBuf, OwnerRestore)> {
        let path = snapshot.path.as_path();
        let key = txn.backup_key();

        let backup = self.backup.trash(path, key).map_err(|source| Error::Backup {
            path: path.to_path_buf(),
            source,
        })?;

        let owner = io::write_preserving(path, new_text.as_bytes(), &snapshot.attrs()).map_err(
            |source| {
                tracing::warn!(path = %path.display(), key, "Rewrite failed after backup");
                Error::UndoRequired {
                    path: path.to_path_buf(),
                    key: key.to_string(),
                    source,
                }
            },
        )?;

        tracing::debug!(path = %path.display(), backup = %backup.display(), "Fragment applied");
        Ok((backup, owner))
    }
}

/// Capture `path` and reject anything that is not an existing regular file.
fn classify(path: &Path) -> Result<FileSnapshot> {
    let snapshot = FileSnapshot::capture(path)?;

    let reason = if !snapshot.exists {
        Some(UnfixableReason::NotFound)
    } else if snapshot.is_symlink || !snapshot.is_regular_file {
        Some(UnfixableReason::NotRegularFile)
    } else {
        None
    };

    match reason {
        Some(reason) => Err(Error::Unfixable {
            path: path.to_path_buf(),
            reason,
        }),
        None => Ok(snapshot),
    }
}

fn render_diff(path: &Path, old: &str, new: &str) -> String {
    let name = path.display().to_string();
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(DIFF_CONTEXT)
        .header(&format!("a/{name}"), &format!("b/{name}"))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Status;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn txn() -> TransactionId {
        TransactionId::new("feedface0001").unwrap()
    }

    #[test]
    fn check_reports_pending_with_diff() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hosts");
        fs::write(&path, "127.0.0.1 localhost\n").unwrap();

        let request = FragmentRequest::present(&path, "X", "10.0.0.1 db");
        let eval = FragmentController::new()
            .evaluate(&request, Phase::Check, &txn())
            .unwrap();

        assert_eq!(eval.status, Status::Pending);
        let diff = eval.diff.unwrap();
        assert!(diff.contains("+# BEGIN fragment X"));
        assert!(diff.contains("+10.0.0.1 db"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "127.0.0.1 localhost\n");
    }

    #[test]
    fn fix_records_backup_location() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hosts");
        fs::write(&path, "127.0.0.1 localhost\n").unwrap();

        let request = FragmentRequest::present(&path, "X", "10.0.0.1 db");
        let eval = FragmentController::new()
            .evaluate(&request, Phase::Fix, &txn())
            .unwrap();

        assert_eq!(eval.status, Status::Applied);
        assert_eq!(eval.backup, Some(Trash::location(&path, "feedface")));
        assert_eq!(
            eval.checksum_after,
            Some(compute_content_checksum(&fs::read_to_string(&path).unwrap()))
        );
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let request = FragmentRequest::present(dir.path().join("nope"), "X", "p");

        let err = FragmentController::new()
            .evaluate(&request, Phase::Check, &txn())
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Unfixable {
                reason: UnfixableReason::NotFound,
                ..
            }
        ));
    }

    #[test]
    fn diff_header_names_the_file() {
        let diff = render_diff(Path::new("/etc/motd"), "a\n", "a\nb\n");
        assert!(diff.starts_with("--- a//etc/motd\n+++ b//etc/motd\n"));
    }
}
