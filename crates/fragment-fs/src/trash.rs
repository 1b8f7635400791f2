//! Trash and untrash: the backup primitives behind undoable rewrites
//!
//! A file is trashed by renaming it to a hidden, key-suffixed sibling:
//!
//! ```text
//! /etc/hosts  --trash(key = "1a2b3c4d")-->  /etc/.hosts.1a2b3c4d.trash
//! ```
//!
//! Staying in the same directory keeps the move a single `rename`, so from
//! the caller's point of view the file is either in place or in the trash.

use crate::io::fsync_parent_dir;
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix appended to every trashed file name
pub const TRASH_SUFFIX: &str = ".trash";

/// Move-aside and restore operations keyed by a short suffix.
///
/// Implementations must make each call atomic from the caller's perspective:
/// after `trash` the file is gone from `path` and recoverable under `key`;
/// after `untrash` it is back at `path`.
pub trait BackupService {
    /// Move `path` aside under `key`, returning the backup location.
    fn trash(&self, path: &Path, key: &str) -> Result<PathBuf>;

    /// Move the backup stored under `key` back to `path`, returning the
    /// location it was restored from.
    fn untrash(&self, path: &Path, key: &str) -> Result<PathBuf>;

    /// Where the backup of `path` under `key` lives.
    fn backup_location(&self, path: &Path, key: &str) -> PathBuf;

    /// Whether a backup of `path` under `key` is available to untrash.
    fn has_backup(&self, path: &Path, key: &str) -> bool {
        fs::symlink_metadata(self.backup_location(path, key)).is_ok()
    }
}

/// Same-directory trash.
#[derive(Debug, Clone, Copy, Default)]
pub struct Trash;

impl Trash {
    /// Create a new Trash.
    pub fn new() -> Self {
        Self
    }

    /// Where `path` lives while trashed under `key`.
    pub fn location(path: &Path, key: &str) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        path.with_file_name(format!(".{}.{}{}", name, key, TRASH_SUFFIX))
    }

    /// Check whether a backup exists for `path` under `key`.
    pub fn has_backup(path: &Path, key: &str) -> bool {
        fs::symlink_metadata(Self::location(path, key)).is_ok()
    }

    fn validate_key(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(Error::InvalidKey {
                key: key.to_string(),
                reason: "key cannot be empty".to_string(),
            });
        }
        if key.contains(['/', '\\']) || key.contains("..") || key.contains('\0') {
            return Err(Error::InvalidKey {
                key: key.to_string(),
                reason: "key must not contain path separators or '..'".to_string(),
            });
        }
        Ok(())
    }
}

impl BackupService for Trash {
    fn trash(&self, path: &Path, key: &str) -> Result<PathBuf> {
        Self::validate_key(key)?;
        match fs::symlink_metadata(path) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NothingToTrash {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(Error::io(path, e)),
        }

        let backup = Self::location(path, key);
        fs::rename(path, &backup).map_err(|e| Error::io(path, e))?;
        if let Err(e) = fsync_parent_dir(path) {
            tracing::debug!(path = %path.display(), error = %e, "parent directory fsync failed");
        }

        tracing::debug!(path = %path.display(), backup = %backup.display(), "trashed");
        Ok(backup)
    }

    fn untrash(&self, path: &Path, key: &str) -> Result<PathBuf> {
        Self::validate_key(key)?;
        let backup = Self::location(path, key);
        match fs::symlink_metadata(&backup) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::BackupMissing {
                    path: path.to_path_buf(),
                    key: key.to_string(),
                    backup,
                });
            }
            Err(e) => return Err(Error::io(&backup, e)),
        }

        fs::rename(&backup, path).map_err(|e| Error::io(path, e))?;
        if let Err(e) = fsync_parent_dir(path) {
            tracing::debug!(path = %path.display(), error = %e, "parent directory fsync failed");
        }

        tracing::debug!(path = %path.display(), backup = %backup.display(), "untrashed");
        Ok(backup)
    }

    fn backup_location(&self, path: &Path, key: &str) -> PathBuf {
        Self::location(path, key)
    }
}
