//! Atomic I/O operations with file locking

use crate::{Error, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Permission and ownership bits to stamp onto a rewritten file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileAttrs {
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
}

/// What happened to the owner/group of a rewritten file.
///
/// Restoring ownership needs privilege the process may not have, so it is
/// reported rather than failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerRestore {
    /// The new file already had the requested owner and group
    Unchanged,
    /// Owner and group were changed back to the requested ids
    Restored,
    /// `chown` was refused; the message carries the OS error
    Failed(String),
}

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename strategy to prevent partial writes.
/// Acquires an advisory lock to prevent concurrent access.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let temp_path = write_temp(path, content)?;
    commit(&temp_path, path)
}

/// Write content atomically, stamping `attrs` onto the new file before it
/// becomes visible at `path`.
///
/// Permission bits are mandatory: failing to apply them aborts the write.
/// Ownership is best-effort and reported through [`OwnerRestore`].
pub fn write_preserving(path: &Path, content: &[u8], attrs: &FileAttrs) -> Result<OwnerRestore> {
    let temp_path = write_temp(path, content)?;

    let owner = restore_owner(&temp_path, attrs);
    if let Err(e) = set_mode(&temp_path, attrs.mode) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    commit(&temp_path, path)?;
    Ok(owner)
}

/// Read text content from a file.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Write text content to a file atomically.
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}

/// Fsync the parent directory of `path` so a rename is durable.
pub fn fsync_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        let dir = File::open(parent)?;
        dir.sync_all()?;
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    // Same directory, so the final rename never crosses filesystems.
    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    path.with_file_name(temp_name)
}

fn write_temp(path: &Path, content: &[u8]) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let temp_path = temp_path_for(path);
    let result = fill_temp(&temp_path, path, content);
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result.map(|()| temp_path)
}

fn fill_temp(temp_path: &Path, path: &Path, content: &[u8]) -> Result<()> {
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)
        .map_err(|e| Error::io(temp_path, e))?;

    temp_file
        .lock_exclusive()
        .map_err(|_| Error::LockFailed {
            path: path.to_path_buf(),
        })?;

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(temp_path, e))?;

    temp_file.sync_all().map_err(|e| Error::io(temp_path, e))?;

    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;

    Ok(())
}

fn commit(temp_path: &Path, path: &Path) -> Result<()> {
    if let Err(e) = fs::rename(temp_path, path) {
        let _ = fs::remove_file(temp_path);
        return Err(Error::io(path, e));
    }
    if let Err(e) = fsync_parent_dir(path) {
        tracing::debug!(path = %path.display(), error = %e, "parent directory fsync failed");
    }
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|e| Error::io(path, e))
}

#[cfg(not(unix))]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    let mut perms = fs::metadata(path)
        .map_err(|e| Error::io(path, e))?
        .permissions();
    perms.set_readonly(mode & 0o222 == 0);
    fs::set_permissions(path, perms).map_err(|e| Error::io(path, e))
}

#[cfg(unix)]
fn restore_owner(path: &Path, attrs: &FileAttrs) -> OwnerRestore {
    use std::os::unix::fs::MetadataExt;

    let current = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) => return OwnerRestore::Failed(e.to_string()),
    };
    if current.uid() == attrs.uid && current.gid() == attrs.gid {
        return OwnerRestore::Unchanged;
    }
    match std::os::unix::fs::chown(path, Some(attrs.uid), Some(attrs.gid)) {
        Ok(()) => OwnerRestore::Restored,
        Err(e) => OwnerRestore::Failed(e.to_string()),
    }
}

#[cfg(not(unix))]
fn restore_owner(_path: &Path, _attrs: &FileAttrs) -> OwnerRestore {
    OwnerRestore::Unchanged
}
