//! One-shot classification of a target file
//!
//! [`FileSnapshot::capture`] inspects the path without following symlinks and
//! reads the content of regular files. The snapshot is taken once, before any
//! mutation, and is what the rewritten file's metadata is restored from.
//!
//! The window between capture and a later replace is not closed; concurrent
//! external modification of the same path is the caller's problem.

use crate::io::FileAttrs;
use crate::{Error, Result};
use std::fs::{self, File, Metadata};
use std::io::Read;
use std::path::{Path, PathBuf};

/// State of a target path captured before any mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSnapshot {
    /// The inspected path
    pub path: PathBuf,
    /// Whether the path resolves to something (dangling symlinks do not)
    pub exists: bool,
    /// Whether the path itself is a symbolic link
    pub is_symlink: bool,
    /// Whether the path is a plain regular file (never true for symlinks)
    pub is_regular_file: bool,
    /// Permission bits, including setuid/setgid/sticky
    pub mode: u32,
    /// Owning user id
    pub uid: u32,
    /// Owning group id
    pub gid: u32,
    /// Full text content; empty unless the path is a regular file
    pub content: String,
}

impl FileSnapshot {
    /// Classify `path` and, for regular files, read its full content.
    ///
    /// A missing path is not an error: it yields a snapshot with
    /// `exists == false`. Failure to read a regular file (permissions,
    /// invalid UTF-8) is.
    pub fn capture(path: &Path) -> Result<Self> {
        let link_meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::absent(path, false));
            }
            Err(e) => return Err(Error::io(path, e)),
        };

        let file_type = link_meta.file_type();
        if file_type.is_symlink() {
            // Only follow to tell a dangling link from a live one.
            let exists = fs::metadata(path).is_ok();
            let mut snapshot = Self::absent(path, true);
            snapshot.exists = exists;
            return Ok(snapshot);
        }

        let (mode, uid, gid) = ownership_of(&link_meta);
        let mut snapshot = Self {
            path: path.to_path_buf(),
            exists: true,
            is_symlink: false,
            is_regular_file: file_type.is_file(),
            mode,
            uid,
            gid,
            content: String::new(),
        };

        if snapshot.is_regular_file {
            snapshot.content = read_content(path)?;
        }

        Ok(snapshot)
    }

    fn absent(path: &Path, is_symlink: bool) -> Self {
        Self {
            path: path.to_path_buf(),
            exists: false,
            is_symlink,
            is_regular_file: false,
            mode: 0,
            uid: 0,
            gid: 0,
            content: String::new(),
        }
    }

    /// Metadata to stamp back onto a rewritten file.
    pub fn attrs(&self) -> FileAttrs {
        FileAttrs {
            mode: self.mode,
            uid: self.uid,
            gid: self.gid,
        }
    }
}

fn read_content(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::io(path, e))?;
    Ok(content)
}

#[cfg(unix)]
fn ownership_of(meta: &Metadata) -> (u32, u32, u32) {
    use std::os::unix::fs::MetadataExt;
    (meta.mode() & 0o7777, meta.uid(), meta.gid())
}

#[cfg(not(unix))]
fn ownership_of(meta: &Metadata) -> (u32, u32, u32) {
    let mode = if meta.permissions().readonly() { 0o444 } else { 0o644 };
    (mode, 0, 0)
}
