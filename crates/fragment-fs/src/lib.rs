//! Filesystem primitives for Fragment Manager
//!
//! Provides the pieces the fragment transaction needs from the filesystem:
//! a one-shot classification of the target file, metadata-preserving atomic
//! writes, and the trash/untrash backup service that makes a rewrite undoable.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod meta;
pub mod trash;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use io::{FileAttrs, OwnerRestore};
pub use meta::FileSnapshot;
pub use trash::{BackupService, Trash};
