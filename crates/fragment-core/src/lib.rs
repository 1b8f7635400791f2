//! Fragment transaction controller
//!
//! Ensures a delimited fragment is present in, or absent from, a file using a
//! two-phase protocol:
//!
//! - **check** classifies the file, asks the [`FragmentEngine`] what would
//!   change, and returns a diff preview plus the [`UndoRecipe`] that reverses
//!   it, without touching the filesystem;
//! - **fix** does the same classification, trashes the original under the
//!   transaction's backup key and writes the new text with the original
//!   permissions.
//!
//! ```no_run
//! use fragment_core::{FragmentController, FragmentRequest, Phase, TransactionId};
//!
//! let controller = FragmentController::new();
//! let request = FragmentRequest::present("/etc/hosts", "db", "10.0.0.5 db.internal");
//! let txn = TransactionId::generate();
//!
//! let check = controller.evaluate(&request, Phase::Check, &txn)?;
//! if check.status.is_change() {
//!     controller.evaluate(&request, Phase::Fix, &txn)?;
//! }
//! # Ok::<(), fragment_core::Error>(())
//! ```
//!
//! [`FragmentEngine`]: fragment_blocks::FragmentEngine

pub mod controller;
pub mod error;
pub mod report;
pub mod request;
pub mod transaction;
pub mod undo;

pub use controller::FragmentController;
pub use error::{Category, Error, Result, UnfixableReason};
pub use report::{Evaluation, Status};
pub use request::FragmentRequest;
pub use transaction::{Phase, TransactionId};
pub use undo::{UndoAction, UndoRecipe, UndoStep};

pub use fragment_blocks::{FormatOptions, FragmentEngine, FragmentOutcome, MarkerEngine};
pub use fragment_fs::{BackupService, Trash};
