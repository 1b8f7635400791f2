//! Fragment parsing and rewriting for Fragment Manager.
//!
//! A fragment is a block of lines delimited by comment markers that carry an
//! id, so it can be found again and kept in sync:
//!
//! ```text
//! # BEGIN fragment motd owner=ops
//! Authorized use only.
//! # END fragment motd
//! ```
//!
//! The comment syntax and the label word are configurable through
//! [`FormatOptions`]; `"<!-- -->"` style comments get a closing delimiter on
//! each marker line.
//!
//! [`MarkerEngine`] is the [`FragmentEngine`] implementation the transaction
//! controller uses by default. The lower-level [`parser`] and [`writer`]
//! functions are exposed for callers that want the raw edits.

pub mod engine;
pub mod error;
pub mod format;
pub mod parser;
pub mod writer;

pub use engine::{FragmentEngine, FragmentOutcome, MarkerEngine};
pub use error::{Error, Result};
pub use format::{CommentStyle, FormatOptions, Markers};
pub use parser::{Fragment, find_fragment};
pub use writer::{Edit, EditKind, Unchanged, delete_fragment, insert_fragment};
