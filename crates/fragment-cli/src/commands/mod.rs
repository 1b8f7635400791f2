//! Command implementations for the fragment CLI

mod phase;
mod request;
mod undo;

pub use phase::run_phase;
pub use undo::run_undo;
