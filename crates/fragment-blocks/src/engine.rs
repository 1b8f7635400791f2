//! The fragment engine seam
//!
//! [`FragmentEngine`] is what the transaction controller talks to. It never
//! fails with a Rust error: every problem comes back as
//! [`FragmentOutcome::Error`] so the caller can surface it verbatim.

use crate::format::FormatOptions;
use crate::writer::{Edit, EditKind, Unchanged, delete_fragment, insert_fragment};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tri-state result of a fragment computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FragmentOutcome {
    /// The text is already in the requested state
    NoChange { message: String },
    /// New text was computed
    Changed { new_text: String, message: String },
    /// The request cannot be satisfied without a human
    Error { message: String },
}

impl FragmentOutcome {
    pub fn message(&self) -> &str {
        match self {
            Self::NoChange { message } | Self::Changed { message, .. } | Self::Error { message } => {
                message
            }
        }
    }
}

/// Computes fragment insertions and deletions on file text.
pub trait FragmentEngine {
    /// Ensure fragment `id` carrying `payload` and `attrs` is in `text`.
    fn insert(
        &self,
        text: &str,
        id: &str,
        payload: &str,
        attrs: &BTreeMap<String, String>,
        format: &FormatOptions,
    ) -> FragmentOutcome;

    /// Ensure fragment `id` is not in `text`.
    fn delete(&self, text: &str, id: &str, format: &FormatOptions) -> FragmentOutcome;
}

/// Engine for comment-delimited `BEGIN`/`END` marker fragments.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerEngine;

impl MarkerEngine {
    pub fn new() -> Self {
        Self
    }
}

fn outcome(id: &str, result: crate::Result<Edit>) -> FragmentOutcome {
    match result {
        Ok(Edit::Unchanged(reason)) => FragmentOutcome::NoChange {
            message: match reason {
                Unchanged::Present => format!("fragment '{id}' is already present"),
                Unchanged::Absent => format!("fragment '{id}' is already absent"),
                Unchanged::Satisfied => {
                    format!("fragment '{id}' not needed: good pattern already matches")
                }
            },
        },
        Ok(Edit::Rewritten { text, kind }) => FragmentOutcome::Changed {
            new_text: text,
            message: match kind {
                EditKind::Inserted => format!("insert fragment '{id}'"),
                EditKind::Updated => format!("update fragment '{id}'"),
                EditKind::Replaced => format!("replace matched text with fragment '{id}'"),
                EditKind::Removed => format!("remove fragment '{id}'"),
            },
        },
        Err(e) => {
            tracing::debug!(id, error = %e, "fragment engine rejected request");
            FragmentOutcome::Error {
                message: e.to_string(),
            }
        }
    }
}

impl FragmentEngine for MarkerEngine {
    fn insert(
        &self,
        text: &str,
        id: &str,
        payload: &str,
        attrs: &BTreeMap<String, String>,
        format: &FormatOptions,
    ) -> FragmentOutcome {
        outcome(id, insert_fragment(text, id, payload, attrs, format))
    }

    fn delete(&self, text: &str, id: &str, format: &FormatOptions) -> FragmentOutcome {
        outcome(id, delete_fragment(text, id, format))
    }
}
