//! The unit of work: one fragment in one file

use crate::{Error, Result};
use fragment_blocks::FormatOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

fn default_should_exist() -> bool {
    true
}

/// Ensure fragment `id` with `payload` is present in (or absent from) `path`.
///
/// `format` is never inspected by the controller; it is handed to the
/// fragment engine as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentRequest {
    pub path: PathBuf,
    pub id: String,
    pub payload: String,
    #[serde(default = "default_should_exist")]
    pub should_exist: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub format: FormatOptions,
}

impl FragmentRequest {
    /// Request that `id` with `payload` be present in `path`.
    pub fn present(path: impl Into<PathBuf>, id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            id: id.into(),
            payload: payload.into(),
            should_exist: true,
            attrs: BTreeMap::new(),
            format: FormatOptions::default(),
        }
    }

    /// Request that `id` be removed from `path`.
    ///
    /// The payload is still part of the request contract even though a
    /// delete never looks at it.
    pub fn absent(path: impl Into<PathBuf>, id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            should_exist: false,
            ..Self::present(path, id, payload)
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn with_format(mut self, format: FormatOptions) -> Self {
        self.format = format;
        self
    }

    /// Check the required fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContractViolation`] when `path`, `id` or `payload`
    /// is empty.
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(Error::contract("path is required"));
        }
        if self.id.is_empty() {
            return Err(Error::contract("fragment id is required"));
        }
        if self.payload.is_empty() {
            return Err(Error::contract("payload is required"));
        }
        Ok(())
    }
}
