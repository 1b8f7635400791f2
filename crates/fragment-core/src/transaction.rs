//! Transaction phase and identifier

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Number of leading characters of a transaction id used as the backup key
pub const BACKUP_KEY_LEN: usize = 8;

/// Suffix distinguishing the post-change backup from the pre-change one
pub const ROLLBACK_KEY_SUFFIX: &str = "n";

/// Which half of the check/fix protocol an evaluation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Report what would change; never mutates
    Check,
    /// Perform the change
    Fix,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Check => write!(f, "check"),
            Self::Fix => write!(f, "fix"),
        }
    }
}

impl FromStr for Phase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "check" => Ok(Self::Check),
            "fix" => Ok(Self::Fix),
            other => Err(Error::contract(format!(
                "unknown phase '{other}', expected 'check' or 'fix'"
            ))),
        }
    }
}

/// Opaque per-change token; its prefix namespaces the change's backups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionId(String);

impl TransactionId {
    /// Wrap a caller-supplied id.
    ///
    /// # Errors
    ///
    /// Returns a contract violation for an empty id.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::contract("transaction id cannot be empty"));
        }
        Ok(Self(id))
    }

    /// Generate a fresh id from a random UUID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, or the whole id when shorter.
    pub fn backup_key(&self) -> &str {
        match self.0.char_indices().nth(BACKUP_KEY_LEN) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }

    /// Key under which rollback trashes the rewritten file.
    pub fn rollback_key(&self) -> String {
        format!("{}{}", self.backup_key(), ROLLBACK_KEY_SUFFIX)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TransactionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for TransactionId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<TransactionId> for String {
    fn from(id: TransactionId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("check", Phase::Check)]
    #[case("FIX", Phase::Fix)]
    #[case("Check", Phase::Check)]
    fn phase_parses(#[case] input: &str, #[case] expected: Phase) {
        assert_eq!(input.parse::<Phase>().unwrap(), expected);
    }

    #[test]
    fn unknown_phase_is_contract_violation() {
        let err = "apply".parse::<Phase>().unwrap_err();
        assert!(matches!(err, Error::ContractViolation { .. }));
    }

    #[rstest]
    #[case("1a2b3c4d5e6f", "1a2b3c4d")]
    #[case("abc", "abc")]
    #[case("12345678", "12345678")]
    #[case("ééééééééxx", "éééééééé")]
    fn backup_key_takes_eight_chars(#[case] id: &str, #[case] key: &str) {
        let txn = TransactionId::new(id).unwrap();
        assert_eq!(txn.backup_key(), key);
        assert_eq!(txn.rollback_key(), format!("{key}n"));
    }

    #[test]
    fn empty_transaction_id_is_rejected() {
        assert!(matches!(
            TransactionId::new(""),
            Err(Error::ContractViolation { .. })
        ));
    }

    #[test]
    fn generated_ids_are_distinct() {
        let a = TransactionId::generate();
        let b = TransactionId::generate();
        assert_ne!(a, b);
        assert_eq!(a.backup_key().len(), BACKUP_KEY_LEN);
    }
}
