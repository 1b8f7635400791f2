//! Error types for fragment-blocks

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid fragment id '{id}': {reason}")]
    InvalidId { id: String, reason: String },

    #[error("Invalid label '{label}': labels must be a single non-empty word")]
    InvalidLabel { label: String },

    #[error("Invalid comment style '{style}'")]
    InvalidCommentStyle { style: String },

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Fragment '{id}' opened on line {line} is never closed")]
    Unterminated { id: String, line: usize },

    #[error("Fragment '{id}' end marker on line {line} has no matching begin marker")]
    StrayEnd { id: String, line: usize },

    #[error("Fragment '{id}' appears more than once (lines {first} and {second})")]
    Duplicate {
        id: String,
        first: usize,
        second: usize,
    },

    #[error("Fragment '{id}' exists on line {line} with different formatting: {found}")]
    ForeignFormat {
        id: String,
        line: usize,
        found: String,
    },

    #[error("Payload for fragment '{id}' contains its own markers")]
    PayloadContainsMarker { id: String },
}
