//! Formatting options and marker rendering

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default comment leader for fragment markers
pub const DEFAULT_COMMENT_STYLE: &str = "#";

/// Default label written between the keyword and the id
pub const DEFAULT_LABEL: &str = "fragment";

/// How a fragment is written and matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    /// Place new fragments at the top of the file instead of the bottom
    pub top_style: bool,
    /// Comment syntax for marker lines, e.g. `#`, `//`, or `<!-- -->`
    pub comment_style: String,
    /// Word identifying the owner of the fragment in its markers
    pub label: String,
    /// Regex for unmanaged text the fragment should take the place of
    pub replace_pattern: Option<String>,
    /// Regex that, when it already matches, means nothing needs inserting
    pub good_pattern: Option<String>,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            top_style: false,
            comment_style: DEFAULT_COMMENT_STYLE.to_string(),
            label: DEFAULT_LABEL.to_string(),
            replace_pattern: None,
            good_pattern: None,
        }
    }
}

/// Comment delimiters parsed from a style string.
///
/// A style with whitespace splits into an opening and closing delimiter, so
/// `"<!-- -->"` yields `<!--` and `-->` while `"#"` has no closing part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentStyle {
    pub open: String,
    pub close: Option<String>,
}

impl CommentStyle {
    pub fn parse(style: &str) -> Result<Self> {
        let mut parts = style.split_whitespace();
        let open = parts.next().ok_or_else(|| Error::InvalidCommentStyle {
            style: style.to_string(),
        })?;
        let rest: Vec<&str> = parts.collect();
        let close = if rest.is_empty() {
            None
        } else {
            Some(rest.join(" "))
        };
        Ok(Self {
            open: open.to_string(),
            close,
        })
    }

    fn wrap(&self, body: &str) -> String {
        match &self.close {
            Some(close) => format!("{} {} {}", self.open, body, close),
            None => format!("{} {}", self.open, body),
        }
    }
}

/// Resolved markers for one fragment id.
#[derive(Debug, Clone)]
pub struct Markers {
    pub style: CommentStyle,
    pub label: String,
    pub id: String,
}

impl Markers {
    /// Validate the id and options and build the markers for `id`.
    pub fn new(id: &str, format: &FormatOptions) -> Result<Self> {
        validate_id(id)?;
        if format.label.is_empty() || format.label.contains(char::is_whitespace) {
            return Err(Error::InvalidLabel {
                label: format.label.clone(),
            });
        }
        Ok(Self {
            style: CommentStyle::parse(&format.comment_style)?,
            label: format.label.clone(),
            id: id.to_string(),
        })
    }

    /// `BEGIN <label> <id>` without comment delimiters or attributes.
    pub fn begin_head(&self) -> String {
        format!("BEGIN {} {}", self.label, self.id)
    }

    /// The full begin line, attributes sorted by key.
    pub fn begin_line(&self, attrs: &BTreeMap<String, String>) -> String {
        let mut head = self.begin_head();
        for (key, value) in attrs {
            head.push(' ');
            head.push_str(&render_attr(key, value));
        }
        self.style.wrap(&head)
    }

    pub fn end_line(&self) -> String {
        self.style.wrap(&format!("END {} {}", self.label, self.id))
    }

    /// Whether a trimmed line is a begin marker for this id in this style.
    pub fn is_begin(&self, line: &str) -> bool {
        let prefix = format!("{} {}", self.style.open, self.begin_head());
        let Some(rest) = line.strip_prefix(&prefix) else {
            return false;
        };
        let rest_ok = rest.is_empty() || rest.starts_with(char::is_whitespace);
        let close_ok = match &self.style.close {
            Some(close) => line.ends_with(close.as_str()),
            None => true,
        };
        rest_ok && close_ok
    }

    pub fn is_end(&self, line: &str) -> bool {
        line == self.end_line()
    }

    /// Render the complete fragment, newline-terminated.
    pub fn render(&self, payload: &str, attrs: &BTreeMap<String, String>) -> String {
        let mut block = self.begin_line(attrs);
        block.push('\n');
        block.push_str(payload);
        if !payload.is_empty() && !payload.ends_with('\n') {
            block.push('\n');
        }
        block.push_str(&self.end_line());
        block.push('\n');
        block
    }
}

fn render_attr(key: &str, value: &str) -> String {
    if value.is_empty() || value.contains(char::is_whitespace) || value.contains('"') {
        format!("{}={:?}", key, value)
    } else {
        format!("{}={}", key, value)
    }
}

/// Fragment ids are single words: they appear verbatim in marker lines.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::InvalidId {
            id: id.to_string(),
            reason: "id cannot be empty".to_string(),
        });
    }
    if id.contains(char::is_whitespace) {
        return Err(Error::InvalidId {
            id: id.to_string(),
            reason: "id cannot contain whitespace".to_string(),
        });
    }
    Ok(())
}
