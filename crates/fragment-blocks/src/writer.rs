//! Fragment insertion and removal
//!
//! Pure text-to-text computations. Nothing here touches the filesystem; the
//! caller decides what to do with the rewritten text.

use crate::error::{Error, Result};
use crate::format::{FormatOptions, Markers};
use crate::parser::{find_fragment, lines_with_offsets};
use regex::Regex;
use std::collections::BTreeMap;
use std::ops::Range;

/// Why a computation produced no new text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unchanged {
    /// The fragment is already present with the requested content
    Present,
    /// The fragment is already absent
    Absent,
    /// The good pattern already matches, so the fragment is not needed
    Satisfied,
}

/// Kind of rewrite performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    /// A new fragment was added at the top or bottom
    Inserted,
    /// An existing fragment got new content or attributes
    Updated,
    /// Text matching the replace pattern was swapped for the fragment
    Replaced,
    /// The fragment was removed
    Removed,
}

/// Result of an insert or delete computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Unchanged(Unchanged),
    Rewritten { text: String, kind: EditKind },
}

fn compile(pattern: Option<&str>) -> Result<Option<Regex>> {
    pattern
        .map(|p| {
            Regex::new(p).map_err(|source| Error::InvalidPattern {
                pattern: p.to_string(),
                source,
            })
        })
        .transpose()
}

/// Ensure the fragment `id` is present in `text` with `payload` and `attrs`.
///
/// # Example
/// ```
/// use fragment_blocks::writer::{insert_fragment, Edit, EditKind};
/// use fragment_blocks::FormatOptions;
/// use std::collections::BTreeMap;
///
/// let edit = insert_fragment("a\n", "X", "hello", &BTreeMap::new(), &FormatOptions::default())
///     .unwrap();
/// assert_eq!(
///     edit,
///     Edit::Rewritten {
///         text: "a\n# BEGIN fragment X\nhello\n# END fragment X\n".to_string(),
///         kind: EditKind::Inserted,
///     }
/// );
/// ```
pub fn insert_fragment(
    text: &str,
    id: &str,
    payload: &str,
    attrs: &BTreeMap<String, String>,
    format: &FormatOptions,
) -> Result<Edit> {
    let markers = Markers::new(id, format)?;
    let replace = compile(format.replace_pattern.as_deref())?;
    let good = compile(format.good_pattern.as_deref())?;

    let block = markers.render(payload, attrs);
    if payload
        .lines()
        .any(|line| markers.is_begin(line.trim()) || markers.is_end(line.trim()))
    {
        return Err(Error::PayloadContainsMarker { id: id.to_string() });
    }

    if let Some(fragment) = find_fragment(text, &markers)? {
        let existing = &text[fragment.span.clone()];
        let at_eof_without_newline = fragment.span.end == text.len() && !existing.ends_with('\n');
        if existing == block || (at_eof_without_newline && format!("{existing}\n") == block) {
            return Ok(Edit::Unchanged(Unchanged::Present));
        }
        return Ok(Edit::Rewritten {
            text: splice(text, fragment.span, &block),
            kind: EditKind::Updated,
        });
    }

    if good.is_some_and(|re| re.is_match(text)) {
        return Ok(Edit::Unchanged(Unchanged::Satisfied));
    }

    if let Some(span) = replace.and_then(|re| matched_lines(text, &re)) {
        return Ok(Edit::Rewritten {
            text: splice(text, span, &block),
            kind: EditKind::Replaced,
        });
    }

    let new_text = if format.top_style {
        let position = after_shebang(text);
        let mut result = String::with_capacity(text.len() + block.len() + 1);
        result.push_str(&text[..position]);
        if position > 0 && !result.ends_with('\n') {
            result.push('\n');
        }
        result.push_str(&block);
        result.push_str(&text[position..]);
        result
    } else {
        let mut result = String::with_capacity(text.len() + block.len() + 1);
        result.push_str(text);
        if !result.is_empty() && !result.ends_with('\n') {
            result.push('\n');
        }
        result.push_str(&block);
        result
    };

    Ok(Edit::Rewritten {
        text: new_text,
        kind: EditKind::Inserted,
    })
}

/// Ensure the fragment `id` is absent from `text`.
///
/// Only the marked fragment is removed; the replace and good patterns are
/// not consulted.
pub fn delete_fragment(text: &str, id: &str, format: &FormatOptions) -> Result<Edit> {
    let markers = Markers::new(id, format)?;
    match find_fragment(text, &markers)? {
        Some(fragment) => Ok(Edit::Rewritten {
            text: splice(text, fragment.span, ""),
            kind: EditKind::Removed,
        }),
        None => Ok(Edit::Unchanged(Unchanged::Absent)),
    }
}

fn splice(text: &str, span: Range<usize>, replacement: &str) -> String {
    let mut result = String::with_capacity(text.len() - span.len() + replacement.len());
    result.push_str(&text[..span.start]);
    result.push_str(replacement);
    result.push_str(&text[span.end..]);
    result
}

/// Byte range of the whole lines covered by the first non-empty match.
fn matched_lines(text: &str, re: &Regex) -> Option<Range<usize>> {
    let m = re.find_iter(text).find(|m| !m.as_str().is_empty())?;
    let mut start = None;
    let mut end = text.len();
    for (offset, line) in lines_with_offsets(text) {
        let line_end = offset + line.len();
        if start.is_none() && m.start() < line_end {
            start = Some(offset);
        }
        if m.end() <= line_end {
            end = line_end;
            break;
        }
    }
    start.map(|start| start..end)
}

/// Offset just past a leading `#!` line, or 0.
fn after_shebang(text: &str) -> usize {
    if !text.starts_with("#!") {
        return 0;
    }
    text.find('\n').map_or(text.len(), |pos| pos + 1)
}
