//! Fragment location
//!
//! Finds the fragment for one id in file text:
//! ```text
//! # BEGIN fragment motd owner=ops
//! payload lines
//! # END fragment motd
//! ```
//!
//! Marker lines are compared after trimming surrounding whitespace. A line
//! that opens with a comment leader followed by `BEGIN <label> <id>` but does
//! not match the requested comment style and label is reported, never
//! silently skipped. `BEGIN` elsewhere on a line is ordinary text.

use crate::error::{Error, Result};
use crate::format::Markers;
use regex::Regex;
use std::ops::Range;

/// A located fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Byte range of the whole fragment, markers and end-line newline included
    pub span: Range<usize>,
    /// 1-based line of the begin marker
    pub start_line: usize,
    /// 1-based line of the end marker
    pub end_line: usize,
}

/// Iterate lines with their starting byte offsets, newlines kept.
pub(crate) fn lines_with_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split_inclusive('\n').scan(0, |offset, line| {
        let start = *offset;
        *offset += line.len();
        Some((start, line))
    })
}

/// Begin markers for the id under any punctuation leader or label, with or
/// without a space after the leader.
fn foreign_begin_regex(markers: &Markers) -> Result<Regex> {
    let pattern = format!(
        r"^(?:[^\w\s]+|{})\s*BEGIN\s+(?:\S+\s+)?{}(?:\s|$)",
        regex::escape(&markers.style.open),
        regex::escape(&markers.id)
    );
    Regex::new(&pattern).map_err(|source| Error::InvalidPattern { pattern, source })
}

/// Find the fragment for `markers.id` in `text`.
///
/// Returns `Ok(None)` when the id does not appear at all.
///
/// # Errors
///
/// - [`Error::Unterminated`] when a begin marker has no end marker
/// - [`Error::StrayEnd`] for an end marker without a begin marker
/// - [`Error::Duplicate`] when the fragment appears twice
/// - [`Error::ForeignFormat`] when the id is marked up in another style
pub fn find_fragment(text: &str, markers: &Markers) -> Result<Option<Fragment>> {
    let foreign = foreign_begin_regex(markers)?;
    let mut found: Option<Fragment> = None;
    // (span start, line number) of a begin marker awaiting its end
    let mut open: Option<(usize, usize)> = None;

    for (index, (offset, line)) in lines_with_offsets(text).enumerate() {
        let line_no = index + 1;
        let trimmed = line.trim();

        if let Some((start, start_line)) = open {
            if markers.is_end(trimmed) {
                let fragment = Fragment {
                    span: start..offset + line.len(),
                    start_line,
                    end_line: line_no,
                };
                if let Some(first) = &found {
                    return Err(Error::Duplicate {
                        id: markers.id.clone(),
                        first: first.start_line,
                        second: start_line,
                    });
                }
                found = Some(fragment);
                open = None;
            } else if markers.is_begin(trimmed) {
                return Err(Error::Unterminated {
                    id: markers.id.clone(),
                    line: start_line,
                });
            }
            continue;
        }

        if markers.is_begin(trimmed) {
            open = Some((offset, line_no));
        } else if markers.is_end(trimmed) {
            return Err(Error::StrayEnd {
                id: markers.id.clone(),
                line: line_no,
            });
        } else if foreign.is_match(trimmed) {
            return Err(Error::ForeignFormat {
                id: markers.id.clone(),
                line: line_no,
                found: trimmed.to_string(),
            });
        }
    }

    if let Some((_, line)) = open {
        return Err(Error::Unterminated {
            id: markers.id.clone(),
            line,
        });
    }

    Ok(found)
}
