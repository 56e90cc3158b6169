//! Marker-delimited segment replacement.
//!
//! Embeds generated content in a larger hand-written document:
//!
//! ```text
//! # Project README
//! ...
//! <!-- OPENSSF-SCORECARD-MONITOR:START -->
//! generated report
//! <!-- OPENSSF-SCORECARD-MONITOR:END -->
//! ...
//! ```

use crate::error::{AppError, Result};

/// Replace the segment between `start` and `end` in `original`.
///
/// - Both markers present (once each, start first): the segment including
///   the markers becomes `start + replacement + end`.
/// - Neither present: a new marked block is appended to `original` as is.
/// - Anything else is an error and `original` is left alone.
pub fn splice_segment(original: &str, replacement: &str, start: &str, end: &str) -> Result<String> {
    if start.is_empty() || end.is_empty() {
        return Err(AppError::splice("start and end markers must not be empty"));
    }

    let start_count = original.matches(start).count();
    let end_count = original.matches(end).count();

    match (start_count, end_count) {
        (0, 0) => {
            let mut document = String::with_capacity(
                original.len() + start.len() + replacement.len() + end.len(),
            );
            document.push_str(original);
            document.push_str(start);
            document.push_str(replacement);
            document.push_str(end);
            Ok(document)
        }
        (1, 1) => {
            let start_at = original.find(start).unwrap_or_default();
            let end_at = original.find(end).unwrap_or_default();
            if end_at < start_at + start.len() {
                return Err(AppError::splice(format!(
                    "end marker '{end}' appears before start marker '{start}'"
                )));
            }

            let mut document = String::with_capacity(original.len() + replacement.len());
            document.push_str(&original[..start_at]);
            document.push_str(start);
            document.push_str(replacement);
            document.push_str(end);
            document.push_str(&original[end_at + end.len()..]);
            Ok(document)
        }
        (1, 0) => Err(AppError::splice(format!(
            "start marker '{start}' found without end marker '{end}'"
        ))),
        (0, 1) => Err(AppError::splice(format!(
            "end marker '{end}' found without start marker '{start}'"
        ))),
        (starts, ends) => Err(AppError::splice(format!(
            "expected one marker pair, found {starts} start and {ends} end markers"
        ))),
    }
}
