//! Utility functions and helpers.

pub mod console;
pub mod http;

use url::Url;

use crate::error::{AppError, Result};

/// Append percent-encoded path segments to a base URL.
///
/// Trailing slashes on the base are ignored, so `https://host/api/` and
/// `https://host/api` produce the same result.
pub fn join_segments(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| AppError::config(format!("'{base}' cannot be used as a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
