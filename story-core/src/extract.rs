//! Marker-delimited text extraction.
//!
//! Generated replies carry structured sections bracketed by literal marker
//! strings. Extraction is strict: a missing marker is a protocol violation
//! by the generation capability and is reported, never skipped.

use thiserror::Error;

/// Errors from marker extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("response is missing the expected marker {marker:?}")]
    MissingMarker { marker: String },
}

/// Return the text strictly between the first occurrence of `start` and the
/// first occurrence of `end` after it.
pub fn extract_between<'a>(
    text: &'a str,
    start: &str,
    end: &str,
) -> Result<&'a str, ExtractError> {
    let begin = text
        .find(start)
        .ok_or_else(|| ExtractError::MissingMarker {
            marker: start.to_string(),
        })?
        + start.len();

    let len = text[begin..]
        .find(end)
        .ok_or_else(|| ExtractError::MissingMarker {
            marker: end.to_string(),
        })?;

    Ok(&text[begin..begin + len])
}
