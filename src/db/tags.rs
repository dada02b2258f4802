//! Tag-set handling for list-valued columns.
//!
//! Tag sets are stored as JSON arrays of strings in a TEXT column. Before
//! they are written they are trimmed, stripped of blanks and deduplicated
//! without regard to case, keeping the first spelling and the original order.

use std::collections::HashSet;

use super::error::RepoResult;

/// Trim, drop empty entries and case-insensitively deduplicate, preserving
/// first-seen casing and order.
pub fn normalize_tags<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(values.len());
    let mut cleaned = Vec::with_capacity(values.len());

    for value in values {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            cleaned.push(trimmed.to_string());
        }
    }

    cleaned
}

/// Encode an already-normalized tag set. An empty set is stored as `[]`.
pub(crate) fn encode_tags(tags: &[String]) -> RepoResult<String> {
    Ok(serde_json::to_string(tags)?)
}

/// Decode a stored tag set. Blank column text is read as an empty set.
pub(crate) fn decode_tags(raw: &str) -> RepoResult<Vec<String>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(raw)?)
}
