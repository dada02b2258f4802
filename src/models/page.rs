use serde::{Deserialize, Serialize};

/// Offset-based pagination.
///
/// A `limit` of zero or less means "no limit"; an `offset` of zero or less
/// starts at the first row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self { limit, offset }
    }

    /// Every matching row in one page.
    pub fn unbounded() -> Self {
        Self::default()
    }
}

/// One page of a filtered listing together with the number of rows matching
/// the filters across all pages.
///
/// The count and the page are read separately, so under concurrent writes
/// `total_count` is a best-effort figure relative to `items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: i64,
}
