//! Offset/limit window over an ordered listing.

use serde::Deserialize;

/// Pagination parameters
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct Page {
    /// number of leading items to skip
    #[serde(default)]
    pub offset: usize,
    /// maximum number of items returned
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize { 20 }

impl Page {
    pub fn new(offset: usize, limit: usize) -> Self { Self { offset, limit } }

    /// Take `[offset, offset + limit)` from `items`. Out-of-range windows are empty.
    pub fn apply<T>(self, items: Vec<T>) -> Vec<T> {
        items.into_iter().skip(self.offset).take(self.limit).collect()
    }
}

impl Default for Page {
    fn default() -> Self { Self { offset: 0, limit: default_limit() } }
}
