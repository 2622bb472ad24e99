use serde::{Deserialize, Serialize};

/// Number of items requested per page
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// A request for `limit` items starting at `offset`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPage {
    pub offset: usize,
    pub limit: usize,
}

impl FeedPage {
    pub fn first(limit: usize) -> Self {
        Self { offset: 0, limit }
    }

    /// The page right after this one
    #[must_use]
    pub fn next(self) -> Self {
        Self {
            offset: self.offset + self.limit,
            limit: self.limit,
        }
    }
}
