//! Offset pagination with look-ahead.
//!
//! A page is fetched with one extra record (`per_page + 1`); the presence
//! of that record tells whether a following page exists without a second
//! query.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Default page number.
pub const DEFAULT_PAGE: u64 = 1;
/// Default page size.
pub const DEFAULT_PER_PAGE: u64 = 20;
/// Maximum page size.
pub const MAX_PER_PAGE: u64 = 500;

/// Validated request parameters for paginated queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-based).
    pub page: u64,
    /// Number of items per page.
    pub per_page: u64,
}

impl PageRequest {
    /// Create a page request, rejecting zero values and oversized pages.
    pub fn new(page: u64, per_page: u64) -> Result<Self, AppError> {
        if page == 0 || per_page == 0 {
            return Err(AppError::validation(
                "invalid page query: value must be a non-zero, positive number",
            ));
        }
        if per_page > MAX_PER_PAGE {
            return Err(AppError::validation(format!(
                "invalid page query: per_page must not exceed {MAX_PER_PAGE}"
            )));
        }
        Ok(Self { page, per_page })
    }

    /// Number of records to skip.
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    /// Number of records to fetch: one more than the page holds.
    pub fn fetch_limit(&self) -> u64 {
        self.per_page + 1
    }

    /// Cut a look-ahead fetch down to this page.
    pub fn paginate<T>(&self, mut fetched: Vec<T>) -> Page<T> {
        let per_page = usize::try_from(self.per_page).unwrap_or(usize::MAX);
        let has_next = fetched.len() > per_page;
        fetched.truncate(per_page);
        Page {
            items: fetched,
            page: self.page,
            per_page: self.per_page,
            has_next,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Current page number (1-based).
    pub page: u64,
    /// Number of items per page.
    pub per_page: u64,
    /// Whether a following page exists.
    pub has_next: bool,
}

impl<T> Page<T> {
    /// Whether there is a previous page.
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}
