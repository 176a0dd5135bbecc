//! Page-number pagination shared by every list endpoint.

use serde::Serialize;

/// Default page size for task, member and time-entry lists.
pub const DEFAULT_PER_PAGE: i64 = 20;
/// Default page size for project lists.
pub const DEFAULT_PROJECT_PER_PAGE: i64 = 10;
/// Hard upper bound on any page size.
pub const MAX_PER_PAGE: i64 = 100;
/// Highest page number accepted; larger requests land on this page.
pub const MAX_PAGE: i64 = 1_000_000;

/// A resolved page request (1-based page number).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    /// Clamp user-supplied values. Page is kept within `1..=MAX_PAGE`; a
    /// page size outside `1..=MAX_PER_PAGE` falls back to `default_per_page`.
    pub fn new(page: Option<i64>, per_page: Option<i64>, default_per_page: i64) -> Self {
        let page = page.unwrap_or(1).clamp(1, MAX_PAGE);
        let per_page = match per_page {
            Some(n) if (1..=MAX_PER_PAGE).contains(&n) => n,
            _ => default_per_page,
        };
        Self { page, per_page }
    }

    /// SQL `LIMIT`.
    pub fn limit(&self) -> i64 {
        self.per_page
    }

    /// SQL `OFFSET`.
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }
}

/// Pagination metadata returned alongside list items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: i64) -> Self {
        Self {
            page: request.page,
            per_page: request.per_page,
            total,
            total_pages: total_pages(total, request.per_page),
        }
    }
}

/// Ceiling division of `total` by `per_page`.
pub fn total_pages(total: i64, per_page: i64) -> i64 {
    if per_page <= 0 || total <= 0 {
        return 0;
    }
    (total + per_page - 1) / per_page
}

/// A page of items with its pagination metadata.
#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}
