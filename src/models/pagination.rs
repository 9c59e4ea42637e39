//! Pagination primitives shared across all list endpoints.

use serde::Serialize;

/// Request parameter carrying the requested page number.
pub const PAGE_PARAM: &str = "p";

/// Interpret a raw page parameter.
///
/// Anything that is not a positive integer falls back to page 1. Digit strings
/// too large for `i64` saturate so they clamp to the last page downstream.
pub fn parse_page(raw: Option<&str>) -> i64 {
    let Some(raw) = raw.map(str::trim) else {
        return 1;
    };
    let digits = raw.strip_prefix('+').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return 1;
    }
    digits.parse::<i64>().unwrap_or(i64::MAX).max(1)
}

/// Resolved page bounds for one listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_records: i64,
    pub offset: i64,
    pub page_size: i64,
}

impl PageWindow {
    /// Clamp `requested_page` into `[1, total_pages]` and derive the row offset.
    ///
    /// An empty result still has one (empty) page.
    pub fn compute(total_records: i64, requested_page: i64, page_size: i64) -> Self {
        let page_size = page_size.max(1);
        let total_records = total_records.max(0);

        let total_pages = if total_records == 0 {
            1
        } else {
            total_records / page_size + i64::from(total_records % page_size != 0)
        };
        let current_page = requested_page.clamp(1, total_pages);

        Self {
            current_page,
            total_pages,
            total_records,
            offset: (current_page - 1) * page_size,
            page_size,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// Paged result envelope returned by list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult<T: Serialize> {
    pub rows: Vec<T>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_records: i64,
    pub offset: i64,
    pub page_size: i64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T: Serialize> PageResult<T> {
    pub fn new(rows: Vec<T>, window: PageWindow) -> Self {
        Self {
            rows,
            current_page: window.current_page,
            total_pages: window.total_pages,
            total_records: window.total_records,
            offset: window.offset,
            page_size: window.page_size,
            has_previous: window.has_previous(),
            has_next: window.has_next(),
        }
    }
}
