//! Page/limit parsing shared by the paginated catalog endpoints.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

const INVALID_PAGING: &str = "Invalid page or limit parameter";

/// Raw `?page=&limit=` query parameters, kept as text so bad input can be
/// reported as a validation error rather than a rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Largest offset SQLite accepts.
const MAX_OFFSET: u64 = i64::MAX as u64;

/// Validated paging window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: u64,
    pub limit: u64,
}

impl PageParams {
    /// Parse and clamp: page is at least 1, limit is within `[1, max_limit]`,
    /// and page is capped so the offset stays a valid SQLite integer.
    pub fn parse(query: &PageQuery, max_limit: u64) -> Result<Self, AppError> {
        let page = parse_number(query.page.as_deref(), DEFAULT_PAGE as i64)?;
        let limit = parse_number(query.limit.as_deref(), DEFAULT_LIMIT as i64)?;

        let limit = (limit.max(1) as u64).min(max_limit.max(1));
        let last_page = MAX_OFFSET / limit + 1;

        Ok(Self {
            page: (page.max(1) as u64).min(last_page),
            limit,
        })
    }

    pub fn offset(&self) -> u64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.limit)
            .min(MAX_OFFSET)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

fn parse_number(raw: Option<&str>, default: i64) -> Result<i64, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(text) => text
            .parse::<i64>()
            .map_err(|_| AppError::validation(INVALID_PAGING)),
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, params: PageParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            limit: params.limit,
            total_pages: params.total_pages(total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, limit: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn test_defaults() {
        let params = PageParams::parse(&PageQuery::default(), 50).unwrap();
        assert_eq!(params, PageParams { page: 1, limit: 10 });
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_clamping() {
        let params = PageParams::parse(&query(Some("0"), Some("500")), 50).unwrap();
        assert_eq!(params, PageParams { page: 1, limit: 50 });

        let params = PageParams::parse(&query(Some("-3"), Some("0")), 50).unwrap();
        assert_eq!(params, PageParams { page: 1, limit: 1 });

        let params = PageParams::parse(&query(Some("3"), Some("20")), 50).unwrap();
        assert_eq!(params.offset(), 40);
    }

    #[test]
    fn test_huge_page_keeps_offset_in_range() {
        let params = PageParams::parse(&query(Some("9223372036854775807"), Some("10")), 50).unwrap();
        assert_eq!(params.page, i64::MAX as u64 / 10 + 1);
        assert!(params.offset() <= i64::MAX as u64);
        assert_eq!(params.offset(), i64::MAX as u64 / 10 * 10);

        let params = PageParams::parse(&query(Some("9223372036854775807"), Some("1")), 50).unwrap();
        assert_eq!(params.offset(), i64::MAX as u64 - 1);

        let stray = PageParams { page: u64::MAX, limit: 50 };
        assert_eq!(stray.offset(), i64::MAX as u64);
    }

    #[test]
    fn test_non_numeric_is_validation_error() {
        let err = PageParams::parse(&query(Some("two"), None), 50).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Invalid page or limit parameter"));

        assert!(PageParams::parse(&query(None, Some("1.5")), 50).is_err());
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let params = PageParams { page: 1, limit: 10 };
        assert_eq!(params.total_pages(0), 0);
        assert_eq!(params.total_pages(10), 1);
        assert_eq!(params.total_pages(11), 2);
    }
}
