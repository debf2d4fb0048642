//! Page to LIMIT/OFFSET resolution

use serde::Serialize;

use crate::error::{GatewayError, Result};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PER_PAGE: i64 = 10;

/// Default ceiling for per_page to bound result materialization
pub const DEFAULT_MAX_PER_PAGE: i64 = 1000;

/// LIMIT/OFFSET pair derived from a page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub limit: i64,
    pub offset: i64,
}

/// Pagination policy
///
/// `page` and `per_page` must both be at least 1. A `per_page` above
/// `max_per_page` is clamped down to it rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationPolicy {
    max_per_page: i64,
}

impl Default for PaginationPolicy {
    fn default() -> Self {
        Self {
            max_per_page: DEFAULT_MAX_PER_PAGE,
        }
    }
}

impl PaginationPolicy {
    /// `max_per_page` below 1 is raised to 1
    pub fn new(max_per_page: i64) -> Self {
        Self {
            max_per_page: max_per_page.max(1),
        }
    }

    pub fn max_per_page(&self) -> i64 {
        self.max_per_page
    }

    /// Resolve optional request values, applying the defaults first
    pub fn resolve_optional(&self, page: Option<i64>, per_page: Option<i64>) -> Result<PageWindow> {
        self.resolve(
            page.unwrap_or(DEFAULT_PAGE),
            per_page.unwrap_or(DEFAULT_PER_PAGE),
        )
    }

    pub fn resolve(&self, page: i64, per_page: i64) -> Result<PageWindow> {
        if page < 1 {
            return Err(GatewayError::InvalidPagination(
                "page must be at least 1".to_string(),
            ));
        }
        if per_page < 1 {
            return Err(GatewayError::InvalidPagination(
                "per_page must be at least 1".to_string(),
            ));
        }

        let limit = per_page.min(self.max_per_page);
        let offset = (page - 1).checked_mul(limit).ok_or_else(|| {
            GatewayError::InvalidPagination("page is too large".to_string())
        })?;

        Ok(PageWindow { limit, offset })
    }
}

/// Parse a raw `page` or `per_page` request value
///
/// Integers too large for i64 saturate, so the range rules of
/// [`PaginationPolicy::resolve`] still decide: a huge negative is below 1 and
/// a huge `per_page` is clamped. Anything else that is not an integer is
/// rejected without echoing the value.
pub fn parse_param(name: &'static str, raw: Option<&str>) -> Result<Option<i64>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let raw = raw.trim();

    if let Ok(value) = raw.parse::<i64>() {
        return Ok(Some(value));
    }

    let (negative, digits) = match raw.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    if !digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return Ok(Some(if negative { i64::MIN } else { i64::MAX }));
    }

    Err(GatewayError::InvalidPagination(format!(
        "{} must be an integer",
        name
    )))
}
