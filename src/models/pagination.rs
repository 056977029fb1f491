//! Page-number pagination shared by every listing

use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::{AppError, AppResult};

/// Rows per page on every paginated listing
pub const PAGE_SIZE: i64 = 10;

/// Highest page whose offset fits in an `i64`
const MAX_PAGE: i64 = i64::MAX / PAGE_SIZE;

/// `?page=N` query parameter (1-based)
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PageQuery {
    /// Page number (default: 1)
    pub page: Option<i64>,
}

/// A validated page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    /// Build a request for `page`; pages start at 1.
    pub fn new(page: Option<i64>) -> AppResult<Self> {
        let page = page.unwrap_or(1);
        if page < 1 {
            return Err(AppError::NotFound(format!("Invalid page ({})", page)));
        }
        // No listing can reach this far; answer like any page past the end
        if page > MAX_PAGE {
            return Err(AppError::NotFound(format!(
                "Invalid page ({}): that page contains no results",
                page
            )));
        }
        Ok(Self {
            page,
            per_page: PAGE_SIZE,
        })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    /// Number of pages needed for `total` rows. An empty listing still has one page.
    pub fn num_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            1
        } else {
            (total + self.per_page - 1) / self.per_page
        }
    }

    /// Reject pages past the end of the listing
    pub fn ensure_exists(&self, total: i64) -> AppResult<()> {
        if self.page > self.num_pages(total) {
            return Err(AppError::NotFound(format!(
                "Invalid page ({}): that page contains no results",
                self.page
            )));
        }
        Ok(())
    }
}
