//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl Pagination {
    /// Offset for SQL queries, clamped so page 0 behaves like page 1
    pub fn offset(&self) -> i64 {
        let page = self.page.max(1);
        (page as i64 - 1) * self.per_page as i64
    }

    pub fn limit(&self) -> i64 {
        self.per_page.clamp(1, 100) as i64
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl PaginationMeta {
    pub fn new(pagination: &Pagination, total_items: u64) -> Self {
        let per_page = pagination.per_page.max(1);
        let total_pages = ((total_items + per_page as u64 - 1) / per_page as u64) as u32;
        Self {
            page: pagination.page.max(1),
            per_page,
            total_items,
            total_pages,
        }
    }
}

/// Date range for queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRange {
    pub start: chrono::NaiveDate,
    pub end: chrono::NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_offset() {
        let p = Pagination { page: 1, per_page: 20 };
        assert_eq!(p.offset(), 0);

        let p = Pagination { page: 3, per_page: 10 };
        assert_eq!(p.offset(), 20);

        // Page 0 is treated as page 1
        let p = Pagination { page: 0, per_page: 10 };
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_pagination_meta() {
        let p = Pagination { page: 2, per_page: 10 };
        let meta = PaginationMeta::new(&p, 25);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.total_items, 25);
    }
}
