//! Page-number pagination shared by catalog and history listings.

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};

/// Validated 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Validate `page >= 1` and `1 <= limit <= max_limit`.
    pub fn new(page: u32, limit: u32, max_limit: u32) -> Result<Self> {
        if page < 1 {
            return Err(Error::InvalidInput("page must be at least 1".to_string()));
        }
        if limit < 1 || limit > max_limit {
            return Err(Error::InvalidInput(format!(
                "limit must be between 1 and {}",
                max_limit
            )));
        }
        Ok(Self { page, limit })
    }

    /// Build from optional query parameters, applying defaults.
    pub fn from_query(page: Option<u32>, limit: Option<u32>) -> Result<Self> {
        Self::new(
            page.unwrap_or(defaults::PAGE),
            limit.unwrap_or(defaults::PAGE_LIMIT),
            defaults::PAGE_LIMIT_MAX,
        )
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Zero-based offset of the first item on this page.
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }

    /// Pagination metadata for a result set of `total` items.
    pub fn meta(&self, total: u64) -> Pagination {
        let limit = self.limit as u64;
        Pagination {
            current_page: self.page,
            total_pages: total.div_ceil(limit),
            total_items: total,
            items_per_page: self.limit,
            has_next_page: self.offset() + limit < total,
            has_prev_page: self.page > 1,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: defaults::PAGE,
            limit: defaults::PAGE_LIMIT,
        }
    }
}

/// Pagination metadata returned alongside a page of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u64,
    pub total_items: u64,
    pub items_per_page: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

/// One page of items plus its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            data,
            pagination: request.meta(total),
        }
    }

    /// Slice an in-memory, already-ordered collection.
    pub fn from_slice(items: &[T], request: PageRequest) -> Self
    where
        T: Clone,
    {
        let total = items.len() as u64;
        let start = (request.offset().min(total)) as usize;
        let end = (start + request.limit() as usize).min(items.len());
        Self::new(items[start..end].to_vec(), request, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_page_zero() {
        assert!(matches!(
            PageRequest::new(0, 10, 50),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rejects_limit_out_of_range() {
        assert!(PageRequest::new(1, 0, 50).is_err());
        assert!(PageRequest::new(1, 51, 50).is_err());
        assert!(PageRequest::new(1, 50, 50).is_ok());
    }

    #[test]
    fn test_from_query_defaults() {
        let req = PageRequest::from_query(None, None).unwrap();
        assert_eq!(req.page(), 1);
        assert_eq!(req.limit(), 10);
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn test_meta_middle_page() {
        let req = PageRequest::new(2, 10, 50).unwrap();
        let meta = req.meta(25);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.total_items, 25);
        assert!(meta.has_next_page);
        assert!(meta.has_prev_page);
    }

    #[test]
    fn test_meta_last_page_exact_fit() {
        let req = PageRequest::new(2, 10, 50).unwrap();
        let meta = req.meta(20);
        assert_eq!(meta.total_pages, 2);
        assert!(!meta.has_next_page);
    }

    #[test]
    fn test_meta_empty() {
        let meta = PageRequest::default().meta(0);
        assert_eq!(meta.total_pages, 0);
        assert_eq!(meta.total_items, 0);
        assert!(!meta.has_next_page);
        assert!(!meta.has_prev_page);
    }

    #[test]
    fn test_from_slice_bounds() {
        let items: Vec<u32> = (0..7).collect();

        let first = Paginated::from_slice(&items, PageRequest::new(1, 3, 50).unwrap());
        assert_eq!(first.data, vec![0, 1, 2]);

        let last = Paginated::from_slice(&items, PageRequest::new(3, 3, 50).unwrap());
        assert_eq!(last.data, vec![6]);
        assert!(!last.pagination.has_next_page);

        let beyond = Paginated::from_slice(&items, PageRequest::new(9, 3, 50).unwrap());
        assert!(beyond.data.is_empty());
        assert_eq!(beyond.pagination.total_items, 7);
    }

    #[test]
    fn test_pagination_serializes_camel_case() {
        let json = serde_json::to_value(PageRequest::default().meta(11)).unwrap();
        assert_eq!(json["currentPage"], 1);
        assert_eq!(json["totalPages"], 2);
        assert_eq!(json["itemsPerPage"], 10);
        assert_eq!(json["hasNextPage"], true);
        assert_eq!(json["hasPrevPage"], false);
    }
}
