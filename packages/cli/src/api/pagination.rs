// ABOUTME: Pagination for the consultant browser
// ABOUTME: Page/limit query handling and the paginated response wrapper

use serde::Serialize;

/// Consultants shown per page in the browser
pub const DEFAULT_PAGE_SIZE: usize = 24;

/// Maximum page size to keep responses small
pub const MAX_PAGE_SIZE: usize = 100;

/// Minimum page number (1-indexed)
pub const MIN_PAGE: usize = 1;

/// Normalized page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    page: usize,
    limit: usize,
}

impl PaginationParams {
    /// Clamp raw query values; missing values fall back to the defaults
    pub fn new(page: Option<usize>, limit: Option<usize>) -> Self {
        Self {
            page: page.unwrap_or(MIN_PAGE).max(MIN_PAGE),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn offset(&self) -> usize {
        (self.page - 1) * self.limit
    }

    /// Slice one page out of an already filtered list
    pub fn apply<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .skip(self.offset())
            .take(self.limit)
            .cloned()
            .collect()
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Metadata about pagination state
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PaginationMeta {
    pub page: usize,

    #[serde(rename = "pageSize")]
    pub page_size: usize,

    #[serde(rename = "totalItems")]
    pub total_items: usize,

    #[serde(rename = "totalPages")]
    pub total_pages: usize,

    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,

    #[serde(rename = "hasPreviousPage")]
    pub has_previous_page: bool,
}

impl PaginationMeta {
    pub fn new(params: &PaginationParams, total_items: usize) -> Self {
        let page = params.page();
        let total_pages = total_items.div_ceil(params.limit());

        Self {
            page,
            page_size: params.limit(),
            total_items,
            total_pages,
            has_next_page: page < total_pages,
            has_previous_page: page > MIN_PAGE,
        }
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T: Clone> PaginatedResponse<T> {
    /// Page through a full result list
    pub fn paginate(items: &[T], params: &PaginationParams) -> Self {
        Self {
            data: params.apply(items),
            pagination: PaginationMeta::new(params, items.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = PaginationParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_params_are_clamped() {
        let params = PaginationParams::new(Some(0), Some(0));
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 1);

        let params = PaginationParams::new(Some(3), Some(500));
        assert_eq!(params.limit(), MAX_PAGE_SIZE);
        assert_eq!(params.offset(), 2 * MAX_PAGE_SIZE);
    }

    #[test]
    fn test_last_partial_page() {
        let items: Vec<u32> = (1..=32).collect();
        let response = PaginatedResponse::paginate(&items, &PaginationParams::new(Some(2), None));

        assert_eq!(response.data, (25..=32).collect::<Vec<_>>());
        assert_eq!(response.pagination.total_pages, 2);
        assert!(!response.pagination.has_next_page);
        assert!(response.pagination.has_previous_page);
    }

    #[test]
    fn test_page_past_the_end_is_empty() {
        let items: Vec<u32> = (1..=5).collect();
        let response = PaginatedResponse::paginate(&items, &PaginationParams::new(Some(4), None));
        assert!(response.data.is_empty());
        assert_eq!(response.pagination.total_items, 5);
        assert_eq!(response.pagination.total_pages, 1);
    }

    #[test]
    fn test_empty_list_has_no_pages() {
        let items: Vec<u32> = Vec::new();
        let meta = PaginatedResponse::paginate(&items, &PaginationParams::default()).pagination;
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next_page);
    }
}
