//! Windowing and pagination types.

use serde::{Deserialize, Serialize};

/// Default page size.
const DEFAULT_PAGE_SIZE: u64 = 25;
/// Maximum page size.
const MAX_PAGE_SIZE: u64 = 100;

/// A raw skip/take window. Absent bounds mean "no windowing" on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// Number of leading rows to drop.
    pub skip: Option<u64>,
    /// Maximum number of rows to return.
    pub take: Option<u64>,
}

impl Window {
    /// Whether neither bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.skip.is_none() && self.take.is_none()
    }

    /// Apply the window to an in-memory list.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let skip = usize::try_from(self.skip.unwrap_or(0)).unwrap_or(usize::MAX);
        let take = self
            .take
            .map_or(usize::MAX, |t| usize::try_from(t).unwrap_or(usize::MAX));
        items.into_iter().skip(skip).take(take).collect()
    }
}

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-based).
    #[serde(default = "default_page")]
    pub page: u64,
    /// Number of items per page.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

impl PageRequest {
    /// Create a new page request.
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// The same request with `page` and `page_size` clamped into range.
    ///
    /// Requests built by hand or deserialized skip the clamp in [`Self::new`].
    pub fn normalized(&self) -> Self {
        Self::new(self.page, self.page_size)
    }

    /// Calculate the SQL `OFFSET` value.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }

    /// Return the SQL `LIMIT` value.
    pub fn limit(&self) -> u64 {
        self.page_size
    }

    /// The skip/take window covering this page.
    pub fn window(&self) -> Window {
        Window {
            skip: Some(self.offset()),
            take: Some(self.limit()),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Paginated response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Current page number (1-based).
    pub page: u64,
    /// Number of items per page.
    pub page_size: u64,
    /// Total number of items across all pages.
    pub total_items: u64,
    /// Total number of pages.
    pub total_pages: u64,
    /// Whether there is a next page.
    pub has_next: bool,
    /// Whether there is a previous page.
    pub has_previous: bool,
}

impl<T> PageResponse<T> {
    /// Create a new paginated response.
    pub fn new(items: Vec<T>, page: u64, page_size: u64, total_items: u64) -> Self {
        let page_size = page_size.max(1);
        let total_pages = if total_items == 0 {
            1
        } else {
            total_items.div_ceil(page_size)
        };
        Self {
            items,
            page,
            page_size,
            total_items,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }

    /// Create an empty response.
    pub fn empty(page_request: &PageRequest) -> Self {
        Self::new(Vec::new(), page_request.page, page_request.page_size, 0)
    }
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_clamps() {
        let page = PageRequest::new(0, 1_000);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, MAX_PAGE_SIZE);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_page_window() {
        let page = PageRequest::new(3, 10);
        assert_eq!(
            page.window(),
            Window {
                skip: Some(20),
                take: Some(10)
            }
        );
    }

    #[test]
    fn test_page_response_totals() {
        let resp = PageResponse::new(vec![1, 2], 2, 2, 5);
        assert_eq!(resp.total_pages, 3);
        assert!(resp.has_next);
        assert!(resp.has_previous);

        let empty: PageResponse<u8> = PageResponse::empty(&PageRequest::default());
        assert_eq!(empty.total_pages, 1);
        assert!(!empty.has_next);
    }

    #[test]
    fn test_unclamped_request_is_normalized() {
        let raw: PageRequest =
            serde_json::from_str(r#"{"page":0,"page_size":0}"#).expect("deserialize");
        assert_eq!(raw.page_size, 0);

        let page = raw.normalized();
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 1);

        let huge = PageRequest {
            page: u64::MAX,
            page_size: 50,
        };
        assert_eq!(huge.offset(), u64::MAX);

        let resp = PageResponse::new(vec![1], 1, 0, 3);
        assert_eq!(resp.page_size, 1);
        assert_eq!(resp.total_pages, 3);
    }

    #[test]
    fn test_window_apply() {
        let items: Vec<u32> = (1..=10).collect();
        let window = Window {
            skip: Some(2),
            take: Some(3),
        };
        assert_eq!(window.apply(items.clone()), vec![3, 4, 5]);
        assert_eq!(Window::default().apply(items.clone()), items);
        assert!(Window::default().is_unbounded());
    }
}
