//! Page requests and paged results.

/// Default page size for public listings.
pub const DEFAULT_PAGE_SIZE: u64 = 12;

/// Largest accepted page size.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Highest page number; keeps the row offset within a signed 64-bit `OFFSET`.
const MAX_PAGE: u64 = i64::MAX as u64 / MAX_PAGE_SIZE;

/// A normalized page request. `page` starts at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    /// Build a page request, clamping `page` to `1..=MAX_PAGE` and `limit` to
    /// `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn new(page: Option<u64>, limit: Option<u64>, default_limit: u64) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Rows to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None, DEFAULT_PAGE_SIZE)
    }
}

/// One page of results.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl<T> Page<T> {
    /// Wrap a repository result.
    #[must_use]
    pub const fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            limit: request.limit,
        }
    }

    /// Number of pages needed for `total` rows.
    #[must_use]
    pub const fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.limit)
    }

    /// Convert every item.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_clamps() {
        let req = PageRequest::new(Some(0), Some(500), DEFAULT_PAGE_SIZE);
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, MAX_PAGE_SIZE);

        let req = PageRequest::new(Some(3), Some(0), DEFAULT_PAGE_SIZE);
        assert_eq!(req.limit, 1);
        assert_eq!(req.offset(), 2);

        assert_eq!(PageRequest::default().limit, 12);
    }

    #[test]
    fn test_huge_page_number_is_capped() {
        let req = PageRequest::new(Some(u64::MAX), Some(100), DEFAULT_PAGE_SIZE);

        assert_eq!(req.page, MAX_PAGE);
        assert!(i64::try_from(req.offset()).is_ok());

        let unchecked = PageRequest { page: u64::MAX, limit: MAX_PAGE_SIZE };
        assert_eq!(unchecked.offset(), u64::MAX);
    }

    #[test]
    fn test_total_pages() {
        let req = PageRequest::new(Some(1), Some(12), DEFAULT_PAGE_SIZE);
        assert_eq!(Page::new(Vec::<u8>::new(), 0, req).total_pages(), 0);
        assert_eq!(Page::new(Vec::<u8>::new(), 12, req).total_pages(), 1);
        assert_eq!(Page::new(Vec::<u8>::new(), 13, req).total_pages(), 2);
    }
}
