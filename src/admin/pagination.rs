//! Page arithmetic for record listings

use serde::Serialize;

/// A requested page, already clamped to valid bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    /// Clamp caller input: page at least 1, per_page within `1..=max_per_page`
    pub fn new(
        page: Option<i64>,
        per_page: Option<i64>,
        default_per_page: u32,
        max_per_page: u32,
    ) -> Self {
        let max = i64::from(max_per_page.max(1));
        let page = page.unwrap_or(1).clamp(1, i64::from(u32::MAX));
        let per_page = per_page
            .unwrap_or_else(|| i64::from(default_per_page))
            .clamp(1, max);

        Self {
            page: page as u32,
            per_page: per_page as u32,
        }
    }
}

/// Where a page sits within the filtered result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl PageInfo {
    /// Pin the requested page into `1..=total_pages`; an empty set has one page
    pub fn compute(request: PageRequest, total_items: u64) -> Self {
        let per_page = u64::from(request.per_page.max(1));
        let total_pages = total_items.div_ceil(per_page).max(1);
        let total_pages = u32::try_from(total_pages).unwrap_or(u32::MAX);

        Self {
            page: request.page.clamp(1, total_pages),
            per_page: request.per_page,
            total_items,
            total_pages,
        }
    }

    pub fn offset(&self) -> u32 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// One page of items
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(flatten)]
    pub info: PageInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_clamping() {
        assert_eq!(
            PageRequest::new(None, None, 20, 100),
            PageRequest { page: 1, per_page: 20 }
        );
        assert_eq!(
            PageRequest::new(Some(-3), Some(500), 20, 100),
            PageRequest { page: 1, per_page: 100 }
        );
        assert_eq!(PageRequest::new(Some(2), Some(0), 20, 100).per_page, 1);
    }

    #[test]
    fn test_empty_set_has_one_page() {
        let info = PageInfo::compute(PageRequest { page: 5, per_page: 20 }, 0);
        assert_eq!(info.page, 1);
        assert_eq!(info.total_pages, 1);
        assert_eq!(info.offset(), 0);
        assert!(!info.has_prev());
        assert!(!info.has_next());
    }

    #[test]
    fn test_page_past_end_is_pinned() {
        let info = PageInfo::compute(PageRequest { page: 9, per_page: 20 }, 45);
        assert_eq!(info.total_pages, 3);
        assert_eq!(info.page, 3);
        assert_eq!(info.offset(), 40);
        assert!(info.has_prev());
        assert!(!info.has_next());
    }

    #[test]
    fn test_middle_page() {
        let info = PageInfo::compute(PageRequest { page: 2, per_page: 10 }, 30);
        assert_eq!(info.offset(), 10);
        assert!(info.has_prev());
        assert!(info.has_next());
    }
}
