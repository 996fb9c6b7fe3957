//! # Pagination
//!
//! Fixed-size pages over a counted listing. Requests past either end are
//! clamped to the nearest page.

use serde::Serialize;

/// One page of a listing. Page numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub per_page: u32,
    pub total_items: i64,
    pub total_pages: u32,
}

/// An empty listing still has one (empty) page.
pub fn total_pages(total_items: i64, per_page: u32) -> u32 {
    let per_page = i64::from(per_page.max(1));
    let pages = (total_items.max(0) + per_page - 1) / per_page;
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}

/// Out-of-range requests land on the nearest existing page.
pub fn clamp_page(requested: u32, total_items: i64, per_page: u32) -> u32 {
    requested.clamp(1, total_pages(total_items, per_page))
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, number: u32, per_page: u32, total_items: i64) -> Self {
        Self {
            items,
            number,
            per_page,
            total_items,
            total_pages: total_pages(total_items, per_page),
        }
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_counts() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }

    #[test]
    fn clamping() {
        assert_eq!(clamp_page(0, 25, 10), 1);
        assert_eq!(clamp_page(2, 25, 10), 2);
        assert_eq!(clamp_page(9, 25, 10), 3);
        assert_eq!(clamp_page(4, 0, 10), 1);
    }

    #[test]
    fn neighbours() {
        let page = Page::new(vec![1, 2], 2, 2, 5);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next());
        assert!(page.has_previous());
        assert!(!Page::<u8>::new(vec![], 1, 10, 0).has_next());
    }
}
