use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
}

impl Page {
    /// Page numbers start at 1; `per_page` is clamped to `1..=max_per_page`.
    pub fn new(page: Option<u32>, per_page: Option<u32>, default_per_page: u32, max_per_page: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(default_per_page).clamp(1, max_per_page),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.per_page as i64
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }

    pub fn info(&self, total: i64) -> PageInfo {
        let per_page = self.per_page as i64;
        let total_pages = (total.max(0) + per_page - 1) / per_page;

        PageInfo {
            page: self.page,
            per_page: self.per_page,
            total,
            total_pages,
            has_prev: self.page > 1,
            has_next: (self.page as i64) < total_pages,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PageInfo {
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
    #[schema(example = 3)]
    pub total_pages: i64,
    pub has_prev: bool,
    pub has_next: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_clamping() {
        assert_eq!(Page::new(None, None, 20, 100), Page { page: 1, per_page: 20 });
        assert_eq!(Page::new(Some(0), Some(0), 20, 100), Page { page: 1, per_page: 1 });
        assert_eq!(Page::new(Some(3), Some(500), 20, 100), Page { page: 3, per_page: 100 });
    }

    #[test]
    fn offset_follows_page() {
        assert_eq!(Page::new(Some(3), Some(30), 30, 100).offset(), 60);
        assert_eq!(Page::new(None, None, 30, 100).offset(), 0);
    }

    #[test]
    fn info_counts_pages() {
        let info = Page::new(Some(2), Some(20), 20, 100).info(41);

        assert_eq!(info.total_pages, 3);
        assert!(info.has_prev);
        assert!(info.has_next);

        let last = Page::new(Some(3), Some(20), 20, 100).info(41);
        assert!(!last.has_next);

        let empty = Page::new(None, None, 20, 100).info(0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_prev && !empty.has_next);
    }
}
