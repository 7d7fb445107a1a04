//! Fixed-size page window over a result set

use serde::Serialize;

/// Number of pages needed for `total` records, 0 when there are none
pub fn total_pages(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1))
}

/// Position of the visible page
///
/// `start` is derived from `current_page`, so the two can never disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationWindow {
    page_size: usize,
    current_page: usize,
    total_pages: usize,
}

impl PaginationWindow {
    /// Empty window. A page size of 0 is treated as 1.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            current_page: 0,
            total_pages: 0,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// Absolute index of the first record on the current page
    pub fn start(&self) -> usize {
        self.current_page * self.page_size
    }

    /// Last valid page index (0 for an empty result)
    pub fn last_page(&self) -> usize {
        self.total_pages.saturating_sub(1)
    }

    /// Recompute the page count for `total` records and return to page 0
    pub fn with_total(self, total: usize) -> Self {
        Self {
            page_size: self.page_size,
            current_page: 0,
            total_pages: total_pages(total, self.page_size),
        }
    }

    /// Move to `page`. The caller checks the range.
    pub fn at_page(self, page: usize) -> Self {
        Self {
            current_page: page,
            ..self
        }
    }

    /// Returns true if `page` can be shown. Page 0 always can.
    pub fn contains(&self, page: usize) -> bool {
        page == 0 || page < self.total_pages
    }

    /// Clamp an arbitrary page number into `[0, last_page]`
    pub fn clamp_page(&self, page: isize) -> usize {
        if page < 0 {
            0
        } else {
            (page as usize).min(self.last_page())
        }
    }
}
