//! Page slicing for long result lists.

/// One page of a larger slice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// 1-based page number after clamping
    pub page: usize,
    pub total_pages: usize,
    pub per_page: usize,
    pub total_items: usize,
}

impl<T> Page<'_, T> {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Index of the first item of this page within the full list
    pub fn offset(&self) -> usize {
        (self.page - 1) * self.per_page
    }
}

/// Number of pages needed for `total_items`; never less than one.
pub fn total_pages(total_items: usize, per_page: usize) -> usize {
    let per_page = per_page.max(1);
    total_items.div_ceil(per_page).max(1)
}

/// Return page `page` (1-based) of `items`.
///
/// The page number is clamped into `[1, total_pages]`, so asking for a page
/// past the end yields the last page. Clamping `per_page` to a sane range is
/// left to the caller; a zero is treated as one.
pub fn paginate<T>(items: &[T], per_page: usize, page: usize) -> Page<'_, T> {
    let per_page = per_page.max(1);
    let total_pages = total_pages(items.len(), per_page);
    let page = page.clamp(1, total_pages);

    let start = ((page - 1) * per_page).min(items.len());
    let end = (start + per_page).min(items.len());

    Page {
        items: &items[start..end],
        page,
        total_pages,
        per_page,
        total_items: items.len(),
    }
}
