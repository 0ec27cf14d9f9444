//! Page state and slice-bound arithmetic.

use std::fmt;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while constructing pagination primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PaginationError {
    /// A page must hold at least one row.
    #[error("page size must be greater than zero")]
    ZeroPageSize,
}

/// Number of rows shown per page.
///
/// ## Invariants
/// - Always greater than zero.
///
/// # Examples
/// ```
/// use pagination::{PageSize, PaginationError};
///
/// assert_eq!(PageSize::new(30).map(PageSize::get), Ok(30));
/// assert_eq!(PageSize::new(0), Err(PaginationError::ZeroPageSize));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct PageSize(NonZeroUsize);

impl PageSize {
    /// Validate and construct a page size.
    ///
    /// # Errors
    ///
    /// Returns [`PaginationError::ZeroPageSize`] when `rows` is zero.
    pub fn new(rows: usize) -> Result<Self, PaginationError> {
        NonZeroUsize::new(rows)
            .map(Self)
            .ok_or(PaginationError::ZeroPageSize)
    }

    /// Rows per page as a plain integer.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(NonZeroUsize::new(crate::DEFAULT_PAGE_SIZE).unwrap_or(NonZeroUsize::MIN))
    }
}

impl TryFrom<usize> for PageSize {
    type Error = PaginationError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PageSize> for usize {
    fn from(value: PageSize) -> Self {
        value.get()
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Snapshot of the visible page.
///
/// `start` and `end` are zero-based slice bounds into the paginated list:
/// the page shows `items[start..end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageWindow {
    page: usize,
    page_size: usize,
    total_items: usize,
    total_pages: usize,
    start: usize,
    end: usize,
}

impl PageWindow {
    /// One-based page number.
    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    /// Rows per page.
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of items across all pages.
    #[must_use]
    pub const fn total_items(&self) -> usize {
        self.total_items
    }

    /// Number of pages; at least one even when there are no items.
    #[must_use]
    pub const fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// Zero-based index of the first row on this page.
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Zero-based exclusive end index of this page.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Number of rows on this page.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// True when the page shows no rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a later page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Whether an earlier page exists.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Borrow the rows of `items` covered by this window.
    ///
    /// Returns an empty slice when `items` is shorter than the window expects.
    #[must_use]
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let end = self.end.min(items.len());
        items.get(self.start..end).unwrap_or(&[])
    }

    /// Human-readable row range, for example `Rows 1-100 of 250`.
    ///
    /// # Examples
    /// ```
    /// use pagination::{PageSize, Paginator};
    ///
    /// let size = PageSize::new(100).expect("page size");
    /// assert_eq!(Paginator::new(250, size).window().label(), "Rows 1-100 of 250");
    /// assert_eq!(Paginator::new(0, size).window().label(), "Rows 0-0 of 0");
    /// ```
    #[must_use]
    pub fn label(&self) -> String {
        let first = if self.is_empty() { 0 } else { self.start + 1 };
        format!("Rows {first}-{} of {}", self.end, self.total_items)
    }
}

/// Current-page state for a list of `total_items` rows.
///
/// ## Invariants
/// - `page` is always within `[1, total_pages]`.
/// - `total_pages` is `ceil(total_items / page_size)`, or 1 when empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    total_items: usize,
    page_size: PageSize,
    page: usize,
}

impl Paginator {
    /// Start on page 1.
    #[must_use]
    pub const fn new(total_items: usize, page_size: PageSize) -> Self {
        Self {
            total_items,
            page_size,
            page: 1,
        }
    }

    /// One-based current page.
    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    /// Configured page size.
    #[must_use]
    pub const fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// Items being paginated.
    #[must_use]
    pub const fn total_items(&self) -> usize {
        self.total_items
    }

    /// Number of pages, never less than one.
    #[must_use]
    pub const fn total_pages(&self) -> usize {
        let pages = self.total_items.div_ceil(self.page_size.get());
        if pages == 0 { 1 } else { pages }
    }

    /// Snapshot of the current page.
    #[must_use]
    pub fn window(&self) -> PageWindow {
        let size = self.page_size.get();
        let start = (self.page - 1).saturating_mul(size).min(self.total_items);
        let end = self.page.saturating_mul(size).min(self.total_items);
        PageWindow {
            page: self.page,
            page_size: size,
            total_items: self.total_items,
            total_pages: self.total_pages(),
            start,
            end,
        }
    }

    /// Advance one page. Returns `None` when already on the last page.
    pub fn next(&mut self) -> Option<PageWindow> {
        if self.page >= self.total_pages() {
            return None;
        }
        self.page += 1;
        Some(self.window())
    }

    /// Go back one page. Returns `None` when already on the first page.
    pub fn previous(&mut self) -> Option<PageWindow> {
        if self.page <= 1 {
            return None;
        }
        self.page -= 1;
        Some(self.window())
    }

    /// Jump to `page`, clamped into `[1, total_pages]`.
    pub fn go_to(&mut self, page: usize) -> PageWindow {
        self.page = page.clamp(1, self.total_pages());
        self.window()
    }

    /// Jump to the last page.
    pub fn last(&mut self) -> PageWindow {
        self.go_to(self.total_pages())
    }

    /// Replace the item count, keeping the current page where it still fits.
    pub fn set_total_items(&mut self, total_items: usize) -> PageWindow {
        self.total_items = total_items;
        self.go_to(self.page)
    }
}
