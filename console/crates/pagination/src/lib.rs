//! Fixed page-size row pagination for console panels.
//!
//! Panels hold an in-memory list and show one page of it at a time. This
//! crate owns the arithmetic: clamping the current page, computing slice
//! bounds, and notifying a callback whenever the visible page changes.
//!
//! # Overview
//!
//! - [`PageSize`] is a validated, non-zero number of rows per page.
//! - [`Paginator`] is the page state: total items, page size, current page.
//! - [`PageWindow`] is a snapshot of the visible page and its slice bounds.
//! - [`paginate`] builds a [`Pager`], which owns a callback and invokes it on
//!   the initial render and on every transition.
//!
//! # Example
//!
//! ```
//! use pagination::{PageSize, paginate};
//!
//! let mut seen = Vec::new();
//! let size = PageSize::new(100).expect("non-zero page size");
//! let mut pager = paginate(250, size, |window| seen.push(window.page()));
//! pager.next();
//! pager.next();
//! pager.next(); // already on the last page: no transition
//!
//! assert_eq!(seen, vec![1, 2, 3]);
//! ```

mod pager;
mod paginator;

pub use pager::{Pager, paginate};
pub use paginator::{PageSize, PageWindow, Paginator, PaginationError};

/// Default rows per page for console tables.
pub const DEFAULT_PAGE_SIZE: usize = 100;
