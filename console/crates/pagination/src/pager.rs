//! Callback-driven pagination control.

use crate::paginator::{PageSize, PageWindow, Paginator};

/// Pagination control that reports every page change to a callback.
///
/// Built by [`paginate`]. The callback receives the new [`PageWindow`] on the
/// initial render and after each transition that actually moves the page;
/// edge no-ops (previous on page 1, next on the last page) stay silent.
pub struct Pager<F>
where
    F: FnMut(&PageWindow),
{
    paginator: Paginator,
    on_page_change: F,
}

/// Render the first page of `total_items` rows and return the control.
///
/// `on_page_change` is invoked immediately with page 1.
///
/// # Examples
/// ```
/// use pagination::{PageSize, paginate};
///
/// let mut bounds = Vec::new();
/// let size = PageSize::new(30).expect("page size");
/// let mut pager = paginate(45, size, |w| bounds.push((w.start(), w.end())));
/// pager.next();
///
/// assert_eq!(bounds, vec![(0, 30), (30, 45)]);
/// ```
pub fn paginate<F>(total_items: usize, page_size: PageSize, on_page_change: F) -> Pager<F>
where
    F: FnMut(&PageWindow),
{
    let mut pager = Pager {
        paginator: Paginator::new(total_items, page_size),
        on_page_change,
    };
    pager.emit();
    pager
}

impl<F> Pager<F>
where
    F: FnMut(&PageWindow),
{
    /// Snapshot of the current page.
    #[must_use]
    pub fn window(&self) -> PageWindow {
        self.paginator.window()
    }

    /// Advance one page; returns whether the page changed.
    pub fn next(&mut self) -> bool {
        let moved = self.paginator.next().is_some();
        if moved {
            self.emit();
        }
        moved
    }

    /// Go back one page; returns whether the page changed.
    pub fn previous(&mut self) -> bool {
        let moved = self.paginator.previous().is_some();
        if moved {
            self.emit();
        }
        moved
    }

    /// Jump to `page` (clamped) and report it.
    pub fn go_to(&mut self, page: usize) -> PageWindow {
        self.paginator.go_to(page);
        self.emit()
    }

    /// Jump to the last page and report it.
    pub fn last(&mut self) -> PageWindow {
        self.paginator.last();
        self.emit()
    }

    /// Replace the item count and re-render the clamped current page.
    pub fn set_total_items(&mut self, total_items: usize) -> PageWindow {
        self.paginator.set_total_items(total_items);
        self.emit()
    }

    /// Replace the item count and jump to `page` (clamped), reporting once.
    pub fn reset(&mut self, total_items: usize, page: usize) -> PageWindow {
        self.paginator.set_total_items(total_items);
        self.paginator.go_to(page);
        self.emit()
    }

    /// Text shown between the previous and next controls.
    #[must_use]
    pub fn label(&self) -> String {
        self.window().label()
    }

    fn emit(&mut self) -> PageWindow {
        let window = self.paginator.window();
        (self.on_page_change)(&window);
        window
    }
}
