//! Pagination-aware navigation over a large ordered list.
//!
//! The state is an owned value the host threads through transitions rather
//! than ambient globals. Transitions never leave the state structurally
//! invalid: after every move the index stays inside the list, the page stays
//! inside `1..=total_pages`, and the index always lies on the current page.
//!
//! Page-crossing moves are two-phase. The transition commits the new page and
//! index and reports [`NavOutcome::PageChange`]; the host materializes the
//! visible subset for that page and then calls
//! [`NavigationState::page_materialized`] to resolve the target item, so an
//! item is never referenced before it has been paged in.

/// Direction of a next/previous step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

impl Direction {
    fn delta(self) -> isize {
        match self {
            Direction::Previous => -1,
            Direction::Next => 1,
        }
    }
}

/// Result of one navigation transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    /// Empty or single-item list, or invalid target; state unchanged.
    Unchanged,
    /// Same-page move; the item at `index` is resolvable immediately.
    Moved { index: usize },
    /// The page changed; resolve the item via `page_materialized` after the
    /// host has built the page.
    PageChange { page: usize, index: usize },
}

/// Current position in a paginated ordered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    len: usize,
    page_size: usize,
    current_page: usize,
    current_index: usize,
    pending_target: Option<usize>,
}

impl NavigationState {
    /// Start at the first item of a list of `len` entries.
    pub fn new(len: usize, page_size: usize) -> Self {
        Self {
            len,
            page_size: page_size.max(1),
            current_page: 1,
            current_index: 0,
            pending_target: None,
        }
    }

    /// Rebuild for a new underlying list, back at the first page.
    pub fn reset(&mut self, len: usize) {
        *self = Self::new(len, self.page_size);
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// 1-based current page.
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// 0-based index into the full ordered list.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Total page count; zero for an empty list.
    pub fn total_pages(&self) -> usize {
        self.len.div_ceil(self.page_size)
    }

    /// Page a given index falls on.
    pub fn page_for(&self, index: usize) -> usize {
        index / self.page_size + 1
    }

    /// Inclusive index bounds of one page, clamped to the list.
    pub fn page_bounds(&self, page: usize) -> (usize, usize) {
        let start = (page - 1) * self.page_size;
        let end = (page * self.page_size - 1).min(self.len.saturating_sub(1));
        (start, end)
    }

    /// Step one item forward or back, wrapping at the ends of the list.
    pub fn step(&mut self, direction: Direction) -> NavOutcome {
        if self.len <= 1 {
            return NavOutcome::Unchanged;
        }
        let proposed = self.current_index as isize + direction.delta();
        let (page, index) = if proposed < 0 {
            if self.current_page > 1 {
                let page = self.current_page - 1;
                (page, self.page_bounds(page).1)
            } else {
                // Wrap to the last item of the entire list.
                let index = self.len - 1;
                (self.page_for(index), index)
            }
        } else if proposed as usize >= self.len {
            if self.current_page < self.total_pages() {
                let page = self.current_page + 1;
                (page, self.page_bounds(page).0)
            } else {
                (1, 0)
            }
        } else {
            let index = proposed as usize;
            (self.page_for(index), index)
        };
        self.apply(page, index)
    }

    /// Jump directly to a page, keeping the index clamped into its bounds.
    /// Out-of-range pages are ignored.
    pub fn goto_page(&mut self, page: usize) -> bool {
        if page < 1 || page > self.total_pages() {
            return false;
        }
        let (start, end) = self.page_bounds(page);
        self.current_page = page;
        self.current_index = self.current_index.clamp(start, end);
        self.pending_target = None;
        true
    }

    /// Jump to a page and target a specific item on it (bookmark restore).
    /// The index is clamped into the page's bounds.
    pub fn show_at(&mut self, page: usize, index: usize) -> NavOutcome {
        if self.len == 0 || page < 1 || page > self.total_pages() {
            return NavOutcome::Unchanged;
        }
        let (start, end) = self.page_bounds(page);
        let index = index.clamp(start, end);
        self.current_page = page;
        self.current_index = index;
        self.pending_target = Some(index);
        NavOutcome::PageChange { page, index }
    }

    /// Second phase of a page-crossing move: the host reports the page has
    /// been materialized and receives the index of the item to resolve.
    pub fn page_materialized(&mut self) -> Option<usize> {
        self.pending_target.take()
    }

    fn apply(&mut self, page: usize, index: usize) -> NavOutcome {
        if page != self.current_page {
            self.current_page = page;
            self.current_index = index;
            self.pending_target = Some(index);
            NavOutcome::PageChange { page, index }
        } else {
            self.current_index = index;
            self.pending_target = None;
            NavOutcome::Moved { index }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn assert_consistent(nav: &NavigationState) {
        if nav.is_empty() {
            assert_eq!(nav.total_pages(), 0);
            return;
        }
        assert!(nav.current_index() < nav.len());
        assert!(nav.current_page() >= 1);
        assert!(nav.current_page() <= nav.total_pages());
        assert_eq!(
            nav.current_index() / nav.page_size() + 1,
            nav.current_page()
        );
    }

    #[test]
    fn empty_and_single_lists_never_move() {
        let mut empty = NavigationState::new(0, 100);
        assert_eq!(empty.step(Direction::Next), NavOutcome::Unchanged);
        assert_eq!(empty.total_pages(), 0);

        let mut single = NavigationState::new(1, 100);
        assert_eq!(single.step(Direction::Next), NavOutcome::Unchanged);
        assert_eq!(single.step(Direction::Previous), NavOutcome::Unchanged);
        assert_eq!(single.current_index(), 0);
    }

    #[test]
    fn same_page_moves_resolve_immediately() {
        let mut nav = NavigationState::new(250, 100);
        assert_eq!(nav.step(Direction::Next), NavOutcome::Moved { index: 1 });
        assert_eq!(nav.current_page(), 1);
        assert!(nav.page_materialized().is_none());
    }

    #[test]
    fn next_from_page_end_crosses_to_next_page() {
        let mut nav = NavigationState::new(250, 100);
        for _ in 0..98 {
            nav.step(Direction::Next);
        }
        assert_eq!(nav.current_index(), 98);
        assert_eq!(nav.step(Direction::Next), NavOutcome::Moved { index: 99 });
        let outcome = nav.step(Direction::Next);
        assert_eq!(
            outcome,
            NavOutcome::PageChange {
                page: 2,
                index: 100
            }
        );
        assert_eq!(nav.current_page(), 2);
        // The target only resolves after the page is materialized.
        assert_eq!(nav.page_materialized(), Some(100));
        assert_eq!(nav.page_materialized(), None);
        assert_consistent(&nav);
    }

    #[test]
    fn previous_from_page_start_lands_on_prior_page_end() {
        let mut nav = NavigationState::new(250, 100);
        nav.show_at(2, 100);
        nav.page_materialized();
        let outcome = nav.step(Direction::Previous);
        assert_eq!(outcome, NavOutcome::PageChange { page: 1, index: 99 });
        assert_consistent(&nav);
    }

    #[test]
    fn previous_from_list_start_wraps_to_list_end() {
        let mut nav = NavigationState::new(250, 100);
        let outcome = nav.step(Direction::Previous);
        assert_eq!(
            outcome,
            NavOutcome::PageChange {
                page: 3,
                index: 249
            }
        );
        assert_consistent(&nav);
    }

    #[test]
    fn next_from_list_end_wraps_to_first_item() {
        let mut nav = NavigationState::new(250, 100);
        nav.show_at(3, 249);
        nav.page_materialized();
        let outcome = nav.step(Direction::Next);
        assert_eq!(outcome, NavOutcome::PageChange { page: 1, index: 0 });
        assert_consistent(&nav);
    }

    #[test]
    fn wrap_on_single_page_list_stays_on_page() {
        let mut nav = NavigationState::new(5, 100);
        assert_eq!(
            nav.step(Direction::Previous),
            NavOutcome::Moved { index: 4 }
        );
        assert_eq!(nav.step(Direction::Next), NavOutcome::Moved { index: 0 });
        assert_consistent(&nav);
    }

    #[test]
    fn goto_page_ignores_out_of_range_targets() {
        let mut nav = NavigationState::new(250, 100);
        assert!(!nav.goto_page(0));
        assert!(!nav.goto_page(4));
        assert_eq!(nav.current_page(), 1);
        assert!(nav.goto_page(3));
        assert_eq!(nav.current_page(), 3);
        // Index clamps into the short last page.
        assert_eq!(nav.current_index(), 200);
        assert_consistent(&nav);
    }

    #[test]
    fn show_at_clamps_index_into_page_bounds() {
        let mut nav = NavigationState::new(250, 100);
        let outcome = nav.show_at(3, 9999);
        assert_eq!(
            outcome,
            NavOutcome::PageChange {
                page: 3,
                index: 249
            }
        );
        assert_eq!(nav.show_at(9, 0), NavOutcome::Unchanged);
        assert_consistent(&nav);
    }

    #[test]
    fn random_walks_keep_invariants() {
        let mut rng = StdRng::seed_from_u64(7);
        for &(len, page_size) in &[(2usize, 1usize), (7, 3), (250, 100), (1000, 100), (101, 25)] {
            let mut nav = NavigationState::new(len, page_size);
            for _ in 0..500 {
                let direction = if rng.random::<bool>() {
                    Direction::Next
                } else {
                    Direction::Previous
                };
                nav.step(direction);
                nav.page_materialized();
                assert_consistent(&nav);
            }
        }
    }
}
