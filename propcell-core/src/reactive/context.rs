//! Propagation Context
//!
//! Tracks which cells are currently fanning out on this thread. A write
//! that triggers a listener that writes another cell nests one level
//! deeper, so the stack mirrors the depth-first propagation path.
//!
//! # Depth Guard
//!
//! A merge strategy that never answers `Unchanged` makes a cycle of cells
//! recurse forever. In debug builds, entering a context deeper than
//! [`PropagationContext::max_depth`] panics with the offending chain of
//! cell ids instead of overflowing the stack. Release builds skip the check.
//!
//! The limit is per thread and defaults to [`DEFAULT_MAX_DEPTH`].

use std::cell::{Cell as StdCell, RefCell};

/// Default nesting limit for propagation on a thread.
pub const DEFAULT_MAX_DEPTH: usize = 512;

thread_local! {
    static PROPAGATION_STACK: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };
    static MAX_DEPTH: StdCell<usize> = const { StdCell::new(DEFAULT_MAX_DEPTH) };
}

/// Guard that pops the context when dropped.
///
/// Dropping in reverse order of entry keeps the stack consistent even when
/// a listener panics and the stack unwinds.
pub struct PropagationContext {
    cell_id: u64,
}

impl PropagationContext {
    /// Enter a propagation context for the given cell.
    pub fn enter(cell_id: u64) -> Self {
        PROPAGATION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();

            if cfg!(debug_assertions) {
                let limit = Self::max_depth();
                if stack.len() >= limit {
                    let tail: Vec<u64> = stack.iter().rev().take(16).rev().copied().collect();
                    // Release the borrow before unwinding so outer guards can pop.
                    drop(stack);
                    panic!(
                        "propagation exceeded depth {limit} at cell {cell_id} (most recent cells: {tail:?}); \
                         a merge strategy on this cycle never reports Unchanged"
                    );
                }
            }

            stack.push(cell_id);
        });

        Self { cell_id }
    }

    /// Number of cells currently propagating on this thread.
    pub fn depth() -> usize {
        PROPAGATION_STACK.with(|stack| stack.borrow().len())
    }

    /// The innermost cell currently propagating, if any.
    pub fn current_cell() -> Option<u64> {
        PROPAGATION_STACK.with(|stack| stack.borrow().last().copied())
    }

    /// The nesting limit for this thread.
    pub fn max_depth() -> usize {
        MAX_DEPTH.with(StdCell::get)
    }

    /// Change the nesting limit for this thread.
    pub fn set_max_depth(limit: usize) {
        MAX_DEPTH.with(|max| max.set(limit));
    }
}

impl Drop for PropagationContext {
    fn drop(&mut self) {
        PROPAGATION_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(cell_id) = popped {
                debug_assert_eq!(
                    cell_id, self.cell_id,
                    "PropagationContext mismatch: expected {}, got {}",
                    self.cell_id, cell_id
                );
            }
        });
    }
}
