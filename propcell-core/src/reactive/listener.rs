//! Listener types for cells.
//!
//! A listener is a callback registered on a cell. Cells keep listeners in
//! registration order and hand out a [`Subscription`] for each one.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;

/// Unique identifier for a registered listener.
///
/// Removal is by identity: two registrations of the same closure get
/// different IDs and are removed independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Generate a new unique listener ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// What a cell tells its listeners during fan-out.
///
/// Ordinary listeners only ever see `Value`. `Conflict` is consumed by
/// pending threshold reads.
pub(crate) enum Notification<'a, A> {
    Value(&'a A),
    Conflict,
}

impl<A> Clone for Notification<'_, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for Notification<'_, A> {}

pub(crate) type Callback<A> = Arc<dyn Fn(Notification<'_, A>) + Send + Sync>;

/// Insertion-ordered listener registry. Iteration order is notification order.
pub(crate) type ListenerMap<A> = IndexMap<ListenerId, Callback<A>>;

/// Handle to a listener registration.
///
/// Calling [`unsubscribe`](Self::unsubscribe) removes exactly this listener
/// from its cell. Dropping the handle leaves the listener in place, so an
/// edge built by `connect` lives as long as its source cell unless it is
/// explicitly broken.
#[derive(Clone)]
pub struct Subscription {
    id: ListenerId,
    cell_id: u64,
    /// Removes the listener; returns whether it was still registered.
    detach: Arc<dyn Fn(ListenerId) -> bool + Send + Sync>,
}

impl Subscription {
    pub(crate) fn new<F>(id: ListenerId, cell_id: u64, detach: F) -> Self
    where
        F: Fn(ListenerId) -> bool + Send + Sync + 'static,
    {
        Self {
            id,
            cell_id,
            detach: Arc::new(detach),
        }
    }

    /// The listener this handle controls.
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// The cell the listener is registered on.
    pub fn cell_id(&self) -> u64 {
        self.cell_id
    }

    /// Remove the listener from its cell.
    ///
    /// Safe to call any number of times, and after the cell is gone. A
    /// listener removed mid-propagation is not invoked by the fan-out in
    /// progress.
    pub fn unsubscribe(&self) {
        if (self.detach)(self.id) {
            tracing::trace!(cell = self.cell_id, listener = ?self.id, "listener removed");
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("cell_id", &self.cell_id)
            .finish()
    }
}
