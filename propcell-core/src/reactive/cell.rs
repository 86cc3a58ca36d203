//! Cell Implementation
//!
//! A Cell is the fundamental propagation primitive. It holds an [`Update`],
//! a merge strategy, and an ordered list of listeners.
//!
//! # How Cells Work
//!
//! 1. A write merges the incoming value into the current state using the
//!    cell's strategy.
//!
//! 2. If the merge produced new information (`Changed`), every listener is
//!    invoked with the new value, in registration order, before `write`
//!    returns.
//!
//! 3. A listener may itself write other cells. That nested propagation
//!    completes before the next listener of the outer write runs, so
//!    propagation is depth-first.
//!
//! 4. A merge that produces `Unchanged` reaches nobody. This is what stops
//!    cycles built with [`connect`].
//!
//! # Thread Safety
//!
//! Each cell serializes its state and its listener list behind its own
//! locks (always state first, then listeners). No lock is held while a
//! listener runs, so listeners are free to write any cell, including the
//! one that is propagating.

use std::fmt::{self, Debug, Display};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;
use smallvec::SmallVec;
use tokio::sync::oneshot;

use super::context::PropagationContext;
use super::listener::{Callback, ListenerId, ListenerMap, Notification, Subscription};
use super::read::Read;
use crate::error::ReadError;
use crate::lattice::{merge, Merge, Update};

/// Counter for generating unique cell IDs.
static CELL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique cell ID.
fn next_cell_id() -> u64 {
    CELL_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Listeners captured at the start of a fan-out.
type Snapshot<A> = SmallVec<[(ListenerId, Callback<A>); 4]>;

/// Box a notification callback.
fn callback<A, F>(f: F) -> Callback<A>
where
    F: Fn(Notification<'_, A>) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A mutable binding whose value only moves forward along a lattice.
///
/// Cloning a `Cell` produces another handle to the same cell.
///
/// # Example
///
/// ```rust
/// use propcell_core::lattice::merge;
/// use propcell_core::reactive::Cell;
///
/// let highest = Cell::empty(merge::max());
/// highest.write(3);
/// highest.write(1);
/// assert_eq!(highest.get(), Some(3));
/// ```
pub struct Cell<A>
where
    A: Clone + Send + Sync + 'static,
{
    /// Unique identifier for this cell.
    id: u64,

    /// Join operation for this cell's lattice. Fixed for the cell's lifetime.
    merge: Merge<A>,

    /// The current lattice value.
    state: Arc<Mutex<Update<A>>>,

    /// Registered listeners in notification order.
    listeners: Arc<Mutex<ListenerMap<A>>>,
}

impl<A> Cell<A>
where
    A: Clone + Send + Sync + 'static,
{
    fn with_state<M>(state: Update<A>, merge: M) -> Self
    where
        M: Fn(&A, &A) -> Update<A> + Send + Sync + 'static,
    {
        Self {
            id: next_cell_id(),
            merge: Arc::new(merge),
            state: Arc::new(Mutex::new(state)),
            listeners: Arc::new(Mutex::new(IndexMap::new())),
        }
    }

    /// Create a cell with no information yet.
    pub fn empty<M>(merge: M) -> Self
    where
        M: Fn(&A, &A) -> Update<A> + Send + Sync + 'static,
    {
        Self::with_state(Update::None, merge)
    }

    /// Create a cell holding an initial value.
    ///
    /// The value counts as already settled: nothing is notified.
    pub fn new<M>(value: A, merge: M) -> Self
    where
        M: Fn(&A, &A) -> Update<A> + Send + Sync + 'static,
    {
        Self::with_state(Update::Unchanged(value), merge)
    }

    /// Get the cell's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// A copy of the current lattice value.
    pub fn snapshot(&self) -> Update<A> {
        self.state.lock().clone()
    }

    /// The current value, if the cell holds one.
    pub fn get(&self) -> Option<A> {
        self.state.lock().value().cloned()
    }

    /// Whether the cell has reached the absorbing `Conflict` state.
    pub fn is_conflict(&self) -> bool {
        self.state.lock().is_conflict()
    }

    /// Write a value into the cell, obeying its merge strategy.
    ///
    /// If the merge adds information, all listeners run before this returns,
    /// along with anything they write in turn. If the cell has just become
    /// `Conflict`, pending threshold reads are rejected.
    pub fn write(&self, value: A) {
        let _ctx = PropagationContext::enter(self.id);

        // The fan-out list is taken under the state lock, so a concurrent
        // `listen` either replays this value or receives it, never both.
        let (merged, was_conflict, snapshot) = {
            let mut state = self.state.lock();
            let was_conflict = state.is_conflict();
            let merged = state.merge(value, &*self.merge);
            *state = merged.clone();

            let notifies = merged.is_changed() || (merged.is_conflict() && !was_conflict);
            let snapshot = if notifies {
                self.snapshot_listeners()
            } else {
                SmallVec::new()
            };
            (merged, was_conflict, snapshot)
        };

        match merged {
            Update::Changed(value) => {
                tracing::trace!(
                    cell = self.id,
                    depth = PropagationContext::depth(),
                    "new information"
                );
                self.notify(snapshot, Notification::Value(&value));
            }
            Update::Conflict if !was_conflict => {
                tracing::debug!(cell = self.id, "cell entered conflict");
                self.notify(snapshot, Notification::Conflict);
            }
            _ => {
                tracing::trace!(cell = self.id, "no new information");
            }
        }
    }

    /// Register a callback that receives every new value.
    ///
    /// If the cell already holds a value, the callback is invoked with it
    /// once before this returns, so a late subscriber starts in sync.
    pub fn listen<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        let listener = Arc::new(listener);
        let replay = Arc::clone(&listener);

        let (subscription, current) = {
            let state = self.state.lock();
            let subscription = self.attach(
                ListenerId::new(),
                callback::<A, _>(move |notification| {
                    if let Notification::Value(value) = notification {
                        listener(value);
                    }
                }),
            );
            (subscription, state.value().cloned())
        };

        if let Some(value) = current {
            replay(&value);
        }

        subscription
    }

    /// Wait until the cell holds a value satisfying `predicate`.
    ///
    /// Resolves at once if the current value already qualifies, and fails at
    /// once if the cell is in conflict. Otherwise the predicate is checked
    /// against every new value until one passes or the cell conflicts.
    ///
    /// Like a merge strategy, the predicate must not touch this cell.
    pub fn read<P>(&self, predicate: P) -> Read<A>
    where
        P: Fn(&A) -> bool + Send + Sync + 'static,
    {
        let state = self.state.lock();

        if state.is_conflict() {
            return Read::settled(self.id, Err(ReadError::Conflict { cell: self.id }));
        }
        if let Some(value) = state.value().filter(|value| predicate(value)) {
            return Read::settled(self.id, Ok(value.clone()));
        }

        let (sender, receiver) = oneshot::channel();
        let sender = Mutex::new(Some(sender));
        let id = ListenerId::new();
        let cell_id = self.id;
        let registry = Arc::downgrade(&self.listeners);

        let subscription = self.attach(
            id,
            callback::<A, _>(move |notification| {
                let outcome = match notification {
                    Notification::Value(value) if predicate(value) => Ok(value.clone()),
                    Notification::Value(_) => return,
                    Notification::Conflict => Err(ReadError::Conflict { cell: cell_id }),
                };

                if let Some(listeners) = registry.upgrade() {
                    listeners.lock().shift_remove(&id);
                }
                if let Some(sender) = sender.lock().take() {
                    tracing::debug!(cell = cell_id, ok = outcome.is_ok(), "threshold read settled");
                    let _ = sender.send(outcome);
                }
            }),
        );
        drop(state);

        Read::waiting(self.id, receiver, subscription)
    }

    /// Create a handle that does not keep the cell alive.
    pub fn downgrade(&self) -> WeakCell<A> {
        WeakCell {
            id: self.id,
            merge: Arc::clone(&self.merge),
            state: Arc::downgrade(&self.state),
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Get the number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Add a listener and build its unsubscribe handle.
    fn attach(&self, id: ListenerId, callback: Callback<A>) -> Subscription {
        self.listeners.lock().insert(id, callback);
        tracing::trace!(cell = self.id, listener = ?id, "listener added");

        let registry = Arc::downgrade(&self.listeners);
        Subscription::new(id, self.id, move |id| {
            registry
                .upgrade()
                .is_some_and(|listeners| listeners.lock().shift_remove(&id).is_some())
        })
    }

    /// Listeners registered right now, in notification order.
    fn snapshot_listeners(&self) -> Snapshot<A> {
        self.listeners
            .lock()
            .iter()
            .map(|(id, listener)| (*id, Arc::clone(listener)))
            .collect()
    }

    /// Invoke every listener in `snapshot`.
    ///
    /// Listeners removed by an earlier listener of the same fan-out are
    /// skipped. Listeners added during the fan-out wait for the next one.
    fn notify(&self, snapshot: Snapshot<A>, notification: Notification<'_, A>) {
        for (id, listener) in snapshot {
            if !self.listeners.lock().contains_key(&id) {
                continue;
            }
            listener(notification);
        }
    }
}

impl<A> Default for Cell<A>
where
    A: Clone + PartialEq + Send + Sync + 'static,
{
    /// An empty cell using equality as its merge strategy.
    fn default() -> Self {
        Self::empty(merge::equality())
    }
}

impl<A> Clone for Cell<A>
where
    A: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            merge: Arc::clone(&self.merge),
            state: Arc::clone(&self.state),
            listeners: Arc::clone(&self.listeners),
        }
    }
}

impl<A> Debug for Cell<A>
where
    A: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("id", &self.id)
            .field("state", &self.snapshot())
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

impl<A> Display for Cell<A>
where
    A: Clone + Send + Sync + Display + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cell {{ {} }}", self.snapshot())
    }
}

/// A non-owning handle to a [`Cell`].
///
/// Obtained from [`Cell::downgrade`]. Upgrading fails once every `Cell`
/// handle has been dropped.
pub struct WeakCell<A>
where
    A: Clone + Send + Sync + 'static,
{
    id: u64,
    merge: Merge<A>,
    state: Weak<Mutex<Update<A>>>,
    listeners: Weak<Mutex<ListenerMap<A>>>,
}

impl<A> WeakCell<A>
where
    A: Clone + Send + Sync + 'static,
{
    /// The ID of the cell this handle points to.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Recover a full handle, if the cell is still alive.
    pub fn upgrade(&self) -> Option<Cell<A>> {
        Some(Cell {
            id: self.id,
            merge: Arc::clone(&self.merge),
            state: self.state.upgrade()?,
            listeners: self.listeners.upgrade()?,
        })
    }
}

impl<A> Clone for WeakCell<A>
where
    A: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            merge: Arc::clone(&self.merge),
            state: Weak::clone(&self.state),
            listeners: Weak::clone(&self.listeners),
        }
    }
}

impl<A> Debug for WeakCell<A>
where
    A: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakCell").field("id", &self.id).finish()
    }
}

/// Make `target` depend on `source`.
///
/// Every value `source` delivers is passed through `transform` and written
/// into `target`, obeying `target`'s merge strategy. If `source` already
/// holds a value, it flows into `target` immediately.
///
/// Edges may form cycles. A cycle terminates once every cell on it answers
/// `Unchanged`, which is the responsibility of the merge strategies.
///
/// The edge keeps `target` alive for as long as it is registered on
/// `source`. Cells wired into a cycle keep each other alive until their
/// edges are unsubscribed.
pub fn connect<A, B, F>(transform: F, source: &Cell<A>, target: &Cell<B>) -> Subscription
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
    F: Fn(&A) -> B + Send + Sync + 'static,
{
    let target = target.clone();
    source.listen(move |value| target.write(transform(value)))
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
