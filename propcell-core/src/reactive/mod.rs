//! Propagation Primitives
//!
//! This module implements cells and the operations that wire them into a
//! dependency network: writing, listening, connecting, and waiting for a
//! threshold.
//!
//! # Concepts
//!
//! ## Cells
//!
//! A [`Cell`] holds a lattice value ([`Update`](crate::lattice::Update)) and
//! a merge strategy. A write merges new information into the cell and, only
//! if something was learned, notifies the cell's listeners.
//!
//! ## Listeners
//!
//! Listeners run synchronously inside `write`, in registration order. A
//! listener that writes another cell nests that cell's propagation inside
//! the current one (depth-first). Each registration returns a
//! [`Subscription`] that removes it.
//!
//! ## Connections
//!
//! [`connect`] is a listener that writes a transformed value into another
//! cell. There is no graph structure: the network exists only as listener
//! registrations, and it may contain cycles.
//!
//! ## Threshold Reads
//!
//! [`Cell::read`] returns a [`Read`] future that resolves with the first
//! value satisfying a predicate, or fails if the cell conflicts.
//!
//! # Termination
//!
//! A cycle stops because every cell on it eventually reports `Unchanged`.
//! That is a property of the merge strategies; the cells trust it. In debug
//! builds, [`PropagationContext`] turns runaway recursion into a panic.

mod cell;
mod context;
mod listener;
mod read;

pub use cell::{connect, Cell, WeakCell};
pub use context::{PropagationContext, DEFAULT_MAX_DEPTH};
pub use listener::{ListenerId, Subscription};
pub use read::Read;
