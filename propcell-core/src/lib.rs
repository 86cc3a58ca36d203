//! Propcell Core
//!
//! This crate provides monotonic-merge reactive cells. A cell's value can
//! only move forward along a join-semilattice defined by its merge
//! strategy, and its listeners hear about it only when a write adds
//! information. This lets cells reference each other cyclically without
//! update loops.
//!
//! It implements:
//!
//! - The update lattice and a set of merge strategies
//! - Cells with synchronous, depth-first propagation
//! - Listening, connecting cells, and threshold reads
//!
//! # Architecture
//!
//! - `lattice`: the [`Update`](lattice::Update) lattice and merge strategies
//! - `reactive`: cells, listeners, connections, and threshold reads
//! - `error`: the [`ReadError`](error::ReadError) returned by threshold reads
//!
//! # Example
//!
//! ```rust
//! use propcell_core::lattice::merge;
//! use propcell_core::reactive::{connect, Cell};
//!
//! let celsius = Cell::empty(merge::within(0.01));
//! let fahrenheit = Cell::empty(merge::within(0.01));
//!
//! // A cycle: each cell derives the other.
//! connect(|c: &f64| c * 9.0 / 5.0 + 32.0, &celsius, &fahrenheit);
//! connect(|f: &f64| (f - 32.0) * 5.0 / 9.0, &fahrenheit, &celsius);
//!
//! celsius.write(100.0);
//! assert_eq!(fahrenheit.get(), Some(212.0));
//! ```

pub mod error;
pub mod lattice;
pub mod reactive;

pub use error::ReadError;
pub use lattice::{Merge, Update};
pub use reactive::{connect, Cell, Subscription};
