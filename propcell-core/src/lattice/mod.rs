//! Information Lattice
//!
//! A cell never stores a bare value. It stores an [`Update`], a point in a
//! small lattice that also says whether the last write taught the cell
//! anything. The join of that lattice is supplied per cell as a merge
//! strategy (see [`merge`]).
//!
//! # Why a lattice
//!
//! Propagation is driven by information, not by assignment. A write that
//! the strategy judges `Unchanged` reaches no listener, so a cycle of cells
//! stops as soon as every cell on it has nothing new to say. This is what
//! lets cells reference each other without a dependency graph or cycle
//! detection.
//!
//! Richer lattices, such as bounded values whose upper bounds may collide,
//! are expressed as strategies (for example [`merge::sealed`]) rather than
//! as extra states.

mod update;
pub mod merge;

pub use update::Update;
pub use merge::Merge;
