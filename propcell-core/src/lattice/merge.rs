//! Merge Strategies
//!
//! A merge strategy is the join operation of a cell's lattice. It receives
//! the value the cell already holds and an incoming value, and decides
//! whether the incoming value adds information (`Changed`), adds nothing
//! (`Unchanged`), or contradicts what is known (`Conflict`).
//!
//! # Termination
//!
//! Cells wired into a cycle stop propagating only when every strategy on
//! the cycle eventually answers `Unchanged`. A strategy must therefore be
//! well-founded: writing the same input repeatedly must settle. Nothing in
//! the cell enforces this.
//!
//! Strategies must also be pure. They run while the cell's state is locked
//! and must not touch the cell they belong to.

use std::sync::Arc;

use super::Update;

/// A shared, type-erased merge strategy.
pub type Merge<A> = Arc<dyn Fn(&A, &A) -> Update<A> + Send + Sync>;

/// Equal values carry no new information; anything else replaces the old value.
///
/// This is the strategy used by `Cell::default()`.
pub fn equality<A>() -> impl Fn(&A, &A) -> Update<A> + Send + Sync + 'static
where
    A: PartialEq + Clone + 'static,
{
    |old, new| {
        if old == new {
            Update::unchanged(old.clone())
        } else {
            Update::changed(new.clone())
        }
    }
}

/// Floats that moved by less than `epsilon` carry no new information.
///
/// The old value is kept on a near-miss so that rounding noise travelling
/// around a cycle cannot drift the cell.
pub fn within(epsilon: f64) -> impl Fn(&f64, &f64) -> Update<f64> + Send + Sync + 'static {
    move |old, new| {
        if (old - new).abs() < epsilon {
            Update::unchanged(*old)
        } else {
            Update::changed(*new)
        }
    }
}

/// Join under `>`: only a strictly larger value is new information.
pub fn max<A>() -> impl Fn(&A, &A) -> Update<A> + Send + Sync + 'static
where
    A: PartialOrd + Clone + 'static,
{
    |old, new| {
        if new > old {
            Update::changed(new.clone())
        } else {
            Update::unchanged(old.clone())
        }
    }
}

/// Join under `<`: only a strictly smaller value is new information.
pub fn min<A>() -> impl Fn(&A, &A) -> Update<A> + Send + Sync + 'static
where
    A: PartialOrd + Clone + 'static,
{
    |old, new| {
        if new < old {
            Update::changed(new.clone())
        } else {
            Update::unchanged(old.clone())
        }
    }
}

/// Treat the held value as a final assertion.
///
/// Whatever `inner` would report as new information is a contradiction of
/// the assertion and becomes `Conflict`. Values `inner` accepts as
/// `Unchanged` still pass through.
pub fn sealed<A, M>(inner: M) -> impl Fn(&A, &A) -> Update<A> + Send + Sync + 'static
where
    A: 'static,
    M: Fn(&A, &A) -> Update<A> + Send + Sync + 'static,
{
    move |old, new| match inner(old, new) {
        Update::Changed(_) => Update::Conflict,
        other => other,
    }
}

/// Any disagreement with the held value is a conflict.
pub fn exclusive<A>() -> impl Fn(&A, &A) -> Update<A> + Send + Sync + 'static
where
    A: PartialEq + Clone + 'static,
{
    sealed(equality())
}
