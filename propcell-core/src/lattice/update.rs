//! The Update Lattice
//!
//! An `Update` is the value a cell holds. It records both the payload and
//! whether the last merge added information that listeners have not seen.
//!
//! # States
//!
//! ```text
//!   None ──first write──▶ Changed(v) ◀──▶ Unchanged(v)
//!                              │               │
//!                              └──▶ Conflict ◀─┘   (absorbing)
//! ```
//!
//! `None` only ever precedes the first successful merge, and once a cell
//! reaches `Conflict` every later merge leaves it there.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A lattice value over the domain `A`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Update<A> {
    /// No information yet.
    None,

    /// Holds a value; the last merge added no new information.
    Unchanged(A),

    /// Holds a value; the last merge added new information.
    Changed(A),

    /// Two pieces of information were incompatible. Absorbs every merge.
    Conflict,
}

impl<A> Update<A> {
    /// Wrap a value that adds no new information.
    pub fn unchanged(value: A) -> Self {
        Self::Unchanged(value)
    }

    /// Wrap a value that adds new information.
    pub fn changed(value: A) -> Self {
        Self::Changed(value)
    }

    /// The payload, if this state carries one.
    pub fn value(&self) -> Option<&A> {
        match self {
            Self::Unchanged(value) | Self::Changed(value) => Some(value),
            Self::None | Self::Conflict => None,
        }
    }

    /// Consume the update, returning its payload if it carries one.
    pub fn into_value(self) -> Option<A> {
        match self {
            Self::Unchanged(value) | Self::Changed(value) => Some(value),
            Self::None | Self::Conflict => None,
        }
    }

    /// Whether the last merge added new information.
    ///
    /// Only `Changed` fans out to listeners.
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }

    /// Whether this is the absorbing `Conflict` state.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict)
    }

    /// Whether no information has arrived yet.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Merge an incoming value into this state.
    ///
    /// - `None` always becomes `Changed(incoming)`; the strategy is not
    ///   consulted for the first value.
    /// - `Unchanged(v)` and `Changed(v)` delegate to `strategy(v, incoming)`.
    /// - `Conflict` stays `Conflict`.
    pub fn merge<M>(&self, incoming: A, strategy: &M) -> Update<A>
    where
        M: Fn(&A, &A) -> Update<A> + ?Sized,
    {
        match self {
            Self::None => Self::Changed(incoming),
            Self::Unchanged(current) | Self::Changed(current) => strategy(current, &incoming),
            Self::Conflict => Self::Conflict,
        }
    }

    /// Deliver the payload to `listener`, if there is one.
    pub fn propagate<F>(&self, listener: F)
    where
        F: FnOnce(&A),
    {
        if let Some(value) = self.value() {
            listener(value);
        }
    }

    /// Whether the payload satisfies `predicate`. `None` and `Conflict`
    /// never do.
    pub fn satisfies<P>(&self, predicate: P) -> bool
    where
        P: FnOnce(&A) -> bool,
    {
        self.value().is_some_and(predicate)
    }
}

impl<A> Default for Update<A> {
    fn default() -> Self {
        Self::None
    }
}

impl<A: fmt::Display> fmt::Display for Update<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("<none>"),
            Self::Unchanged(value) => write!(f, "{value}"),
            Self::Changed(value) => write!(f, "{value} (changed)"),
            Self::Conflict => f.write_str("<conflict>"),
        }
    }
}
