//! Error types.
//!
//! Writes, listens and connections cannot fail. The only fallible operation
//! is a threshold read, which can be refused by a conflicted cell.

/// Why a threshold read did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    /// The cell was, or became, `Conflict` before the predicate held.
    #[error("cell {cell} holds conflicting information")]
    Conflict { cell: u64 },

    /// Every handle to the cell was dropped before the predicate held.
    #[error("cell {cell} was dropped before its value reached the threshold")]
    Abandoned { cell: u64 },
}

impl ReadError {
    /// The cell the read was waiting on.
    pub fn cell(&self) -> u64 {
        match self {
            Self::Conflict { cell } | Self::Abandoned { cell } => *cell,
        }
    }
}
