//! Threshold Reads
//!
//! A [`Read`] resolves once, with the first value of a cell that satisfies
//! a predicate, or fails once the cell is in conflict. It is backed by a
//! oneshot channel fed from a temporary listener that removes itself on
//! the first outcome.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use super::listener::Subscription;
use crate::error::ReadError;

/// A pending threshold read on a cell.
///
/// Dropping an unresolved `Read` removes its listener from the cell.
#[must_use = "a threshold read does nothing unless awaited"]
pub struct Read<A> {
    cell_id: u64,
    receiver: oneshot::Receiver<Result<A, ReadError>>,
    pending: Option<Subscription>,
}

impl<A> Read<A> {
    /// A read whose outcome is already known.
    pub(crate) fn settled(cell_id: u64, outcome: Result<A, ReadError>) -> Self {
        let (sender, receiver) = oneshot::channel();
        // The receiver is alive, so the send cannot fail.
        let _ = sender.send(outcome);
        Self {
            cell_id,
            receiver,
            pending: None,
        }
    }

    /// A read that waits on a listener registered as `subscription`.
    pub(crate) fn waiting(
        cell_id: u64,
        receiver: oneshot::Receiver<Result<A, ReadError>>,
        subscription: Subscription,
    ) -> Self {
        Self {
            cell_id,
            receiver,
            pending: Some(subscription),
        }
    }

    /// The cell being read.
    pub fn cell_id(&self) -> u64 {
        self.cell_id
    }
}

impl<A> Future for Read<A> {
    type Output = Result<A, ReadError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => {
                self.pending = None;
                Poll::Ready(outcome)
            }
            Poll::Ready(Err(_)) => {
                self.pending = None;
                Poll::Ready(Err(ReadError::Abandoned { cell: self.cell_id }))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<A> Drop for Read<A> {
    fn drop(&mut self) {
        if let Some(subscription) = self.pending.take() {
            subscription.unsubscribe();
        }
    }
}

impl<A> std::fmt::Debug for Read<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Read")
            .field("cell_id", &self.cell_id)
            .field("pending", &self.pending.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::ListenerId;
    use futures_util::FutureExt;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn settled_read_resolves_immediately() {
        let read = Read::settled(3, Ok(42));
        assert_eq!(read.await, Ok(42));

        let read = Read::<i32>::settled(3, Err(ReadError::Conflict { cell: 3 }));
        assert_eq!(read.await, Err(ReadError::Conflict { cell: 3 }));
    }

    #[test]
    fn dropped_sender_abandons_read() {
        let (sender, receiver) = oneshot::channel::<Result<i32, ReadError>>();
        let subscription = Subscription::new(ListenerId::new(), 5, |_| true);
        let read = Read::waiting(5, receiver, subscription);

        drop(sender);
        assert_eq!(
            read.now_or_never(),
            Some(Err(ReadError::Abandoned { cell: 5 }))
        );
    }

    #[test]
    fn dropping_pending_read_unsubscribes() {
        let (_sender, receiver) = oneshot::channel::<Result<i32, ReadError>>();
        let removed = Arc::new(AtomicBool::new(false));
        let removed_clone = removed.clone();
        let subscription = Subscription::new(ListenerId::new(), 1, move |_| {
            removed_clone.store(true, Ordering::SeqCst);
            true
        });

        let mut read = Read::waiting(1, receiver, subscription);
        assert!((&mut read).now_or_never().is_none());
        assert!(!removed.load(Ordering::SeqCst));

        drop(read);
        assert!(removed.load(Ordering::SeqCst));
    }
}
