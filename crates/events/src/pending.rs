//! Handle for the eventual result of a scheduled store operation.

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use bistro_core::{DomainError, DomainResult};
use tokio::sync::oneshot;

/// Sending half: the scheduled task completes the operation through it.
#[derive(Debug)]
pub struct Completer<T> {
    tx: oneshot::Sender<DomainResult<T>>,
}

impl<T> Completer<T> {
    /// Deliver the result. A caller that stopped listening is not an error:
    /// the store mutation has already happened either way.
    pub fn complete(self, result: DomainResult<T>) {
        let _ = self.tx.send(result);
    }
}

/// Future resolving to the result of a store operation.
///
/// Dropping a `Pending` does not cancel the operation. If the task is
/// discarded without running (its scheduler was dropped), the future resolves
/// to [`DomainError::Interrupted`].
#[derive(Debug)]
#[must_use = "the operation still runs, but its result is lost unless awaited"]
pub struct Pending<T> {
    rx: oneshot::Receiver<DomainResult<T>>,
}

/// Create a linked completer/pending pair.
pub fn pending<T>() -> (Completer<T>, Pending<T>) {
    let (tx, rx) = oneshot::channel();
    (Completer { tx }, Pending { rx })
}

impl<T> Pending<T> {
    /// A handle that is already resolved (used for fail-fast checks).
    pub fn ready(result: DomainResult<T>) -> Self {
        let (completer, pending) = pending();
        completer.complete(result);
        pending
    }

    /// Non-blocking poll: `None` while the operation is still in flight.
    pub fn try_take(&mut self) -> Option<DomainResult<T>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(DomainError::Interrupted)),
        }
    }
}

impl<T> Future for Pending<T> {
    type Output = DomainResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(DomainError::Interrupted)))
    }
}
