//! Promises resolved on demand by the test.

use futures::FutureExt;
use futures::channel::oneshot;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeferredError {
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("resolver dropped without settling")]
    Dropped,
}

/// Settles when the paired [`Resolver`] resolves or rejects.
pub struct Promise<T> {
    receiver: oneshot::Receiver<Result<T, String>>,
}

/// Settles the paired [`Promise`]. Consumed by settling.
pub struct Resolver<T> {
    sender: oneshot::Sender<Result<T, String>>,
}

/// A promise the test settles explicitly, e.g. to hold a component in
/// its loading state and then finish the request inside `act_async`.
pub fn deferred<T>() -> (Promise<T>, Resolver<T>) {
    let (sender, receiver) = oneshot::channel();
    (Promise { receiver }, Resolver { sender })
}

impl<T> Resolver<T> {
    /// Returns false if the promise was already dropped.
    pub fn resolve(self, value: T) -> bool {
        self.sender.send(Ok(value)).is_ok()
    }

    /// Returns false if the promise was already dropped.
    pub fn reject(self, reason: impl Into<String>) -> bool {
        self.sender.send(Err(reason.into())).is_ok()
    }
}

impl<T> Future for Promise<T> {
    type Output = Result<T, DeferredError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.receiver.poll_unpin(cx).map(|settled| match settled {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(reason)) => Err(DeferredError::Rejected(reason)),
            Err(oneshot::Canceled) => Err(DeferredError::Dropped),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_resolve() {
        let (promise, resolver) = deferred();
        assert!(resolver.resolve(5));
        assert_eq!(block_on(promise), Ok(5));
    }

    #[test]
    fn test_reject() {
        let (promise, resolver) = deferred::<u8>();
        resolver.reject("nope");
        assert_eq!(
            block_on(promise),
            Err(DeferredError::Rejected("nope".into()))
        );
    }

    #[test]
    fn test_dropped_resolver() {
        let (promise, resolver) = deferred::<u8>();
        drop(resolver);
        assert_eq!(block_on(promise), Err(DeferredError::Dropped));
    }

    #[test]
    fn test_resolve_after_promise_dropped() {
        let (promise, resolver) = deferred::<u8>();
        drop(promise);
        assert!(!resolver.resolve(1));
    }
}
