//! Subscriptions: the control objects connecting one publisher to one
//! subscriber.
//!
//! A subscriber only ever sees a subscription as `Arc<dyn Subscription>`.
//! Through it the subscriber grants demand with [`Subscription::request`] and
//! stops the stream with [`Cancellable::cancel`]. Each built-in publisher
//! keeps its subscription type private.
//!
//! Termination is exactly-once: whichever of natural completion or
//! cancellation reaches the subscription first wins, and every later
//! `request` or `cancel` is a no-op.
//!
//! # Example
//!
//! ```ignore
//! let publisher = Just::new("Hello World");
//! let cancellable = publisher.sink(
//!     |value| println!("got {value}"),
//!     |completion| println!("done: {completion:?}"),
//! );
//! // Dropping the handle cancels the subscription if it is still live.
//! drop(cancellable);
//! ```

pub(crate) mod emitter;
mod slot;

use crate::types::Demand;

pub use slot::SubscriptionSlot;

/// Something that can be cancelled.
///
/// Cancelling must be idempotent and safe to call from any thread.
pub trait Cancellable {
    fn cancel(&self);
}

/// Capability a subscriber uses to drive its subscription.
pub trait Subscription: Cancellable + Send + Sync {
    /// Grant `demand` additional elements.
    ///
    /// Zero demand and requests after termination are ignored. Values may be
    /// delivered synchronously before this call returns.
    fn request(&self, demand: Demand);
}

/// Type-erased cancellable that cancels when dropped.
#[must_use = "dropping an AnyCancellable cancels what it holds"]
pub struct AnyCancellable {
    inner: Box<dyn Cancellable + Send + Sync>,
}

impl AnyCancellable {
    pub fn new<C>(cancellable: C) -> Self
    where
        C: Cancellable + Send + Sync + 'static,
    {
        Self {
            inner: Box::new(cancellable),
        }
    }
}

impl Cancellable for AnyCancellable {
    fn cancel(&self) {
        self.inner.cancel();
    }
}

impl Drop for AnyCancellable {
    fn drop(&mut self) {
        self.inner.cancel();
    }
}

impl std::fmt::Debug for AnyCancellable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnyCancellable").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counter(Arc<AtomicUsize>);

    impl Cancellable for Counter {
        fn cancel(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_any_cancellable_cancels_on_drop() {
        let count = Arc::new(AtomicUsize::new(0));
        let cancellable = AnyCancellable::new(Counter(Arc::clone(&count)));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        drop(cancellable);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_any_cancellable_explicit_cancel() {
        let count = Arc::new(AtomicUsize::new(0));
        let cancellable = AnyCancellable::new(Counter(Arc::clone(&count)));
        cancellable.cancel();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // Drop forwards again; idempotence is the wrapped value's job.
        drop(cancellable);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
