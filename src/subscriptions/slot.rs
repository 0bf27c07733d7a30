//! Subscriber-side reference to a subscription.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{Cancellable, Subscription};
use crate::types::Demand;

enum SlotState {
    /// No subscription received yet.
    Awaiting,
    Subscribed(Arc<dyn Subscription>),
    /// Completed or cancelled. Subscriptions arriving now are cancelled.
    Terminal,
}

/// Where a subscriber keeps its subscription.
///
/// Clones share the same state, so a subscriber can hand a clone to its
/// owner for cancellation while keeping one for issuing demand. The
/// subscription is released as soon as the slot turns terminal.
#[derive(Clone)]
pub struct SubscriptionSlot {
    state: Arc<Mutex<SlotState>>,
}

impl SubscriptionSlot {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SlotState::Awaiting)),
        }
    }

    /// Store a newly received subscription.
    ///
    /// Returns `false` and cancels `subscription` if the slot is already
    /// subscribed or terminal: a subscriber follows one subscription at a time.
    pub fn attach(&self, subscription: Arc<dyn Subscription>) -> bool {
        {
            let mut state = self.state.lock();
            if matches!(*state, SlotState::Awaiting) {
                *state = SlotState::Subscribed(subscription);
                return true;
            }
        }
        subscription.cancel();
        false
    }

    /// Forward demand to the live subscription, if any.
    pub fn request(&self, demand: Demand) {
        if let Some(subscription) = self.current() {
            subscription.request(demand);
        }
    }

    /// Drop the subscription without cancelling it, after a completion.
    pub fn finish(&self) {
        let previous = std::mem::replace(&mut *self.state.lock(), SlotState::Terminal);
        drop(previous);
    }

    pub fn is_subscribed(&self) -> bool {
        matches!(*self.state.lock(), SlotState::Subscribed(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(*self.state.lock(), SlotState::Terminal)
    }

    fn current(&self) -> Option<Arc<dyn Subscription>> {
        match &*self.state.lock() {
            SlotState::Subscribed(subscription) => Some(Arc::clone(subscription)),
            _ => None,
        }
    }
}

impl Default for SubscriptionSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl Cancellable for SubscriptionSlot {
    fn cancel(&self) {
        let previous = std::mem::replace(&mut *self.state.lock(), SlotState::Terminal);
        // Call out with the lock released: cancelling may drop the subscriber
        // that owns this slot.
        if let SlotState::Subscribed(subscription) = previous {
            subscription.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Probe {
        requested: Mutex<Vec<Demand>>,
        cancels: AtomicUsize,
    }

    impl Cancellable for Probe {
        fn cancel(&self) {
            self.cancels.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Subscription for Probe {
        fn request(&self, demand: Demand) {
            self.requested.lock().push(demand);
        }
    }

    #[test]
    fn test_attach_then_request() {
        let slot = SubscriptionSlot::new();
        let probe = Arc::new(Probe::default());

        assert!(slot.attach(probe.clone()));
        assert!(slot.is_subscribed());

        slot.request(Demand::max(4));
        assert_eq!(*probe.requested.lock(), vec![Demand::max(4)]);
    }

    #[test]
    fn test_second_subscription_is_cancelled() {
        let slot = SubscriptionSlot::new();
        let first = Arc::new(Probe::default());
        let second = Arc::new(Probe::default());

        assert!(slot.attach(first.clone()));
        assert!(!slot.attach(second.clone()));

        assert_eq!(first.cancels.load(Ordering::SeqCst), 0);
        assert_eq!(second.cancels.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_before_attach() {
        let slot = SubscriptionSlot::new();
        slot.cancel();
        assert!(slot.is_terminal());

        let late = Arc::new(Probe::default());
        assert!(!slot.attach(late.clone()));
        assert_eq!(late.cancels.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_is_forwarded_once() {
        let slot = SubscriptionSlot::new();
        let probe = Arc::new(Probe::default());
        slot.attach(probe.clone());

        slot.clone().cancel();
        slot.cancel();
        assert_eq!(probe.cancels.load(Ordering::SeqCst), 1);

        slot.request(Demand::UNLIMITED);
        assert!(probe.requested.lock().is_empty());
    }

    #[test]
    fn test_finish_releases_without_cancel() {
        let slot = SubscriptionSlot::new();
        let probe = Arc::new(Probe::default());
        slot.attach(probe.clone());
        assert_eq!(Arc::strong_count(&probe), 2);

        slot.finish();
        assert_eq!(Arc::strong_count(&probe), 1);
        assert_eq!(probe.cancels.load(Ordering::SeqCst), 0);
    }
}
