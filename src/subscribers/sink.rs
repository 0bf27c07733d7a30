//! Unlimited-demand subscriber backed by callbacks.

use std::sync::Arc;

use super::Subscriber;
use crate::subscriptions::{AnyCancellable, Cancellable, Subscription, SubscriptionSlot};
use crate::types::{Completion, Demand};

/// Subscriber that requests unlimited demand on subscription and forwards
/// values and completion to callbacks.
///
/// It never issues demand again after the initial unlimited request, so the
/// value returned from [`Subscriber::receive`] is always `Demand::NONE`.
/// The completion callback is `FnOnce` and runs at most once.
pub struct Sink<T, E> {
    on_value: Box<dyn FnMut(T) + Send>,
    on_completion: Option<Box<dyn FnOnce(Completion<E>) + Send>>,
    slot: SubscriptionSlot,
}

impl<T, E> Sink<T, E> {
    pub fn new<V, C>(on_value: V, on_completion: C) -> Self
    where
        V: FnMut(T) + Send + 'static,
        C: FnOnce(Completion<E>) + Send + 'static,
    {
        Self {
            on_value: Box::new(on_value),
            on_completion: Some(Box::new(on_completion)),
            slot: SubscriptionSlot::new(),
        }
    }

    /// Handle that cancels this sink's subscription, explicitly or on drop.
    ///
    /// Take it before subscribing; the sink itself moves into the publisher.
    pub fn cancellable(&self) -> AnyCancellable {
        AnyCancellable::new(self.slot.clone())
    }
}

impl<T, E> Cancellable for Sink<T, E> {
    fn cancel(&self) {
        self.slot.cancel();
    }
}

impl<T, E> Subscriber for Sink<T, E>
where
    T: 'static,
    E: 'static,
{
    type Input = T;
    type Failure = E;

    fn receive_subscription(&mut self, subscription: Arc<dyn Subscription>) {
        if self.slot.attach(Arc::clone(&subscription)) {
            subscription.request(Demand::UNLIMITED);
        }
    }

    fn receive(&mut self, input: T) -> Demand {
        (self.on_value)(input);
        Demand::NONE
    }

    fn receive_completion(&mut self, completion: Completion<E>) {
        self.slot.finish();
        if let Some(on_completion) = self.on_completion.take() {
            on_completion(completion);
        }
    }
}
