//! Bounded-demand subscriber that forwards events into a channel.
//!
//! The subscriber grants `buffer_size` elements up front and the handle
//! grants one more for every value it hands out, so the channel never holds
//! more than `buffer_size` values plus the completion.
//!
//! Demand granted from the handle is served on the consuming thread: a
//! synchronous publisher delivers the next value into the channel before
//! `recv` returns.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{
    bounded, Receiver, RecvError, RecvTimeoutError, Sender, TryRecvError, TrySendError,
};
use tracing::{trace, warn};

use super::Subscriber;
use crate::error::{Result, StreamError};
use crate::subscriptions::{Cancellable, Subscription, SubscriptionSlot};
use crate::types::{Completion, Demand};

/// Configuration for a channel subscriber.
#[derive(Clone, Debug)]
pub struct ChannelConfig {
    /// Max undelivered values buffered for the handle.
    /// Default: 64
    pub buffer_size: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self { buffer_size: 64 }
    }
}

/// Events delivered through a [`ChannelHandle`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEvent<T, E> {
    Value(T),
    /// Last event of the stream.
    Completion(Completion<E>),
}

/// Create a connected subscriber/handle pair.
///
/// Fails with [`StreamError::InvalidBufferSize`] for a zero buffer, which
/// could never grant demand.
pub fn channel<T, E>(
    config: ChannelConfig,
) -> Result<(ChannelSubscriber<T, E>, ChannelHandle<T, E>)> {
    if config.buffer_size == 0 {
        return Err(StreamError::InvalidBufferSize(config.buffer_size));
    }

    // One extra slot so the completion always fits behind a full buffer.
    let (sender, receiver) = bounded(config.buffer_size + 1);
    let slot = SubscriptionSlot::new();

    let subscriber = ChannelSubscriber {
        sender,
        slot: slot.clone(),
        initial_demand: Demand::max(config.buffer_size as u64),
    };
    let handle = ChannelHandle { receiver, slot };

    Ok((subscriber, handle))
}

/// Subscriber half of [`channel`].
pub struct ChannelSubscriber<T, E> {
    sender: Sender<StreamEvent<T, E>>,
    slot: SubscriptionSlot,
    initial_demand: Demand,
}

impl<T, E> Subscriber for ChannelSubscriber<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    type Input = T;
    type Failure = E;

    fn receive_subscription(&mut self, subscription: Arc<dyn Subscription>) {
        if self.slot.attach(Arc::clone(&subscription)) {
            subscription.request(self.initial_demand);
        }
    }

    fn receive(&mut self, input: T) -> Demand {
        match self.sender.try_send(StreamEvent::Value(input)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("publisher delivered beyond granted demand, cancelling");
                self.slot.cancel();
            }
            Err(TrySendError::Disconnected(_)) => {
                trace!("channel handle dropped, cancelling");
                self.slot.cancel();
            }
        }
        Demand::NONE
    }

    fn receive_completion(&mut self, completion: Completion<E>) {
        self.slot.finish();
        // Best effort: the handle may already be gone.
        let _ = self.sender.try_send(StreamEvent::Completion(completion));
    }
}

/// Consumer half of [`channel`].
///
/// Dropping the handle cancels the subscription.
pub struct ChannelHandle<T, E> {
    receiver: Receiver<StreamEvent<T, E>>,
    slot: SubscriptionSlot,
}

impl<T, E> ChannelHandle<T, E> {
    /// Receive the next event (blocking).
    ///
    /// Errors once the stream has terminated and every event was taken.
    pub fn recv(&self) -> std::result::Result<StreamEvent<T, E>, RecvError> {
        let event = self.receiver.recv()?;
        Ok(self.replenish(event))
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> std::result::Result<StreamEvent<T, E>, TryRecvError> {
        let event = self.receiver.try_recv()?;
        Ok(self.replenish(event))
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> std::result::Result<StreamEvent<T, E>, RecvTimeoutError> {
        let event = self.receiver.recv_timeout(timeout)?;
        Ok(self.replenish(event))
    }

    /// Number of events waiting in the buffer.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Blocking iterator over the values; stops after the completion, which
    /// is returned through `completion`.
    pub fn values(&self) -> Values<'_, T, E> {
        Values {
            handle: self,
            completion: None,
        }
    }

    fn replenish(&self, event: StreamEvent<T, E>) -> StreamEvent<T, E> {
        if matches!(event, StreamEvent::Value(_)) {
            self.slot.request(Demand::max(1));
        }
        event
    }
}

impl<T, E> Cancellable for ChannelHandle<T, E> {
    fn cancel(&self) {
        self.slot.cancel();
    }
}

impl<T, E> Drop for ChannelHandle<T, E> {
    fn drop(&mut self) {
        self.slot.cancel();
    }
}

/// Iterator returned by [`ChannelHandle::values`].
pub struct Values<'a, T, E> {
    handle: &'a ChannelHandle<T, E>,
    completion: Option<Completion<E>>,
}

impl<T, E> Values<'_, T, E> {
    /// The completion, once iteration has reached it.
    pub fn completion(&self) -> Option<&Completion<E>> {
        self.completion.as_ref()
    }
}

impl<T, E> Iterator for Values<'_, T, E> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.completion.is_some() {
            return None;
        }
        match self.handle.recv().ok()? {
            StreamEvent::Value(value) => Some(value),
            StreamEvent::Completion(completion) => {
                self.completion = Some(completion);
                None
            }
        }
    }
}
