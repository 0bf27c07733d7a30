//! Subscribers: the consuming end of a stream.
//!
//! - [`Sink`] requests unlimited demand and forwards everything to callbacks.
//! - [`ChannelSubscriber`] keeps demand bounded by a buffer and hands events
//!   to a [`ChannelHandle`] for consumption on any thread.

mod channel;
mod sink;

use std::sync::Arc;

use crate::subscriptions::Subscription;
use crate::types::{Completion, Demand};

pub use channel::{channel, ChannelConfig, ChannelHandle, ChannelSubscriber, StreamEvent, Values};
pub use sink::Sink;

/// Consumer of the values and completion of one subscription.
///
/// The subscription calls these methods in protocol order:
/// `receive_subscription` once, `receive` at most as many times as demand
/// was granted, then `receive_completion` at most once. Cancellation is
/// silent, so a cancelled subscriber simply stops hearing from its
/// subscription.
pub trait Subscriber: Send + 'static {
    type Input;
    type Failure;

    /// First call of the handshake. Demand is granted through `subscription`,
    /// either right away or later from any thread.
    fn receive_subscription(&mut self, subscription: Arc<dyn Subscription>);

    /// Receive one value. The returned demand is added to what is outstanding.
    fn receive(&mut self, input: Self::Input) -> Demand;

    fn receive_completion(&mut self, completion: Completion<Self::Failure>);
}
