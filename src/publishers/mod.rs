//! Publishers: the producing end of a stream.
//!
//! Each publisher is an immutable description of what to emit. Every call to
//! [`Publisher::subscribe`] builds an independent subscription, so one
//! publisher can serve any number of subscribers.

mod empty;
mod fail;
mod just;
mod sequence;

use crate::error::Result;
use crate::subscribers::{channel, ChannelConfig, ChannelHandle, Sink, Subscriber};
use crate::subscriptions::AnyCancellable;
use crate::types::{Completion, Never};

pub use empty::Empty;
pub use fail::Fail;
pub use just::Just;
pub use sequence::Sequence;

/// Producer of values for subscribers with matching types.
///
/// A subscriber can only attach when its `Input` and `Failure` equal the
/// publisher's `Output` and `Failure`, which the compiler checks.
pub trait Publisher {
    type Output: Send + 'static;
    type Failure: Send + 'static;

    /// Attach `subscriber`. It receives its subscription before this returns.
    fn subscribe<S>(&self, subscriber: S)
    where
        S: Subscriber<Input = Self::Output, Failure = Self::Failure>;
}

/// Convenience subscriptions available on every publisher.
pub trait PublisherExt: Publisher {
    /// Subscribe a [`Sink`] built from the two callbacks.
    fn sink<V, C>(&self, on_value: V, on_completion: C) -> AnyCancellable
    where
        V: FnMut(Self::Output) + Send + 'static,
        C: FnOnce(Completion<Self::Failure>) + Send + 'static,
    {
        let sink = Sink::new(on_value, on_completion);
        let cancellable = sink.cancellable();
        self.subscribe(sink);
        cancellable
    }

    /// Subscribe a [`Sink`] that only looks at values. Only offered for
    /// publishers that cannot fail.
    fn sink_value<V>(&self, on_value: V) -> AnyCancellable
    where
        Self: Publisher<Failure = Never>,
        V: FnMut(Self::Output) + Send + 'static,
    {
        self.sink(on_value, |_| {})
    }

    /// Subscribe through a bounded channel; see [`channel`].
    fn subscribe_channel(
        &self,
        config: ChannelConfig,
    ) -> Result<ChannelHandle<Self::Output, Self::Failure>> {
        let (subscriber, handle) = channel(config)?;
        self.subscribe(subscriber);
        Ok(handle)
    }
}

impl<P: Publisher> PublisherExt for P {}
