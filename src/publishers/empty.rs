//! Publisher that never emits a value.

use std::fmt;
use std::marker::PhantomData;

use super::Publisher;
use crate::subscribers::Subscriber;
use crate::subscriptions::emitter::{Emitter, Producer, Pull};
use crate::types::Completion;

/// Emits no values. Either finishes right after the handshake, without
/// waiting for demand, or stays silent until cancelled.
pub struct Empty<T, E> {
    complete_immediately: bool,
    _marker: PhantomData<fn() -> (T, E)>,
}

impl<T, E> Empty<T, E> {
    /// Finishes every subscriber immediately.
    pub fn new() -> Self {
        Self {
            complete_immediately: true,
            _marker: PhantomData,
        }
    }

    /// Never finishes; subscribers only leave by cancelling.
    pub fn never() -> Self {
        Self {
            complete_immediately: false,
            _marker: PhantomData,
        }
    }

    pub fn completes_immediately(&self) -> bool {
        self.complete_immediately
    }
}

impl<T, E> Default for Empty<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Clone for Empty<T, E> {
    fn clone(&self) -> Self {
        Self {
            complete_immediately: self.complete_immediately,
            _marker: PhantomData,
        }
    }
}

impl<T, E> fmt::Debug for Empty<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Empty")
            .field("complete_immediately", &self.complete_immediately)
            .finish()
    }
}

impl<T, E> Publisher for Empty<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = T;
    type Failure = E;

    fn subscribe<S>(&self, subscriber: S)
    where
        S: Subscriber<Input = Self::Output, Failure = Self::Failure>,
    {
        let producer = EmptyProducer {
            complete_immediately: self.complete_immediately,
            _marker: PhantomData,
        };
        Emitter::start(producer, subscriber);
    }
}

struct EmptyProducer<T, E> {
    complete_immediately: bool,
    _marker: PhantomData<fn() -> (T, E)>,
}

impl<T, E> Producer for EmptyProducer<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = T;
    type Failure = E;

    const NAME: &'static str = "empty";

    fn pull(&mut self) -> Option<Pull<T, E>> {
        self.complete_immediately
            .then(|| Pull::Done(Completion::Finished))
    }
}
