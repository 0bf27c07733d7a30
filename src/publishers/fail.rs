//! Publisher that terminates with a failure.

use std::fmt;
use std::marker::PhantomData;

use super::Publisher;
use crate::subscribers::Subscriber;
use crate::subscriptions::emitter::{Emitter, Producer, Pull};
use crate::types::Completion;

/// Delivers `Completion::Failure(error)` right after the handshake, without
/// waiting for demand. Emits no values.
pub struct Fail<T, E> {
    error: E,
    _marker: PhantomData<fn() -> T>,
}

impl<T, E> Fail<T, E> {
    pub fn new(error: E) -> Self {
        Self {
            error,
            _marker: PhantomData,
        }
    }

    pub fn error(&self) -> &E {
        &self.error
    }
}

impl<T, E: Clone> Clone for Fail<T, E> {
    fn clone(&self) -> Self {
        Self::new(self.error.clone())
    }
}

impl<T, E: fmt::Debug> fmt::Debug for Fail<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fail").field("error", &self.error).finish()
    }
}

impl<T, E> Publisher for Fail<T, E>
where
    T: Send + 'static,
    E: Clone + Send + 'static,
{
    type Output = T;
    type Failure = E;

    fn subscribe<S>(&self, subscriber: S)
    where
        S: Subscriber<Input = Self::Output, Failure = Self::Failure>,
    {
        let producer = FailProducer {
            error: Some(self.error.clone()),
            _marker: PhantomData,
        };
        Emitter::start(producer, subscriber);
    }
}

struct FailProducer<T, E> {
    error: Option<E>,
    _marker: PhantomData<fn() -> T>,
}

impl<T, E> Producer for FailProducer<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = T;
    type Failure = E;

    const NAME: &'static str = "fail";

    fn pull(&mut self) -> Option<Pull<T, E>> {
        self.error
            .take()
            .map(|error| Pull::Done(Completion::Failure(error)))
    }
}
