//! Single-value publisher.

use super::Publisher;
use crate::subscribers::Subscriber;
use crate::subscriptions::emitter::{Emitter, Producer, Pull};
use crate::types::{Completion, Never};

/// Emits one value to each subscriber, then finishes. Cannot fail.
///
/// The value is emitted on the first positive request, however large, and
/// `Finished` follows immediately.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Just<T> {
    output: T,
}

impl<T> Just<T> {
    pub fn new(output: T) -> Self {
        Self { output }
    }

    /// The value every subscriber receives.
    pub fn output(&self) -> &T {
        &self.output
    }
}

impl<T> Publisher for Just<T>
where
    T: Clone + Send + 'static,
{
    type Output = T;
    type Failure = Never;

    fn subscribe<S>(&self, subscriber: S)
    where
        S: Subscriber<Input = Self::Output, Failure = Self::Failure>,
    {
        let producer = JustProducer {
            output: Some(self.output.clone()),
        };
        Emitter::start(producer, subscriber);
    }
}

struct JustProducer<T> {
    output: Option<T>,
}

impl<T: Send + 'static> Producer for JustProducer<T> {
    type Output = T;
    type Failure = Never;

    const NAME: &'static str = "just";

    fn pull(&mut self) -> Option<Pull<T, Never>> {
        Some(match self.output.take() {
            Some(output) => Pull::Value(output),
            None => Pull::Done(Completion::Finished),
        })
    }
}
