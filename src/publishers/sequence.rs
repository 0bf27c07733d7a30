//! Multi-value publisher over an iterable.

use super::Publisher;
use crate::subscribers::Subscriber;
use crate::subscriptions::emitter::{Emitter, Producer, Pull};
use crate::types::{Completion, Never};

/// Emits the items of an iterable in order, one per unit of demand, then
/// finishes.
///
/// Each subscriber iterates its own clone of the source. Once the last item
/// has been delivered the subscriber is finished without further demand.
#[derive(Clone, Debug)]
pub struct Sequence<I> {
    source: I,
}

impl<I> Sequence<I>
where
    I: IntoIterator + Clone,
{
    pub fn new(source: I) -> Self {
        Self { source }
    }
}

impl<I> Publisher for Sequence<I>
where
    I: IntoIterator + Clone,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    type Output = I::Item;
    type Failure = Never;

    fn subscribe<S>(&self, subscriber: S)
    where
        S: Subscriber<Input = Self::Output, Failure = Self::Failure>,
    {
        let producer = SequenceProducer {
            items: self.source.clone().into_iter(),
        };
        Emitter::start(producer, subscriber);
    }
}

struct SequenceProducer<It> {
    items: It,
}

impl<It> Producer for SequenceProducer<It>
where
    It: Iterator + Send + 'static,
    It::Item: Send + 'static,
{
    type Output = It::Item;
    type Failure = Never;

    const NAME: &'static str = "sequence";

    fn pull(&mut self) -> Option<Pull<It::Item, Never>> {
        Some(match self.items.next() {
            Some(item) => Pull::Value(item),
            None => Pull::Done(Completion::Finished),
        })
    }
}
