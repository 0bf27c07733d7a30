//! Demand-driven subscription shared by the built-in publishers.
//!
//! An [`Emitter`] owns the downstream subscriber and a [`Producer`] that
//! supplies signals. Delivery happens in a drain loop run by exactly one
//! thread at a time: the drain owner. A `request` arriving from another
//! thread, or re-entrantly from inside `Subscriber::receive`, only records
//! the demand and bumps the work counter; the owner picks it up on its next
//! pass. This keeps delivery ordered, bounds stack depth and never calls
//! into the subscriber while the state lock is held.
//!
//! The producer is pulled one signal ahead of demand. That is how a
//! publisher whose source is exhausted finishes without waiting for more
//! demand, and how `Empty` and `Fail` complete right after the handshake.
//!
//! Each value is handed to the subscriber inside a delivery gate, checked
//! against the lifecycle state first. `cancel` from another thread passes
//! through the gate before returning, so once it returns no further
//! `receive` call can begin. A `cancel` issued from inside `receive`
//! re-enters the gate on the same thread.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};
use tracing::{debug, trace};

use super::{Cancellable, Subscription};
use crate::subscribers::Subscriber;
use crate::types::{Completion, Demand};

/// A signal a producer has ready for delivery.
pub(crate) enum Pull<T, E> {
    Value(T),
    Done(Completion<E>),
}

/// Producer-side state of one subscription.
pub(crate) trait Producer: Send + 'static {
    type Output: Send + 'static;
    type Failure: Send + 'static;

    /// Publisher name attached to log events.
    const NAME: &'static str;

    /// Next signal, or `None` if nothing is ready yet.
    ///
    /// Never called again once it has returned `Pull::Done`.
    fn pull(&mut self) -> Option<Pull<Self::Output, Self::Failure>>;
}

/// Lifecycle of a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum SubscriptionState {
    Active = 0,
    Terminated = 1,
}

struct Inner<P: Producer, S> {
    producer: P,
    /// Pulled from the producer, not yet delivered.
    lookahead: Option<Pull<P::Output, P::Failure>>,
    /// Outstanding demand.
    demand: Demand,
    /// Empty before the handshake finishes, while the drain owner is calling
    /// into the subscriber, and for good once terminated.
    downstream: Option<S>,
}

enum Step<T, E, S> {
    Idle,
    Emit(T, S),
    Complete(Completion<E>, S),
}

/// The subscription handed to subscribers of the built-in publishers.
pub(crate) struct Emitter<P: Producer, S> {
    state: AtomicU8,
    /// Pending drain requests; non-zero while a thread owns the drain loop.
    wip: AtomicUsize,
    /// Held by the drain owner from the state check until `receive` returns.
    gate: ReentrantMutex<()>,
    inner: Mutex<Inner<P, S>>,
}

impl<P, S> Emitter<P, S>
where
    P: Producer,
    S: Subscriber<Input = P::Output, Failure = P::Failure>,
{
    /// Hand a fresh subscription to `subscriber`, then deliver whatever the
    /// granted demand allows.
    pub(crate) fn start(producer: P, mut subscriber: S) {
        let emitter = Arc::new(Self {
            state: AtomicU8::new(SubscriptionState::Active as u8),
            // The handshake owns the drain until the subscriber is installed.
            wip: AtomicUsize::new(1),
            gate: ReentrantMutex::new(()),
            inner: Mutex::new(Inner {
                producer,
                lookahead: None,
                demand: Demand::NONE,
                downstream: None,
            }),
        });
        trace!(publisher = P::NAME, "subscription created");

        subscriber.receive_subscription(Arc::clone(&emitter) as Arc<dyn Subscription>);

        let rejected = {
            let mut inner = emitter.inner.lock();
            if emitter.is_terminated() {
                Some(subscriber)
            } else {
                inner.downstream = Some(subscriber);
                None
            }
        };
        drop(rejected);

        emitter.drain_loop();
    }

    fn is_terminated(&self) -> bool {
        self.state.load(Ordering::Acquire) == SubscriptionState::Terminated as u8
    }

    /// `Active -> Terminated`. Only the first caller gets `true`.
    ///
    /// Called with the state lock held.
    fn terminate(&self) -> bool {
        self.state
            .compare_exchange(
                SubscriptionState::Active as u8,
                SubscriptionState::Terminated as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    fn drain(&self) {
        if self.wip.fetch_add(1, Ordering::AcqRel) == 0 {
            self.drain_loop();
        }
    }

    /// Body of the drain owner. Entered with one unit of `wip` held.
    fn drain_loop(&self) {
        let mut missed = 1;
        loop {
            loop {
                match self.next_step() {
                    Step::Idle => break,
                    Step::Emit(value, mut downstream) => {
                        let additional = {
                            let _gate = self.gate.lock();
                            if self.is_terminated() {
                                None
                            } else {
                                Some(downstream.receive(value))
                            }
                        };
                        let Some(additional) = additional else {
                            drop(downstream);
                            trace!(publisher = P::NAME, "value dropped, cancelled before delivery");
                            continue;
                        };

                        let released = {
                            let mut inner = self.inner.lock();
                            inner.demand += additional;
                            if self.is_terminated() {
                                Some(downstream)
                            } else {
                                inner.downstream = Some(downstream);
                                None
                            }
                        };
                        if let Some(downstream) = released {
                            drop(downstream);
                            trace!(publisher = P::NAME, "downstream released after delivery");
                        }
                    }
                    Step::Complete(completion, mut downstream) => {
                        downstream.receive_completion(completion);
                    }
                }
            }

            missed = self.wip.fetch_sub(missed, Ordering::AcqRel) - missed;
            if missed == 0 {
                break;
            }
        }
    }

    /// Decide the next delivery under the lock. The subscriber is moved out
    /// so it can be called without holding the lock.
    fn next_step(&self) -> Step<P::Output, P::Failure, S> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let Some(downstream) = inner.downstream.take() else {
            return Step::Idle;
        };

        if inner.lookahead.is_none() {
            inner.lookahead = inner.producer.pull();
        }

        match inner.lookahead.take() {
            Some(Pull::Done(completion)) => {
                let won = self.terminate();
                debug_assert!(won, "downstream present after termination");
                debug!(
                    publisher = P::NAME,
                    finished = completion.is_finished(),
                    "subscription completed"
                );
                Step::Complete(completion, downstream)
            }
            Some(Pull::Value(value)) => {
                if inner.demand.consume_one() {
                    Step::Emit(value, downstream)
                } else {
                    inner.lookahead = Some(Pull::Value(value));
                    inner.downstream = Some(downstream);
                    Step::Idle
                }
            }
            None => {
                inner.downstream = Some(downstream);
                Step::Idle
            }
        }
    }
}

impl<P, S> Subscription for Emitter<P, S>
where
    P: Producer,
    S: Subscriber<Input = P::Output, Failure = P::Failure>,
{
    fn request(&self, demand: Demand) {
        if !demand.has_demand() {
            trace!(publisher = P::NAME, "zero demand ignored");
            return;
        }
        if self.is_terminated() {
            trace!(publisher = P::NAME, %demand, "request after termination ignored");
            return;
        }

        self.inner.lock().demand += demand;
        self.drain();
    }
}

impl<P, S> Cancellable for Emitter<P, S>
where
    P: Producer,
    S: Subscriber<Input = P::Output, Failure = P::Failure>,
{
    fn cancel(&self) {
        let released = {
            let mut inner = self.inner.lock();
            if !self.terminate() {
                return;
            }
            (inner.lookahead.take(), inner.downstream.take())
        };
        // Wait out a value already entering `receive` on another thread.
        drop(self.gate.lock());
        debug!(publisher = P::NAME, "subscription cancelled");
        drop(released);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    /// Emits `0..end`, then finishes. With `end == None` it never has anything.
    struct Counting {
        next: u32,
        end: Option<u32>,
    }

    impl Producer for Counting {
        type Output = u32;
        type Failure = String;

        const NAME: &'static str = "counting";

        fn pull(&mut self) -> Option<Pull<u32, String>> {
            let end = self.end?;
            if self.next < end {
                self.next += 1;
                Some(Pull::Value(self.next - 1))
            } else {
                Some(Pull::Done(Completion::Finished))
            }
        }
    }

    #[derive(Debug, PartialEq)]
    enum Event {
        Subscribed,
        Value(u32),
        Completed(Completion<String>),
    }

    type Shared<T> = Arc<parking_lot::Mutex<T>>;

    struct Recorder {
        events: Shared<Vec<Event>>,
        subscription: Shared<Option<Arc<dyn Subscription>>>,
        initial: Demand,
        per_value: Demand,
        dropped: Arc<AtomicBool>,
    }

    impl Recorder {
        fn new(initial: Demand, per_value: Demand) -> Self {
            Self {
                events: Arc::default(),
                subscription: Arc::default(),
                initial,
                per_value,
                dropped: Arc::default(),
            }
        }
    }

    impl Drop for Recorder {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    impl Subscriber for Recorder {
        type Input = u32;
        type Failure = String;

        fn receive_subscription(&mut self, subscription: Arc<dyn Subscription>) {
            self.events.lock().push(Event::Subscribed);
            *self.subscription.lock() = Some(Arc::clone(&subscription));
            subscription.request(self.initial);
        }

        fn receive(&mut self, input: u32) -> Demand {
            self.events.lock().push(Event::Value(input));
            self.per_value
        }

        fn receive_completion(&mut self, completion: Completion<String>) {
            self.events.lock().push(Event::Completed(completion));
            self.subscription.lock().take();
        }
    }

    #[test]
    fn test_handshake_precedes_values() {
        let recorder = Recorder::new(Demand::max(2), Demand::NONE);
        let events = Arc::clone(&recorder.events);

        Emitter::start(Counting { next: 0, end: Some(5) }, recorder);

        assert_eq!(
            *events.lock(),
            vec![Event::Subscribed, Event::Value(0), Event::Value(1)]
        );
    }

    #[test]
    fn test_returned_demand_is_trampolined() {
        // One unit up front, one more per value: deep recursion would blow the
        // stack long before the end.
        let recorder = Recorder::new(Demand::max(1), Demand::max(1));
        let events = Arc::clone(&recorder.events);

        Emitter::start(Counting { next: 0, end: Some(100_000) }, recorder);

        let events = events.lock();
        assert_eq!(events.len(), 100_002);
        assert_eq!(events[100_000], Event::Value(99_999));
        assert_eq!(events[100_001], Event::Completed(Completion::Finished));
    }

    #[test]
    fn test_exhausted_producer_finishes_without_demand() {
        let recorder = Recorder::new(Demand::max(3), Demand::NONE);
        let events = Arc::clone(&recorder.events);
        let dropped = Arc::clone(&recorder.dropped);

        Emitter::start(Counting { next: 0, end: Some(3) }, recorder);

        assert_eq!(
            *events.lock(),
            vec![
                Event::Subscribed,
                Event::Value(0),
                Event::Value(1),
                Event::Value(2),
                Event::Completed(Completion::Finished),
            ]
        );
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[test]
    fn test_cancel_releases_idle_downstream() {
        let recorder = Recorder::new(Demand::NONE, Demand::NONE);
        let subscription = Arc::clone(&recorder.subscription);
        let dropped = Arc::clone(&recorder.dropped);
        let events = Arc::clone(&recorder.events);

        Emitter::start(Counting { next: 0, end: None }, recorder);
        assert!(!dropped.load(Ordering::SeqCst));

        let handle = subscription.lock().take().unwrap();
        handle.cancel();
        assert!(dropped.load(Ordering::SeqCst));

        handle.request(Demand::UNLIMITED);
        handle.cancel();
        assert_eq!(*events.lock(), vec![Event::Subscribed]);
    }

    /// Cancels its own subscription from inside `receive` once it sees `stop_at`.
    struct StopsAt {
        stop_at: u32,
        seen: Shared<Vec<u32>>,
        subscription: Option<Arc<dyn Subscription>>,
    }

    impl Subscriber for StopsAt {
        type Input = u32;
        type Failure = String;

        fn receive_subscription(&mut self, subscription: Arc<dyn Subscription>) {
            subscription.request(Demand::UNLIMITED);
            self.subscription = Some(subscription);
        }

        fn receive(&mut self, input: u32) -> Demand {
            self.seen.lock().push(input);
            if input == self.stop_at {
                if let Some(subscription) = self.subscription.take() {
                    subscription.cancel();
                }
            }
            Demand::max(1)
        }

        fn receive_completion(&mut self, _completion: Completion<String>) {
            self.seen.lock().push(u32::MAX);
        }
    }

    #[test]
    fn test_cancel_from_receive_stops_next_value() {
        let seen: Shared<Vec<u32>> = Arc::default();

        Emitter::start(
            Counting { next: 0, end: Some(10) },
            StopsAt {
                stop_at: 3,
                seen: Arc::clone(&seen),
                subscription: None,
            },
        );

        assert_eq!(*seen.lock(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_deferred_request_resumes_delivery() {
        let recorder = Recorder::new(Demand::NONE, Demand::NONE);
        let subscription = Arc::clone(&recorder.subscription);
        let events = Arc::clone(&recorder.events);

        Emitter::start(Counting { next: 0, end: Some(2) }, recorder);
        assert_eq!(*events.lock(), vec![Event::Subscribed]);

        let handle = subscription.lock().clone().unwrap();
        handle.request(Demand::max(1));
        assert_eq!(events.lock().len(), 2);

        handle.request(Demand::max(1));
        assert_eq!(
            events.lock().last(),
            Some(&Event::Completed(Completion::Finished))
        );
    }
}
