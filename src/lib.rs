//! # pushflow
//!
//! A push-based, demand-regulated stream core: publishers deliver values to
//! subscribers through a subscription that enforces cooperative
//! backpressure.
//!
//! ## Core Concepts
//!
//! - **Publisher**: immutable description of what to emit; builds a fresh
//!   subscription for every subscriber
//! - **Subscriber**: receives its subscription, values and one completion
//! - **Subscription**: carries demand upstream and values downstream;
//!   terminates exactly once, by completion or cancellation
//! - **Demand**: how many more values a subscriber accepts, finite or
//!   unlimited, saturating on addition
//!
//! ## Handshake
//!
//! ```text
//! publisher.subscribe(subscriber)
//!   └─► subscriber.receive_subscription(subscription)
//!         └─► subscription.request(demand)
//!               ├─► subscriber.receive(value)        (at most `demand` times)
//!               └─► subscriber.receive_completion(…) (at most once)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use pushflow::{Just, PublisherExt, Completion};
//!
//! let _cancellable = Just::new("Hello World").sink(
//!     |value| println!("{value}"),
//!     |completion| assert!(completion.is_finished()),
//! );
//! ```

pub mod error;
pub mod publishers;
pub mod subscribers;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use error::{Result, StreamError};
pub use publishers::{Empty, Fail, Just, Publisher, PublisherExt, Sequence};
pub use subscribers::{
    channel, ChannelConfig, ChannelHandle, ChannelSubscriber, Sink, StreamEvent, Subscriber,
};
pub use subscriptions::{AnyCancellable, Cancellable, Subscription, SubscriptionSlot};
pub use types::*;
