//! Core value types passed between publishers, subscriptions and subscribers.

use crate::error::StreamError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// Failure type of publishers that statically cannot fail.
pub type Never = std::convert::Infallible;

/// Number of elements a subscriber is willing to accept.
///
/// Finite counts are unsigned, so negative demand cannot be represented.
/// Addition saturates: a finite sum that overflows `u64` becomes
/// [`Demand::Unlimited`], and `Unlimited` absorbs anything added to it.
///
/// Every finite demand orders below `Unlimited`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Demand {
    /// At most this many further elements.
    Max(u64),
    /// Any number of elements.
    Unlimited,
}

impl Demand {
    /// No demand at all.
    pub const NONE: Demand = Demand::Max(0);

    /// Demand without bound.
    pub const UNLIMITED: Demand = Demand::Unlimited;

    /// Finite demand for `count` elements.
    pub const fn max(count: u64) -> Self {
        Demand::Max(count)
    }

    pub const fn is_unlimited(&self) -> bool {
        matches!(self, Demand::Unlimited)
    }

    /// Returns `true` if at least one more element may be emitted.
    pub const fn has_demand(&self) -> bool {
        match self {
            Demand::Max(count) => *count > 0,
            Demand::Unlimited => true,
        }
    }

    /// The finite count, or `None` when unlimited.
    pub const fn max_count(&self) -> Option<u64> {
        match self {
            Demand::Max(count) => Some(*count),
            Demand::Unlimited => None,
        }
    }

    /// Adds two demands, saturating at `Unlimited`.
    pub const fn saturating_add(self, other: Demand) -> Demand {
        match (self, other) {
            (Demand::Max(a), Demand::Max(b)) => match a.checked_add(b) {
                Some(total) => Demand::Max(total),
                None => Demand::Unlimited,
            },
            _ => Demand::Unlimited,
        }
    }

    /// Whether this demand still allows another element once `emitted`
    /// elements have been delivered against it.
    pub const fn permits(&self, emitted: u64) -> bool {
        match self {
            Demand::Max(count) => emitted < *count,
            Demand::Unlimited => true,
        }
    }

    /// Takes one unit of demand for an emitted element.
    ///
    /// Returns `false`, leaving the demand untouched, when there is none left.
    /// Unlimited demand is never decremented.
    pub fn consume_one(&mut self) -> bool {
        match self {
            Demand::Unlimited => true,
            Demand::Max(count) if *count > 0 => {
                *count -= 1;
                true
            }
            Demand::Max(_) => false,
        }
    }
}

impl Default for Demand {
    fn default() -> Self {
        Demand::NONE
    }
}

impl Add for Demand {
    type Output = Demand;

    fn add(self, rhs: Demand) -> Demand {
        self.saturating_add(rhs)
    }
}

impl AddAssign for Demand {
    fn add_assign(&mut self, rhs: Demand) {
        *self = self.saturating_add(rhs);
    }
}

impl From<u64> for Demand {
    fn from(count: u64) -> Self {
        Demand::Max(count)
    }
}

impl TryFrom<i64> for Demand {
    type Error = StreamError;

    fn try_from(count: i64) -> Result<Self, Self::Error> {
        u64::try_from(count)
            .map(Demand::Max)
            .map_err(|_| StreamError::NegativeDemand(count))
    }
}

impl fmt::Debug for Demand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Demand({})", self)
    }
}

impl fmt::Display for Demand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Demand::Max(count) => write!(f, "max({})", count),
            Demand::Unlimited => f.write_str("unlimited"),
        }
    }
}

/// Terminal signal of a subscription.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion<E> {
    /// The publisher produced everything it had.
    Finished,
    /// The publisher stopped because of an error.
    Failure(E),
}

impl<E> Completion<E> {
    pub fn is_finished(&self) -> bool {
        matches!(self, Completion::Finished)
    }

    /// The failure reason, if this is a failure.
    pub fn failure(&self) -> Option<&E> {
        match self {
            Completion::Finished => None,
            Completion::Failure(error) => Some(error),
        }
    }

    /// Transform the failure reason, keeping `Finished` as is.
    pub fn map_failure<F, G>(self, f: G) -> Completion<F>
    where
        G: FnOnce(E) -> F,
    {
        match self {
            Completion::Finished => Completion::Finished,
            Completion::Failure(error) => Completion::Failure(f(error)),
        }
    }

    pub fn into_result(self) -> Result<(), E> {
        match self {
            Completion::Finished => Ok(()),
            Completion::Failure(error) => Err(error),
        }
    }
}

impl<E> From<Result<(), E>> for Completion<E> {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Completion::Finished,
            Err(error) => Completion::Failure(error),
        }
    }
}
