//! Error types for the stream core.
//!
//! Failures of a running stream are never reported through this type: they
//! travel as data inside [`Completion::Failure`](crate::types::Completion).
//! `StreamError` covers the few places where building a stream component can
//! be rejected up front.

use thiserror::Error;

/// Main error type for stream construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("Demand cannot be negative: {0}")]
    NegativeDemand(i64),

    #[error("Invalid buffer size: {0} (must be at least 1)")]
    InvalidBufferSize(usize),
}

/// Result type for stream construction.
pub type Result<T> = std::result::Result<T, StreamError>;
