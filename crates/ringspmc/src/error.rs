//! Error types for ring and channel operations.

use std::fmt;
use thiserror::Error;

/// Errors raised while building a ring from a [`Config`](crate::Config).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A capacity hint of zero has no power-of-two round-up.
    #[error("capacity hint must be at least 1")]
    ZeroCapacity,
    /// The capacity hint rounds up past the largest supported ring.
    #[error("capacity hint {requested} exceeds the maximum of {max} slots")]
    CapacityTooLarge {
        /// The requested capacity hint.
        requested: usize,
        /// The largest supported capacity.
        max: usize,
    },
    /// `ring_bits` is larger than the supported maximum.
    #[error("ring_bits {bits} exceeds the maximum of {max}")]
    RingBitsTooLarge {
        /// The configured `ring_bits`.
        bits: u8,
        /// The largest supported `ring_bits`.
        max: u8,
    },
}

/// Error types for channel handle operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The single producer handle has already been handed out.
    #[error("producer already taken")]
    ProducerTaken,
    /// Channel is closed.
    #[error("channel is closed")]
    Closed,
}

/// Error returned by a failed enqueue. Carries the rejected value back to
/// the caller.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum PushError<T> {
    /// The ring is full (possibly a conservative, stale observation).
    Full(T),
    /// The channel has been closed.
    Closed(T),
}

impl<T> PushError<T> {
    /// Returns the value that could not be enqueued.
    #[inline]
    pub fn into_inner(self) -> T {
        match self {
            Self::Full(value) | Self::Closed(value) => value,
        }
    }

    /// Returns `true` if this is transient backpressure.
    #[inline]
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }

    /// Returns `true` if the channel is permanently closed.
    #[inline]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }
}

impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(_) => f.write_str("Full(..)"),
            Self::Closed(_) => f.write_str("Closed(..)"),
        }
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(_) => f.write_str("ring buffer is full"),
            Self::Closed(_) => f.write_str("channel is closed"),
        }
    }
}

impl<T> std::error::Error for PushError<T> {}

/// Errors from the backoff-driven dequeue helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PopError {
    /// Nothing was claimed before the backoff gave up.
    #[error("ring buffer is empty")]
    Empty,
    /// The channel is closed and every value has been claimed.
    #[error("channel is closed and drained")]
    Closed,
}

impl PopError {
    /// Returns `true` if retrying later may succeed.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Empty)
    }
}
