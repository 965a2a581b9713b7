use crate::trace::{debug, warn};
use crate::{ChannelError, Config, ConfigError, MetricsSnapshot, PopError, PushError, Ring};
use crossbeam_utils::Backoff;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Single-Producer Multi-Consumer channel over one [`Ring`].
///
/// The channel hands out exactly one [`Producer`] and any number of
/// [`Consumer`]s. All handles share the ring through an `Arc`; the ring is
/// freed when the last handle drops.
pub struct Channel<T> {
    inner: Arc<ChannelInner<T>>,
}

struct ChannelInner<T> {
    ring: Ring<T>,
    producer_taken: AtomicBool,
}

impl<T> Channel<T> {
    /// Creates a new channel with the given configuration.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let ring = Ring::new(config)?;
        debug!(
            capacity = ring.capacity(),
            metrics = config.enable_metrics,
            "channel created"
        );

        Ok(Self {
            inner: Arc::new(ChannelInner {
                ring,
                producer_taken: AtomicBool::new(false),
            }),
        })
    }

    /// Creates a channel whose capacity is `hint` rounded up to a power of two.
    pub fn with_capacity(hint: usize) -> Result<Self, ConfigError> {
        Self::new(Config::with_capacity(hint)?)
    }

    /// Take the producer handle. Only the first call succeeds; the handle is
    /// never handed out again, even after it has been dropped.
    pub fn producer(&self) -> Result<Producer<T>, ChannelError> {
        if self.inner.ring.is_closed() {
            return Err(ChannelError::Closed);
        }

        if self.inner.producer_taken.swap(true, Ordering::AcqRel) {
            warn!("producer requested twice");
            return Err(ChannelError::ProducerTaken);
        }

        Ok(Producer {
            inner: Arc::clone(&self.inner),
        })
    }

    /// Create a consumer handle. Consumers can also be cloned.
    pub fn consumer(&self) -> Consumer<T> {
        Consumer {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Close the channel. Pushes fail from now on; consumers can still drain
    /// what was already published.
    pub fn close(&self) {
        self.inner.ring.close();
        debug!("channel closed");
    }

    /// Returns true if the channel is closed.
    pub fn is_closed(&self) -> bool {
        self.inner.ring.is_closed()
    }

    /// Returns the ring capacity.
    pub fn capacity(&self) -> usize {
        self.inner.ring.capacity()
    }

    /// Approximate number of queued values. Monitoring only.
    pub fn len(&self) -> usize {
        self.inner.ring.len()
    }

    /// Returns true if the channel looked empty. Monitoring only.
    pub fn is_empty(&self) -> bool {
        self.inner.ring.is_empty()
    }

    /// Get a metrics snapshot (all zero unless metrics are enabled).
    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.ring.metrics()
    }
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("ring", &self.inner.ring)
            .field(
                "producer_taken",
                &self.inner.producer_taken.load(Ordering::Relaxed),
            )
            .finish()
    }
}

/// The one producer handle of a [`Channel`].
///
/// Not `Clone`, and every enqueue takes `&mut self`: the borrow checker is
/// what upholds the ring's single-producer contract. Dropping the producer
/// closes the channel.
pub struct Producer<T> {
    inner: Arc<ChannelInner<T>>,
}

impl<T> Producer<T> {
    /// Attempt to enqueue one value without waiting.
    ///
    /// Returns the value inside [`PushError::Full`] on backpressure, or
    /// [`PushError::Closed`] once the channel is closed.
    #[inline]
    pub fn try_push(&mut self, value: T) -> Result<(), PushError<T>> {
        // SAFETY: this is the only Producer for the ring (Channel::producer
        // hands out one) and `&mut self` rules out concurrent calls on it.
        unsafe { self.inner.ring.try_push(value) }
    }

    /// Enqueue with adaptive backoff: spin, then yield, then give up and
    /// return [`PushError::Full`].
    pub fn push_with_backoff(&mut self, value: T) -> Result<(), PushError<T>> {
        let backoff = Backoff::new();
        let mut value = value;
        loop {
            match self.try_push(value) {
                Ok(()) => return Ok(()),
                Err(PushError::Full(rejected)) if !backoff.is_completed() => {
                    value = rejected;
                    backoff.snooze();
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Batch enqueue with a single publish (convenience).
    ///
    /// Returns how many leading items were enqueued; 0 when full or closed.
    #[inline]
    pub fn push_slice(&mut self, items: &[T]) -> usize
    where
        T: Copy,
    {
        // SAFETY: see try_push.
        unsafe { self.inner.ring.push_slice(items) }
    }

    /// Returns the ring capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.ring.capacity()
    }

    /// Approximate number of queued values. Monitoring only.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.ring.len()
    }

    /// Returns true if the ring looked empty. Monitoring only.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.ring.is_empty()
    }

    /// Returns true if the ring looked full. Monitoring only.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.inner.ring.is_full()
    }

    /// Close the channel without dropping the producer.
    pub fn close(&self) {
        self.inner.ring.close();
    }

    /// Returns true if the channel is closed.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.inner.ring.is_closed()
    }
}

impl<T> Drop for Producer<T> {
    fn drop(&mut self) {
        self.inner.ring.close();
        debug!(pending = self.inner.ring.len(), "producer dropped, channel closed");
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("ring", &self.inner.ring)
            .finish()
    }
}

// Note: Producer intentionally does NOT implement Clone.
// A second handle would let two threads write the same slot.

/// A consumer handle. Cheap to clone; every clone competes for the same
/// values and each value goes to exactly one of them.
pub struct Consumer<T> {
    inner: Arc<ChannelInner<T>>,
}

impl<T> Consumer<T> {
    /// Attempt to claim the oldest value without waiting.
    ///
    /// `None` means the channel was empty or another consumer won the race
    /// for the same value; retry either way.
    #[inline]
    pub fn try_pop(&self) -> Option<T> {
        self.inner.ring.try_pop()
    }

    /// Claim with adaptive backoff.
    ///
    /// Returns [`PopError::Closed`] once the channel is closed and drained,
    /// [`PopError::Empty`] when the backoff runs out first.
    pub fn pop_with_backoff(&self) -> Result<T, PopError> {
        let backoff = Backoff::new();
        loop {
            if let Some(value) = self.try_pop() {
                return Ok(value);
            }
            if self.inner.ring.is_drained() {
                return Err(PopError::Closed);
            }
            if backoff.is_completed() {
                return Err(PopError::Empty);
            }
            backoff.snooze();
        }
    }

    /// Claim up to `max` consecutive values with one CAS, appending them to
    /// `out`. Returns the number claimed.
    #[inline]
    pub fn pop_batch(&self, out: &mut Vec<T>, max: usize) -> usize {
        self.inner.ring.pop_batch(out, max)
    }

    /// Returns the ring capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.ring.capacity()
    }

    /// Approximate number of queued values. Monitoring only.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.ring.len()
    }

    /// Returns true if the ring looked empty. Monitoring only.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.ring.is_empty()
    }

    /// Returns true if the channel is closed.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.inner.ring.is_closed()
    }

    /// Returns true once the channel is closed and every value is claimed.
    #[inline]
    pub fn is_drained(&self) -> bool {
        self.inner.ring.is_drained()
    }
}

impl<T> Clone for Consumer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("ring", &self.inner.ring)
            .finish()
    }
}
