use crate::invariants::{
    debug_assert_bounded_count, debug_assert_claim_published, debug_assert_monotonic,
    debug_assert_no_wrap,
};
use crate::metrics::Metrics;
use crate::trace::trace;
use crate::{Config, ConfigError, MetricsSnapshot, PushError};
use atomic_memcpy::{atomic_load, atomic_store};
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::fmt;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

// =============================================================================
// MEMORY ORDERING & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// One producer, any number of consumers, two monotonic u64 cursors:
// - `write`: next slot the producer fills. Only the producer stores to it.
// - `read`:  next slot a consumer may claim. Advanced by CAS.
//
// Slot index is `cursor & mask`; cursors never wrap in practice (2^64).
//
// **Producer (enqueue):**
// 1. Load `write` with Relaxed (only producer writes it)
// 2. Check space against `cached_read` (UnsafeCell, producer-only)
// 3. If the cache says full: load `read` with Acquire and refresh the cache.
//    A stale `read` only under-reports free space, so the check is
//    conservative and never overwrites an unclaimed slot.
// 4. Write the value into the slot with a byte-wise atomic store (Relaxed)
// 5. Store `write + 1` with Release (publishes the slot to consumers)
//
// **Consumer (dequeue):**
// 1. Load `read` with Relaxed as `p`
// 2. Load `write` with Acquire; `write <= p` means empty
// 3. Copy slot `p` into a `MaybeUninit<T>` with a byte-wise atomic load
//    (speculative: not owned yet)
// 4. CAS `read` from `p` to `p + 1` (Release on success, Relaxed on failure)
// 5. CAS won: the copy is the value, ownership moves to this consumer.
//    CAS lost: another consumer owns slot `p`; the copy is forgotten
//    without running `T`'s destructor.
//
// The value's visibility comes from the `write` Release/Acquire pair, not
// from the CAS. The CAS Release pairs with the producer's Acquire refresh
// of `read`, so the winning consumer's copy of slot `p` happens-before the
// producer reuses that slot for `p + capacity`.
//
// A losing consumer gets no such edge: its `p` snapshot may be stale while
// the producer is already rewriting the slot for `p + capacity`. Both sides
// therefore touch slot bytes only through `atomic_memcpy`, which turns that
// overlap into a torn copy rather than a data race. A torn copy always
// fails the CAS (the read cursor has moved past `p`), so it is discarded
// and never read as a `T`. Payloads must not contain padding bytes, which
// byte-wise atomics cannot carry.
//
// A slot is logically uninitialized once claimed: the value is moved out,
// so the producer never has to destroy a previous occupant. Values still in
// `[read, write)` when the ring drops are dropped there.
//
// =============================================================================

/// Producer-owned cursor state, kept together on one cache line.
struct ProducerCursor {
    /// Write cursor (written by producer, read by consumers)
    write: AtomicU64,
    /// Producer's cached view of `read` (avoids cross-core reads)
    cached_read: UnsafeCell<u64>,
}

/// Bounded SPMC ring buffer - the core building block.
///
/// Values move from one producer to any number of consumers; each value is
/// delivered to exactly one consumer, in enqueue order. Both operations are
/// non-blocking and report failure instead of waiting.
///
/// Enqueue is `unsafe` here because the ring itself does not enforce the
/// single-producer rule. Use [`Channel`](crate::Channel) for handles that
/// enforce it at compile time.
///
/// Slots are copied in and out with byte-wise atomics, so `T` must not
/// contain padding bytes: those are uninitialized and cannot be carried by
/// an atomic load.
#[repr(C)]
pub struct Ring<T> {
    // === PRODUCER HOT ===
    producer: CachePadded<ProducerCursor>,

    // === CONSUMER HOT ===
    /// Read-claim cursor (CAS by consumers, read by producer)
    read: CachePadded<AtomicU64>,

    // === COLD STATE ===
    closed: AtomicBool,
    metrics: Metrics,
    config: Config,

    // === DATA BUFFER ===
    /// Fixed-size storage, one cell per slot so that slot accesses never
    /// alias a reference to the whole buffer.
    buffer: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

// Safety: values are moved between threads, never shared, so `T: Send` is
// enough. Cursor atomics order every slot access.
unsafe impl<T: Send> Send for Ring<T> {}
unsafe impl<T: Send> Sync for Ring<T> {}

impl<T> Ring<T> {
    /// Creates a new ring buffer with the given configuration.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let capacity = config.capacity();

        let buffer = (0..capacity)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Ok(Self {
            producer: CachePadded::new(ProducerCursor {
                write: AtomicU64::new(0),
                cached_read: UnsafeCell::new(0),
            }),
            read: CachePadded::new(AtomicU64::new(0)),
            closed: AtomicBool::new(false),
            metrics: Metrics::new(),
            config,
            buffer,
        })
    }

    /// Creates a ring whose capacity is `hint` rounded up to a power of two.
    pub fn with_capacity(hint: usize) -> Result<Self, ConfigError> {
        Self::new(Config::with_capacity(hint)?)
    }

    // ---------------------------------------------------------------------
    // CONSTANTS & STATUS
    // ---------------------------------------------------------------------

    /// Returns the ring buffer capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.config.capacity()
    }

    #[inline]
    fn mask(&self) -> usize {
        self.config.mask()
    }

    /// Returns the configuration this ring was built with.
    #[inline]
    pub fn config(&self) -> Config {
        self.config
    }

    /// Approximate number of values in the ring.
    ///
    /// The two cursors are loaded independently, so the result can be stale
    /// by the number of operations in flight. Use it for monitoring only,
    /// never to decide whether a push or pop will succeed. Always within
    /// `[0, capacity]`.
    #[inline]
    pub fn len(&self) -> usize {
        let read = self.read.load(Ordering::Relaxed);
        let write = self.producer.write.load(Ordering::Relaxed);
        (write.saturating_sub(read) as usize).min(self.capacity())
    }

    /// Returns true if the ring looked empty. Approximate, like [`len`](Self::len).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the ring looked full. Approximate, like [`len`](Self::len).
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    /// Returns true if the ring is closed.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Returns true once the ring is closed and every published value has
    /// been claimed.
    ///
    /// Exact when the producer closed the ring itself. A third-party
    /// `close()` can race with an enqueue already past its closed check.
    pub fn is_drained(&self) -> bool {
        // Closed first: the Acquire pairs with `close()`, so the write
        // cursor loaded next is final.
        self.is_closed()
            && self.read.load(Ordering::Relaxed) >= self.producer.write.load(Ordering::Acquire)
    }

    /// Close the ring. Later enqueues fail with [`PushError::Closed`];
    /// values already published can still be claimed.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Get a snapshot of metrics if enabled.
    pub fn metrics(&self) -> MetricsSnapshot {
        if self.config.enable_metrics {
            self.metrics.snapshot()
        } else {
            MetricsSnapshot::default()
        }
    }

    // ---------------------------------------------------------------------
    // PRODUCER API
    // ---------------------------------------------------------------------

    /// Attempt to enqueue one value.
    ///
    /// Fails with [`PushError::Full`] when the ring has no free slot (the
    /// check may be conservative) and with [`PushError::Closed`] after
    /// [`close`](Self::close). The value is handed back in both cases.
    ///
    /// # Safety
    ///
    /// No other thread may run `try_push` or `push_slice` on this ring at
    /// the same time. Concurrent enqueuers race on the same slot.
    pub unsafe fn try_push(&self, value: T) -> Result<(), PushError<T>> {
        if self.closed.load(Ordering::Relaxed) {
            return Err(PushError::Closed(value));
        }

        let write = self.producer.write.load(Ordering::Relaxed);
        // SAFETY: the caller guarantees we are the only producer.
        if unsafe { self.free_slots(write, 1) } == 0 {
            if self.config.enable_metrics {
                self.metrics.add_push_full();
            }
            return Err(PushError::Full(value));
        }

        let idx = (write as usize) & self.mask();
        // SAFETY: Slot access is safe because:
        // 1. idx is within bounds (masked to capacity) and the pointer comes
        //    from UnsafeCell::get, aligned for T
        // 2. free_slots() proved the previous occupant (cursor
        //    write - capacity) was claimed and moved out, so nothing is
        //    overwritten that still needs dropping
        // 3. Stale consumers may still be copying this slot; they use
        //    atomic_load, so the overlap is atomic-vs-atomic
        unsafe {
            atomic_store(self.buffer[idx].get().cast::<T>(), value, Ordering::Relaxed);
        }

        self.publish(write, 1);
        Ok(())
    }

    /// Batch enqueue with a single publish. Returns how many items were
    /// enqueued: 0 if the ring is full or closed, possibly fewer than
    /// `items.len()` if space runs out.
    ///
    /// # Safety
    ///
    /// Same contract as [`try_push`](Self::try_push).
    pub unsafe fn push_slice(&self, items: &[T]) -> usize
    where
        T: Copy,
    {
        if items.is_empty() || self.closed.load(Ordering::Relaxed) {
            return 0;
        }

        let write = self.producer.write.load(Ordering::Relaxed);
        // SAFETY: the caller guarantees we are the only producer.
        let n = unsafe { self.free_slots(write, items.len()) }.min(items.len());
        if n == 0 {
            if self.config.enable_metrics {
                self.metrics.add_push_full();
            }
            return 0;
        }

        let mask = self.mask();
        for (i, item) in items[..n].iter().enumerate() {
            let idx = (write.wrapping_add(i as u64) as usize) & mask;
            // SAFETY: same argument as try_push, for each of the n free slots.
            unsafe {
                atomic_store(self.buffer[idx].get().cast::<T>(), *item, Ordering::Relaxed);
            }
        }

        // Single atomic update for the whole batch
        self.publish(write, n);
        n
    }

    /// Free slots seen from `write`, refreshing the cached read cursor only
    /// when the cache reports fewer than `wanted`.
    ///
    /// # Safety
    ///
    /// Producer-only: `cached_read` has no synchronization of its own.
    #[inline]
    unsafe fn free_slots(&self, write: u64, wanted: usize) -> usize {
        let capacity = self.capacity();

        // Fast path: check cached read cursor
        // SAFETY: cached_read is only touched by the single producer.
        let cached_read = unsafe { *self.producer.cached_read.get() };
        let free = capacity.saturating_sub(write.wrapping_sub(cached_read) as usize);
        if free >= wanted {
            return free;
        }

        // Slow path: refresh cache. Acquire pairs with the consumers'
        // Release CAS so their slot copies happen-before our reuse.
        let read = self.read.load(Ordering::Acquire);
        // SAFETY: cached_read is only touched by the single producer.
        unsafe {
            *self.producer.cached_read.get() = read;
        }
        capacity.saturating_sub(write.wrapping_sub(read) as usize)
    }

    /// Publish `n` freshly written slots starting at `write`.
    #[inline]
    fn publish(&self, write: u64, n: usize) {
        let new_write = write.wrapping_add(n as u64);

        debug_assert_bounded_count!(
            new_write.wrapping_sub(self.read.load(Ordering::Relaxed)) as usize,
            self.capacity()
        );
        debug_assert_monotonic!("write", write, new_write);
        debug_assert_no_wrap!("write", write, new_write);

        self.producer.write.store(new_write, Ordering::Release);

        if self.config.enable_metrics {
            self.metrics.add_messages_pushed(n as u64);
        }
    }

    // ---------------------------------------------------------------------
    // CONSUMER API
    // ---------------------------------------------------------------------

    /// Attempt to claim the oldest value.
    ///
    /// Returns `None` when the ring is empty *or* when another consumer
    /// claimed the same slot first; the two cases are not distinguished,
    /// callers simply retry. Safe to call from any number of threads.
    pub fn try_pop(&self) -> Option<T> {
        let read = self.read.load(Ordering::Relaxed);
        let write = self.producer.write.load(Ordering::Acquire);

        if write <= read {
            if self.config.enable_metrics {
                self.metrics.add_pop_empty();
            }
            return None;
        }
        if write - read > self.capacity() as u64 {
            // `read` is stale enough that slot `read` may already be reused.
            self.record_lost_race();
            return None;
        }

        let slot = self.buffer[(read as usize) & self.mask()].get().cast::<T>();
        // SAFETY: Speculative copy. The index is masked and the pointer comes
        // from UnsafeCell::get. The producer may be rewriting this slot if
        // `read` is stale; its store is atomic too, so the worst outcome is
        // a torn MaybeUninit<T>, which the CAS below rejects.
        let value = unsafe { atomic_load(slot, Ordering::Relaxed) };

        match self.read.compare_exchange(
            read,
            read + 1,
            Ordering::Release,
            Ordering::Relaxed,
        ) {
            Ok(_) => {
                debug_assert_claim_published!(read + 1, write);
                if self.config.enable_metrics {
                    self.metrics.add_messages_popped(1);
                }
                // SAFETY: CAS won, so the read cursor was still `read`
                // during the copy. The producer cannot reuse slot `read`
                // before the cursor passes it, so the copy is the intact
                // published value and now belongs to us alone.
                Some(unsafe { value.assume_init() })
            }
            // The copy is dropped as MaybeUninit: T's destructor never runs.
            Err(_) => {
                self.record_lost_race();
                None
            }
        }
    }

    /// Claim up to `max` consecutive values with a single CAS, appending
    /// them to `out` in enqueue order. Returns the number claimed; 0 when
    /// empty or when another consumer moved the read cursor first.
    pub fn pop_batch(&self, out: &mut Vec<T>, max: usize) -> usize {
        if max == 0 {
            return 0;
        }

        let read = self.read.load(Ordering::Relaxed);
        let write = self.producer.write.load(Ordering::Acquire);

        let avail = write.saturating_sub(read);
        if avail == 0 {
            if self.config.enable_metrics {
                self.metrics.add_pop_empty();
            }
            return 0;
        }
        if avail > self.capacity() as u64 {
            self.record_lost_race();
            return 0;
        }

        let n = (avail as usize).min(max);
        out.reserve(n);
        let mask = self.mask();
        for (i, dst) in out.spare_capacity_mut()[..n].iter_mut().enumerate() {
            let idx = (read.wrapping_add(i as u64) as usize) & mask;
            let slot = self.buffer[idx].get().cast::<T>();
            // SAFETY: speculative atomic copy, same argument as try_pop.
            // `out`'s length is untouched until the claim wins.
            *dst = unsafe { atomic_load(slot, Ordering::Relaxed) };
        }

        match self.read.compare_exchange(
            read,
            read + n as u64,
            Ordering::Release,
            Ordering::Relaxed,
        ) {
            Ok(_) => {
                debug_assert_claim_published!(read + n as u64, write);
                debug_assert_monotonic!("read", read, read + n as u64);
                // SAFETY: CAS won: none of the n slots could be reused while
                // the cursor sat at `read`, so the copies are intact values
                // we own.
                unsafe {
                    out.set_len(out.len() + n);
                }
                if self.config.enable_metrics {
                    self.metrics.add_messages_popped(n as u64);
                    self.metrics.add_batches_popped();
                }
                n
            }
            Err(_) => {
                self.record_lost_race();
                0
            }
        }
    }

    #[cold]
    fn record_lost_race(&self) {
        if self.config.enable_metrics {
            self.metrics.add_pop_contended();
        }
    }
}

impl<T> Drop for Ring<T> {
    fn drop(&mut self) {
        // Drop every published value that was never claimed
        let read = *self.read.get_mut();
        let write = *self.producer.write.get_mut();
        let count = write.wrapping_sub(read) as usize;

        if count > 0 {
            trace!(count = count, "dropping unclaimed values");
            let mask = self.mask();
            for i in 0..count {
                let idx = (read.wrapping_add(i as u64) as usize) & mask;
                // SAFETY: slots in [read, write) hold initialized values and
                // we have exclusive access.
                unsafe {
                    self.buffer[idx].get_mut().assume_init_drop();
                }
            }
        }
    }
}

impl<T> fmt::Debug for Ring<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ring")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn push<T>(ring: &Ring<T>, value: T) -> bool {
        // SAFETY: tests enqueue from a single thread.
        unsafe { ring.try_push(value) }.is_ok()
    }

    #[test]
    fn test_ring_capacity_rounding() {
        assert_eq!(Ring::<u64>::with_capacity(10).unwrap().capacity(), 16);
        assert_eq!(Ring::<u64>::with_capacity(16).unwrap().capacity(), 16);
        assert_eq!(Ring::<u64>::with_capacity(1).unwrap().capacity(), 1);
        assert!(matches!(
            Ring::<u64>::with_capacity(0),
            Err(ConfigError::ZeroCapacity)
        ));
    }

    #[test]
    fn test_ring_keeps_config() {
        let config = Config::with_capacity(100).unwrap().with_metrics(true);
        let ring = Ring::<u64>::new(config).unwrap();
        assert_eq!(ring.config(), config);
        assert_eq!(ring.config().capacity(), 128);
        assert!(ring.config().enable_metrics);
    }

    #[test]
    fn test_ring_rejects_invalid_config() {
        let config = Config::new(crate::config::MAX_RING_BITS + 1, false);
        assert!(matches!(
            Ring::<u8>::new(config),
            Err(ConfigError::RingBitsTooLarge { .. })
        ));
    }

    #[test]
    fn test_ring_fifo() {
        let ring = Ring::<u64>::with_capacity(4).unwrap();

        assert!(push(&ring, 1));
        assert!(push(&ring, 2));
        assert!(push(&ring, 3));

        assert_eq!(ring.try_pop(), Some(1));
        assert_eq!(ring.try_pop(), Some(2));
        assert_eq!(ring.try_pop(), Some(3));
        assert_eq!(ring.try_pop(), None);
    }

    #[test]
    fn test_ring_backpressure() {
        let ring = Ring::<u64>::with_capacity(8).unwrap();

        for i in 0..8 {
            assert!(push(&ring, i), "push {} failed", i);
        }
        assert!(ring.is_full());

        // SAFETY: single-threaded test
        let err = unsafe { ring.try_push(99) }.unwrap_err();
        assert!(err.is_full());
        assert_eq!(err.into_inner(), 99);

        assert_eq!(ring.try_pop(), Some(0));
        assert!(push(&ring, 8));
        assert!(!push(&ring, 9));
    }

    #[test]
    fn test_ring_empty_pop() {
        let ring = Ring::<u64>::with_capacity(4).unwrap();
        assert!(ring.is_empty());
        assert_eq!(ring.try_pop(), None);
        assert_eq!(ring.try_pop(), None);
    }

    #[test]
    fn test_ring_capacity_one() {
        let ring = Ring::<u32>::with_capacity(1).unwrap();
        for i in 0..5 {
            assert!(push(&ring, i));
            assert!(!push(&ring, 100));
            assert_eq!(ring.try_pop(), Some(i));
            assert_eq!(ring.try_pop(), None);
        }
    }

    #[test]
    fn test_ring_wrap_around_keeps_order() {
        let ring = Ring::<u64>::with_capacity(4).unwrap();
        let mut next_out = 0;

        // Interleave pushes and pops so cursors lap the buffer many times
        for i in 0..100u64 {
            assert!(push(&ring, i));
            if i % 3 == 2 {
                while let Some(v) = ring.try_pop() {
                    assert_eq!(v, next_out);
                    next_out += 1;
                }
            }
        }
        while let Some(v) = ring.try_pop() {
            assert_eq!(v, next_out);
            next_out += 1;
        }
        assert_eq!(next_out, 100);
    }

    #[test]
    fn test_ring_len_stays_in_bounds() {
        let ring = Ring::<u64>::with_capacity(4).unwrap();
        assert_eq!(ring.len(), 0);
        for i in 0..6 {
            push(&ring, i);
            assert!(ring.len() <= ring.capacity());
        }
        assert_eq!(ring.len(), 4);
        ring.try_pop();
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn test_ring_push_slice() {
        let ring = Ring::<u32>::with_capacity(8).unwrap();

        // SAFETY: single-threaded test
        assert_eq!(unsafe { ring.push_slice(&[1, 2, 3]) }, 3);
        assert_eq!(unsafe { ring.push_slice(&[4, 5, 6, 7, 8, 9, 10]) }, 5);
        assert_eq!(unsafe { ring.push_slice(&[11]) }, 0);
        assert_eq!(unsafe { ring.push_slice(&[]) }, 0);

        let mut out = Vec::new();
        while let Some(v) = ring.try_pop() {
            out.push(v);
        }
        assert_eq!(out, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_ring_pop_batch() {
        let ring = Ring::<u64>::with_capacity(8).unwrap();
        let mut out = vec![100];

        assert_eq!(ring.pop_batch(&mut out, 4), 0);

        for i in 0..6 {
            assert!(push(&ring, i));
        }

        assert_eq!(ring.pop_batch(&mut out, 0), 0);
        assert_eq!(ring.pop_batch(&mut out, 4), 4);
        assert_eq!(out, vec![100, 0, 1, 2, 3]);
        assert_eq!(ring.pop_batch(&mut out, 10), 2);
        assert_eq!(out, vec![100, 0, 1, 2, 3, 4, 5]);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_ring_pop_batch_across_wrap() {
        let ring = Ring::<u64>::with_capacity(4).unwrap();
        for i in 0..3 {
            push(&ring, i);
        }
        let mut out = Vec::new();
        assert_eq!(ring.pop_batch(&mut out, 2), 2);

        // read = 2, write = 3; these wrap past the end of storage
        for i in 3..6 {
            assert!(push(&ring, i));
        }
        out.clear();
        assert_eq!(ring.pop_batch(&mut out, 8), 4);
        assert_eq!(out, vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_ring_close() {
        let ring = Ring::<String>::with_capacity(4).unwrap();
        assert!(push(&ring, "a".to_string()));
        ring.close();
        assert!(ring.is_closed());
        assert!(!ring.is_drained());

        // SAFETY: single-threaded test
        let err = unsafe { ring.try_push("b".to_string()) }.unwrap_err();
        assert!(err.is_closed());
        assert_eq!(err.into_inner(), "b");

        assert_eq!(ring.try_pop().as_deref(), Some("a"));
        assert!(ring.is_drained());
    }

    #[test]
    fn test_ring_metrics() {
        let ring = Ring::<u64>::new(Config::new(2, true)).unwrap();

        for i in 0..5 {
            push(&ring, i);
        }
        ring.try_pop();
        let mut out = Vec::new();
        ring.pop_batch(&mut out, 2);
        ring.pop_batch(&mut out, 8);
        ring.try_pop();

        let m = ring.metrics();
        assert_eq!(m.messages_pushed, 4);
        assert_eq!(m.push_full, 1);
        assert_eq!(m.messages_popped, 4);
        assert_eq!(m.batches_popped, 2);
        assert_eq!(m.pop_empty, 1);
        assert_eq!(m.pop_contended, 0);
    }

    #[test]
    fn test_ring_metrics_disabled() {
        let ring = Ring::<u64>::with_capacity(4).unwrap();
        push(&ring, 1);
        ring.try_pop();
        assert_eq!(ring.metrics(), MetricsSnapshot::default());
    }

    #[test]
    fn test_pop_moves_ownership_and_drop_releases_rest() {
        static DROP_COUNT: AtomicUsize = AtomicUsize::new(0);

        struct DropTracker {
            _id: u64,
        }

        impl Drop for DropTracker {
            fn drop(&mut self) {
                DROP_COUNT.fetch_add(1, Ordering::SeqCst);
            }
        }

        DROP_COUNT.store(0, Ordering::SeqCst);
        {
            let ring = Ring::<DropTracker>::with_capacity(4).unwrap();

            // Lap the buffer so reused slots are exercised
            for i in 0..10 {
                assert!(push(&ring, DropTracker { _id: i }));
                let popped = ring.try_pop();
                assert!(popped.is_some());
            }
            assert_eq!(DROP_COUNT.load(Ordering::SeqCst), 10);

            for i in 0..3 {
                assert!(push(&ring, DropTracker { _id: i }));
            }
            let mut out = Vec::new();
            assert_eq!(ring.pop_batch(&mut out, 1), 1);
            drop(out);
            assert_eq!(DROP_COUNT.load(Ordering::SeqCst), 11);
        }
        // The two unclaimed values are dropped with the ring
        assert_eq!(DROP_COUNT.load(Ordering::SeqCst), 13);
    }

    #[test]
    fn test_producer_cache_refresh_after_drain() {
        let ring = Ring::<u64>::with_capacity(2).unwrap();
        assert!(push(&ring, 1));
        assert!(push(&ring, 2));
        assert_eq!(ring.try_pop(), Some(1));
        assert_eq!(ring.try_pop(), Some(2));
        // Cached read cursor is stale (0); the slow path must refresh it
        assert!(push(&ring, 3));
        assert!(push(&ring, 4));
        assert!(!push(&ring, 5));
    }
}
