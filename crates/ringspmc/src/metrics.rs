use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of a ring's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub messages_pushed: u64,
    pub messages_popped: u64,
    /// Enqueues rejected because the ring looked full.
    pub push_full: u64,
    /// Dequeues that found the ring empty.
    pub pop_empty: u64,
    /// Dequeues that lost the claim race to another consumer.
    pub pop_contended: u64,
    /// Successful multi-slot claims from `pop_batch`.
    pub batches_popped: u64,
}

/// Optional metrics for monitoring ring activity.
///
/// Every counter is updated with `Relaxed` ordering; they are statistics and
/// never take part in synchronization.
#[derive(Debug, Default)]
pub struct Metrics {
    messages_pushed: AtomicU64,
    messages_popped: AtomicU64,
    push_full: AtomicU64,
    pop_empty: AtomicU64,
    pop_contended: AtomicU64,
    batches_popped: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn add_messages_pushed(&self, n: u64) {
        self.messages_pushed.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_messages_popped(&self, n: u64) {
        self.messages_popped.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_push_full(&self) {
        self.push_full.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_pop_empty(&self) {
        self.pop_empty.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_pop_contended(&self) {
        self.pop_contended.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_batches_popped(&self) {
        self.batches_popped.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads every counter. The loads are independent, so the snapshot is
    /// not atomic as a whole.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_pushed: self.messages_pushed.load(Ordering::Relaxed),
            messages_popped: self.messages_popped.load(Ordering::Relaxed),
            push_full: self.push_full.load(Ordering::Relaxed),
            pop_empty: self.pop_empty.load(Ordering::Relaxed),
            pop_contended: self.pop_contended.load(Ordering::Relaxed),
            batches_popped: self.batches_popped.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let m = Metrics::new();
        assert_eq!(m.snapshot(), MetricsSnapshot::default());

        m.add_messages_pushed(3);
        m.add_messages_popped(2);
        m.add_push_full();
        m.add_pop_empty();
        m.add_pop_empty();
        m.add_pop_contended();
        m.add_batches_popped();

        let s = m.snapshot();
        assert_eq!(s.messages_pushed, 3);
        assert_eq!(s.messages_popped, 2);
        assert_eq!(s.push_full, 1);
        assert_eq!(s.pop_empty, 2);
        assert_eq!(s.pop_contended, 1);
        assert_eq!(s.batches_popped, 1);
    }
}
