//! Debug assertion macros for the cursor invariants.
//!
//! Only active in debug builds (`debug_assertions`), so release builds pay
//! nothing for them.

// =============================================================================
// Bounded occupancy: 0 <= write - read <= capacity
// =============================================================================

/// Assert that occupancy does not exceed capacity.
///
/// Used in: `Ring::publish()` after computing the new write cursor
macro_rules! debug_assert_bounded_count {
    ($count:expr, $capacity:expr) => {
        debug_assert!(
            $count <= $capacity,
            "bounded occupancy violated: count {} exceeds capacity {}",
            $count,
            $capacity
        )
    };
}

// =============================================================================
// Monotonic cursors
// =============================================================================

/// Assert that a cursor only moves forward.
///
/// Used in: `Ring::publish()` for the write cursor, `Ring::claim()` for the
/// read cursor
macro_rules! debug_assert_monotonic {
    ($name:literal, $old:expr, $new:expr) => {
        debug_assert!(
            $new >= $old,
            "monotonic cursor violated: {} decreased from {} to {}",
            $name,
            $old,
            $new
        )
    };
}

/// Assert that we haven't wrapped around u64 cursor space.
///
/// At 10B msg/sec a wrap takes ~58 years; this catches cursors that jump
/// backwards because of a bug, not real overflow.
macro_rules! debug_assert_no_wrap {
    ($name:literal, $old:expr, $new:expr) => {
        debug_assert!(
            $new > $old || $old.wrapping_sub($new) > (1u64 << 32),
            "potential cursor wrap: {} went from {} to {} (delta: {})",
            $name,
            $old,
            $new,
            $new.wrapping_sub($old)
        )
    };
}

// =============================================================================
// Claimed slots were published
// =============================================================================

/// Assert that a claimed cursor range lies below the observed write cursor.
///
/// **Invariant**: `slot(i) holds a value ⟺ read ≤ i < write`
///
/// Used in: `Ring::try_pop()` and `Ring::pop_batch()` after a successful CAS
macro_rules! debug_assert_claim_published {
    ($end:expr, $write:expr) => {
        debug_assert!(
            $end <= $write,
            "claimed range ends at {} beyond published write cursor {}",
            $end,
            $write
        )
    };
}

pub(crate) use debug_assert_bounded_count;
pub(crate) use debug_assert_claim_published;
pub(crate) use debug_assert_monotonic;
pub(crate) use debug_assert_no_wrap;
