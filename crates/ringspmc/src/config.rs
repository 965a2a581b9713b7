use crate::ConfigError;

/// Largest supported `ring_bits`: 4G slots, or 2G on 32-bit targets so
/// that the capacity still fits in a `usize`.
pub const MAX_RING_BITS: u8 = if usize::BITS > 32 {
    32
} else {
    (usize::BITS - 1) as u8
};

/// Configuration for [`Ring`](crate::Ring) and [`Channel`](crate::Channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Ring buffer size as power of 2 (default: 12 = 4K slots)
    pub ring_bits: u8,
    /// Enable metrics collection (slight overhead)
    pub enable_metrics: bool,
}

impl Config {
    /// Creates a new configuration with custom settings.
    pub const fn new(ring_bits: u8, enable_metrics: bool) -> Self {
        Self {
            ring_bits,
            enable_metrics,
        }
    }

    /// Creates a configuration whose capacity is the smallest power of two
    /// that is `>= hint`.
    ///
    /// A hint of zero is rejected rather than rounded, as is any hint above
    /// `2^MAX_RING_BITS`.
    ///
    /// ```
    /// use ringspmc_rs::Config;
    ///
    /// assert_eq!(Config::with_capacity(10).unwrap().capacity(), 16);
    /// assert_eq!(Config::with_capacity(16).unwrap().capacity(), 16);
    /// assert_eq!(Config::with_capacity(1).unwrap().capacity(), 1);
    /// ```
    pub fn with_capacity(hint: usize) -> Result<Self, ConfigError> {
        if hint == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        let max = 1usize << MAX_RING_BITS;
        if hint > max {
            return Err(ConfigError::CapacityTooLarge {
                requested: hint,
                max,
            });
        }
        let capacity = hint.next_power_of_two();
        Ok(Self::new(capacity.trailing_zeros() as u8, false))
    }

    /// Sets whether metrics are collected.
    pub const fn with_metrics(mut self, enable_metrics: bool) -> Self {
        self.enable_metrics = enable_metrics;
        self
    }

    /// Checks that the configuration describes an allocatable ring.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ring_bits > MAX_RING_BITS {
            return Err(ConfigError::RingBitsTooLarge {
                bits: self.ring_bits,
                max: MAX_RING_BITS,
            });
        }
        Ok(())
    }

    /// Returns the capacity of the ring buffer.
    #[inline]
    pub const fn capacity(&self) -> usize {
        1 << self.ring_bits
    }

    /// Returns the mask for index wrapping.
    #[inline]
    pub const fn mask(&self) -> usize {
        self.capacity() - 1
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ring_bits: 12, // 4K slots
            enable_metrics: false,
        }
    }
}

/// Low latency configuration (1K slots, fits in L1 cache for word-sized items)
pub const LOW_LATENCY_CONFIG: Config = Config::new(10, false);

/// High throughput configuration (64K slots)
pub const HIGH_THROUGHPUT_CONFIG: Config = Config::new(16, false);
