//! RingSPMC - Lock-Free Single-Producer Multi-Consumer Channel
//!
//! A fixed-capacity ring buffer that hands values from one producer thread
//! to any number of consumer threads without locks and without blocking.
//! Two monotonic `u64` cursors carry the whole protocol: the producer
//! publishes with a Release store, consumers observe with an Acquire load
//! and claim slots with a compare-and-exchange on the read cursor.
//!
//! # Key Features
//!
//! - Power-of-two capacity, index by mask
//! - Cursors on separate cache lines (no false sharing)
//! - Global FIFO: values are claimed strictly in enqueue order
//! - Exactly-once delivery across competing consumers
//! - Single-producer rule enforced by the type system ([`Producer`] is
//!   unique and takes `&mut self`)
//! - Slots are copied with byte-wise atomics (`atomic-memcpy`), so payload
//!   types must not contain padding bytes
//!
//! # Example
//!
//! ```
//! use ringspmc_rs::Channel;
//!
//! let channel = Channel::<u64>::with_capacity(10).unwrap(); // 16 slots
//! let mut producer = channel.producer().unwrap();
//! let consumer = channel.consumer();
//!
//! producer.try_push(42).unwrap();
//! producer.try_push(43).unwrap();
//!
//! // Any clone of the consumer may claim the next value
//! let other = consumer.clone();
//! assert_eq!(consumer.try_pop(), Some(42));
//! assert_eq!(other.try_pop(), Some(43));
//! assert_eq!(other.try_pop(), None);
//! ```

mod channel;
mod config;
mod error;
mod invariants;
mod metrics;
mod ring;
mod trace;

pub use channel::{Channel, Consumer, Producer};
pub use config::{Config, HIGH_THROUGHPUT_CONFIG, LOW_LATENCY_CONFIG, MAX_RING_BITS};
pub use error::{ChannelError, ConfigError, PopError, PushError};
pub use metrics::MetricsSnapshot;
pub use ring::Ring;
pub use trace::init_tracing;
