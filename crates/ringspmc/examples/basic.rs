//! One producer fans work out to a pool of consumers.
//!
//! Run with: `cargo run --example basic --features tracing`

use ringspmc_rs::{init_tracing, Channel, Config, PopError};
use std::thread;
use std::time::Instant;

const ITEMS: u64 = 1_000_000;
const CONSUMERS: usize = 4;

fn main() {
    init_tracing();

    let channel = Channel::<u64>::new(Config::with_capacity(1000).unwrap().with_metrics(true))
        .expect("valid config");
    println!("capacity: {}", channel.capacity());

    let workers: Vec<_> = (0..CONSUMERS)
        .map(|id| {
            let consumer = channel.consumer();
            thread::spawn(move || {
                let (mut count, mut sum) = (0u64, 0u64);
                loop {
                    match consumer.pop_with_backoff() {
                        Ok(v) => {
                            count += 1;
                            sum += v;
                        }
                        Err(PopError::Empty) => continue,
                        Err(PopError::Closed) => break,
                    }
                }
                println!("consumer {}: {} items", id, count);
                sum
            })
        })
        .collect();

    let start = Instant::now();
    let mut producer = channel.producer().expect("first producer");
    for i in 0..ITEMS {
        let mut value = i;
        while let Err(err) = producer.try_push(value) {
            value = err.into_inner();
            thread::yield_now();
        }
    }
    drop(producer);

    let sum: u64 = workers.into_iter().map(|w| w.join().unwrap()).sum();
    let elapsed = start.elapsed();

    assert_eq!(sum, ITEMS * (ITEMS - 1) / 2);
    println!(
        "{} items in {:?} ({:.1} M/s)",
        ITEMS,
        elapsed,
        ITEMS as f64 / elapsed.as_secs_f64() / 1e6
    );
    println!("{:#?}", channel.metrics());
}
