//! Timing samples shared by concurrent workers.
//!
//! Workers append samples while they run; the driver reads them only after
//! joining every worker, then reduces each category to its mean.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Time to establish a TCP connection, in microseconds
    Connect,
    /// Bytes received per second over one request cycle
    Throughput,
}

#[derive(Debug, Default)]
pub struct Aggregator {
    connect: Mutex<Vec<u64>>,
    throughput: Mutex<Vec<u64>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn samples(&self, category: Category) -> MutexGuard<'_, Vec<u64>> {
        let samples = match category {
            Category::Connect => &self.connect,
            Category::Throughput => &self.throughput,
        };
        // A panicking worker cannot leave a half-pushed sample behind.
        samples.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self, category: Category, value: u64) {
        self.samples(category).push(value);
    }

    pub fn count(&self, category: Category) -> usize {
        self.samples(category).len()
    }

    /// Returns the arithmetic mean of `category` and clears it. `None` when no
    /// sample was recorded.
    pub fn reduce_and_reset(&self, category: Category) -> Option<u64> {
        let mut samples = self.samples(category);
        if samples.is_empty() {
            return None;
        }

        let total: u128 = samples.iter().map(|&v| u128::from(v)).sum();
        let mean = total / samples.len() as u128;
        samples.clear();

        Some(u64::try_from(mean).unwrap_or(u64::MAX))
    }
}

pub fn micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}

/// Bytes per second. Elapsed time is floored at one microsecond so tiny,
/// fast transfers never divide by zero.
pub fn throughput(bytes: u64, elapsed: Duration) -> u64 {
    let elapsed_us = u128::from(micros(elapsed).max(1));
    let rate = u128::from(bytes) * 1_000_000 / elapsed_us;
    u64::try_from(rate).unwrap_or(u64::MAX)
}
