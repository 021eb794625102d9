//! Lock acquisition metrics collection and reporting.

pub mod reporter;

pub use reporter::PerformanceReport;

use core::time::Duration;

/// Order statistics over a set of latency samples, in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencySummary {
    /// Number of samples summarised
    pub samples: usize,
    /// Fastest acquisition
    pub min: u64,
    /// Slowest acquisition
    pub max: u64,
    /// Arithmetic mean
    pub mean: f64,
    /// Mean of the two middle samples for an even count, rounded down
    pub median: u64,
    /// Nearest-rank 95th percentile
    pub p95: u64,
    /// Nearest-rank 99th percentile
    pub p99: u64,
}

impl LatencySummary {
    /// Summarises `samples`, or `None` when there are none.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_samples(samples: &[u64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted = samples.to_vec();
        sorted.sort_unstable();

        let sum: u128 = sorted.iter().map(|sample| u128::from(*sample)).sum();
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            sorted[mid - 1] / 2 + sorted[mid] / 2 + (sorted[mid - 1] % 2 + sorted[mid] % 2) / 2
        } else {
            sorted[mid]
        };

        Some(Self {
            samples: sorted.len(),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            mean: sum as f64 / sorted.len() as f64,
            median,
            p95: nearest_rank(&sorted, 0.95),
            p99: nearest_rank(&sorted, 0.99),
        })
    }
}

/// Nearest-rank percentile of an already sorted, non-empty slice.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn nearest_rank(sorted: &[u64], percentile: f64) -> u64 {
    let rank = ((sorted.len() as f64) * percentile).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// Wait-time measurements from a rwlock run.
#[derive(Debug, Clone)]
pub struct Metrics {
    /// Reader acquisition latencies (in nanoseconds)
    pub read_latencies: Vec<u64>,
    /// Writer acquisition latencies (in nanoseconds)
    pub write_latencies: Vec<u64>,
    /// Throughput (operations per second)
    pub throughput: f64,
    /// Total operations completed
    pub operations: usize,
    /// Total duration
    pub duration: Duration,
}

impl Metrics {
    /// Creates metrics with no latency samples.
    #[must_use]
    pub const fn new(operations: usize, duration: Duration) -> Self {
        Self {
            read_latencies: Vec::new(),
            write_latencies: Vec::new(),
            throughput: 0.0,
            operations,
            duration,
        }
    }

    /// Calculates throughput from operations and duration.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn with_throughput(mut self) -> Self {
        let secs = self.duration.as_secs_f64();
        self.throughput = if secs > 0.0 {
            self.operations as f64 / secs
        } else {
            0.0
        };
        self
    }

    /// Sets the reader acquisition latencies.
    #[must_use]
    pub fn with_read_latencies(mut self, latencies: Vec<u64>) -> Self {
        self.read_latencies = latencies;
        self
    }

    /// Sets the writer acquisition latencies.
    #[must_use]
    pub fn with_write_latencies(mut self, latencies: Vec<u64>) -> Self {
        self.write_latencies = latencies;
        self
    }

    /// Summary of the reader latencies, if any were recorded.
    #[must_use]
    pub fn read_summary(&self) -> Option<LatencySummary> {
        LatencySummary::from_samples(&self.read_latencies)
    }

    /// Summary of the writer latencies, if any were recorded.
    #[must_use]
    pub fn write_summary(&self) -> Option<LatencySummary> {
        LatencySummary::from_samples(&self.write_latencies)
    }
}
