//! Stress test configuration.

use core::time::Duration;

/// Configuration for stress tests.
#[derive(Debug, Clone, Copy)]
pub struct StressConfig {
    /// Number of threads to spawn
    thread_count: usize,
    /// Number of iterations per thread
    iterations: usize,
    /// Optional maximum duration for the test
    duration: Option<Duration>,
    /// Every n-th operation of a rwlock run is a write
    write_every: usize,
    /// Time spent inside each critical section
    hold: Duration,
    /// Slots in the queue under test
    queue_capacity: usize,
}

impl StressConfig {
    /// Creates a new stress test configuration with default values.
    ///
    /// Defaults:
    /// - `thread_count`: 4
    /// - `iterations`: 1000
    /// - `duration`: None (no time limit)
    /// - `write_every`: 5 (one write per four reads)
    /// - `hold`: zero
    /// - `queue_capacity`: 8
    #[must_use]
    pub const fn new() -> Self {
        Self {
            thread_count: 4,
            iterations: 1000,
            duration: None,
            write_every: 5,
            hold: Duration::ZERO,
            queue_capacity: 8,
        }
    }

    /// Sets the number of threads to spawn.
    #[must_use]
    pub const fn threads(mut self, count: usize) -> Self {
        self.thread_count = count;
        self
    }

    /// Sets the number of iterations per thread.
    #[must_use]
    pub const fn iterations(mut self, count: usize) -> Self {
        self.iterations = count;
        self
    }

    /// Sets the maximum duration for the test.
    ///
    /// If the duration is reached, threads will stop early.
    #[must_use]
    pub const fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Makes every `n`-th operation of a rwlock run a write; 0 and 1 both
    /// mean "writes only".
    #[must_use]
    pub const fn write_every(mut self, n: usize) -> Self {
        self.write_every = n;
        self
    }

    /// Sets how long each critical section holds the lock.
    #[must_use]
    pub const fn hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    /// Sets the capacity of the queue under test. Clamped to at least 1.
    #[must_use]
    pub const fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = if capacity == 0 { 1 } else { capacity };
        self
    }

    /// Returns the thread count.
    #[must_use]
    pub const fn get_thread_count(&self) -> usize {
        self.thread_count
    }

    /// Returns the iteration count.
    #[must_use]
    pub const fn get_iterations(&self) -> usize {
        self.iterations
    }

    /// Returns the optional duration.
    #[must_use]
    pub const fn get_duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Returns the hold time per critical section.
    #[must_use]
    pub const fn get_hold(&self) -> Duration {
        self.hold
    }

    /// Returns the queue capacity.
    #[must_use]
    pub const fn get_queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Whether operation number `op` (counted across threads) should write.
    #[must_use]
    pub const fn is_write(&self, op: usize) -> bool {
        self.write_every <= 1 || op % self.write_every == 0
    }
}

impl Default for StressConfig {
    fn default() -> Self {
        Self::new()
    }
}
