//! `PolicyRwLock` stress tests.

use crate::metrics::Metrics;
use crate::stress::{StressConfig, StressHarness, StressResult};
use foundation_sync::{LockSnapshot, Policy, PolicyRwCell};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

/// Pair of counters writers always bump together, so a reader that sees
/// them differ observed a torn write.
#[derive(Debug, Default)]
struct Ledger {
    front: u64,
    back: u64,
}

#[derive(Debug, Default)]
struct Occupancy {
    readers: AtomicUsize,
    writers: AtomicUsize,
}

fn batch_within_width(policy: Policy, snapshot: &LockSnapshot) -> bool {
    match policy.width() {
        Some(width) => {
            snapshot.batch_limit <= width.get()
                && (!snapshot.batch_active || snapshot.current_batch_readers <= snapshot.batch_limit)
        }
        None => !snapshot.batch_active,
    }
}

/// Hammers a [`PolicyRwCell`] with a mix of reads and writes under `policy`.
///
/// Whether an operation writes is decided by [`StressConfig::is_write`] on
/// `thread_id + iteration`, so every thread issues both kinds. An operation
/// fails when:
/// - a writer finds another writer or any reader inside
/// - a reader finds a writer inside or a torn ledger
/// - the lock's own counters disagree with the above, or an n-way batch
///   overruns its limit
///
/// # Examples
///
/// ```
/// use foundation_sync::Policy;
/// use foundation_testing::stress::{StressConfig, sync::run_rwlock_stress};
///
/// let config = StressConfig::new().threads(4).iterations(250);
/// let result = run_rwlock_stress(Policy::Writers, config);
///
/// assert!(result.is_clean());
/// assert_eq!(result.successes, 1000);
/// ```
#[must_use]
pub fn run_rwlock_stress(policy: Policy, config: StressConfig) -> StressResult {
    let cell = Arc::new(PolicyRwCell::new(policy, Ledger::default()));
    let inside = Arc::new(Occupancy::default());
    let hold = config.get_hold();

    StressHarness::new(config).run(move |thread_id, iteration| {
        if config.is_write(thread_id + iteration) {
            let mut ledger = cell.write();
            let alone = inside.writers.fetch_add(1, Ordering::SeqCst) == 0
                && inside.readers.load(Ordering::SeqCst) == 0;

            let snapshot = cell.snapshot();
            let counted = snapshot.active_writers == 1 && snapshot.active_readers == 0;

            ledger.front += 1;
            if !hold.is_zero() {
                thread::sleep(hold);
            }
            ledger.back += 1;

            inside.writers.fetch_sub(1, Ordering::SeqCst);
            alone && counted && batch_within_width(policy, &snapshot)
        } else {
            let ledger = cell.read();
            inside.readers.fetch_add(1, Ordering::SeqCst);
            let no_writer = inside.writers.load(Ordering::SeqCst) == 0;

            let snapshot = cell.snapshot();
            let counted = snapshot.active_writers == 0 && snapshot.active_readers >= 1;

            if !hold.is_zero() {
                thread::sleep(hold);
            }
            let consistent = ledger.front == ledger.back;

            inside.readers.fetch_sub(1, Ordering::SeqCst);
            no_writer && counted && consistent && batch_within_width(policy, &snapshot)
        }
    })
}

/// Measures how long readers and writers wait to acquire a lock under
/// `policy`, using the same read/write mix as [`run_rwlock_stress`].
///
/// Latencies are recorded in nanoseconds from the lock call until the
/// guard is held.
#[must_use]
pub fn measure_rwlock_latency(policy: Policy, config: StressConfig) -> Metrics {
    let cell = Arc::new(PolicyRwCell::new(policy, 0_u64));
    let reads = Arc::new(Mutex::new(Vec::with_capacity(config.get_iterations())));
    let writes = Arc::new(Mutex::new(Vec::new()));
    let hold = config.get_hold();

    let result = {
        let reads = Arc::clone(&reads);
        let writes = Arc::clone(&writes);
        StressHarness::new(config).run(move |thread_id, iteration| {
            let started = Instant::now();
            let (waited, samples) = if config.is_write(thread_id + iteration) {
                let mut value = cell.write();
                let waited = started.elapsed();
                *value += 1;
                if !hold.is_zero() {
                    thread::sleep(hold);
                }
                (waited, &writes)
            } else {
                let value = cell.read();
                let waited = started.elapsed();
                let _ = *value;
                if !hold.is_zero() {
                    thread::sleep(hold);
                }
                (waited, &reads)
            };

            let nanos = u64::try_from(waited.as_nanos()).unwrap_or(u64::MAX);
            match samples.lock() {
                Ok(mut guard) => guard.push(nanos),
                Err(poisoned) => poisoned.into_inner().push(nanos),
            }
            true
        })
    };

    Metrics::new(result.successes, result.duration)
        .with_read_latencies(drain(&reads))
        .with_write_latencies(drain(&writes))
        .with_throughput()
}

fn drain(samples: &Mutex<Vec<u64>>) -> Vec<u64> {
    match samples.lock() {
        Ok(mut guard) => core::mem::take(&mut *guard),
        Err(poisoned) => core::mem::take(&mut *poisoned.into_inner()),
    }
}
