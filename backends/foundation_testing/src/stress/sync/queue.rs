//! `BoundedQueue` stress tests.

use crate::stress::{StressConfig, StressHarness, StressResult};
use foundation_sync::BoundedQueue;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

/// Runs a balanced producer/consumer stress test through one `BoundedQueue`.
///
/// The configured thread count is split into as many producers as
/// consumers (at least one of each). Each producer pushes
/// `(producer, sequence)` pairs and each consumer pops the same number of
/// items, so every blocking call eventually returns. A consumer operation
/// fails when it sees a producer's sequence go backwards. An observer thread
/// samples `len()` for the whole run; if it ever sees more entries than the
/// capacity, one extra failure is recorded.
///
/// Neither side's operation can panic, so neither side is left blocked on
/// a peer that died. The duration limit is ignored: stopping one side early
/// would leave the other blocked forever.
///
/// # Examples
///
/// ```
/// use foundation_testing::stress::{StressConfig, sync::run_queue_stress};
///
/// let config = StressConfig::new().threads(6).iterations(500).queue_capacity(4);
/// let result = run_queue_stress(config);
///
/// assert!(result.is_clean());
/// assert_eq!(result.successes, 3000);
/// ```
#[must_use]
pub fn run_queue_stress(config: StressConfig) -> StressResult {
    let pairs = (config.get_thread_count() / 2).max(1);
    let capacity = config.get_queue_capacity();
    let balanced = StressConfig::new()
        .threads(pairs * 2)
        .iterations(config.get_iterations());

    let Ok(queue) = BoundedQueue::<(usize, usize)>::new(capacity) else {
        return StressHarness::new(balanced.iterations(0)).run(|_, _| false);
    };
    let queue = Arc::new(queue);

    let done = Arc::new(AtomicBool::new(false));
    let max_seen = Arc::new(AtomicUsize::new(0));
    let observer = {
        let queue = Arc::clone(&queue);
        let done = Arc::clone(&done);
        let max_seen = Arc::clone(&max_seen);
        thread::spawn(move || {
            while !done.load(Ordering::Acquire) {
                max_seen.fetch_max(queue.len(), Ordering::Relaxed);
                thread::yield_now();
            }
        })
    };

    // last_seen[consumer][producer]
    let last_seen: Arc<Vec<Mutex<Vec<Option<usize>>>>> =
        Arc::new((0..pairs).map(|_| Mutex::new(vec![None; pairs])).collect());

    let mut result = StressHarness::new(balanced).run(move |thread_id, iteration| {
        if thread_id < pairs {
            queue.push((thread_id, iteration));
            return true;
        }

        let (producer, sequence) = queue.pop();
        let Some(consumer) = last_seen.get(thread_id - pairs) else {
            return false;
        };
        let mut seen = match consumer.lock() {
            Ok(seen) => seen,
            Err(poisoned) => poisoned.into_inner(),
        };
        let Some(previous) = seen.get_mut(producer) else {
            return false;
        };

        let in_order = previous.is_none_or(|last| last < sequence);
        *previous = Some(sequence);
        in_order
    });

    done.store(true, Ordering::Release);
    if observer.join().is_err() {
        result.panicked += 1;
    }
    let max_seen = max_seen.load(Ordering::Relaxed);
    if max_seen > capacity {
        tracing::error!(max_seen, capacity, "queue length exceeded its capacity");
        result.failures += 1;
    }
    result
}
