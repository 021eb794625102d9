//! Fixed-size thread pool fed through a `BoundedQueue`.

use core::fmt;
use foundation_sync::{BoundedQueue, SyncError, SyncResult};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A thread pool whose job queue has a fixed capacity.
///
/// [`ThreadPool::execute`] blocks once `queue_capacity` jobs are waiting,
/// so a fast submitter is throttled to the speed of the workers. A job that
/// panics is counted and logged; its worker keeps draining the queue.
/// Dropping the pool queues one shutdown marker per worker behind the
/// pending jobs and joins every worker.
///
/// # Examples
///
/// ```
/// use foundation_testing::scenarios::ThreadPool;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let pool = ThreadPool::new(4, 2).unwrap();
/// let counter = Arc::new(AtomicUsize::new(0));
///
/// for _ in 0..10 {
///     let counter_clone = Arc::clone(&counter);
///     pool.execute(move || {
///         counter_clone.fetch_add(1, Ordering::Relaxed);
///     });
/// }
///
/// // Wait for all jobs to complete
/// drop(pool);
/// assert_eq!(counter.load(Ordering::Relaxed), 10);
/// ```
pub struct ThreadPool {
    workers: Vec<thread::JoinHandle<()>>,
    jobs: Arc<BoundedQueue<Option<Job>>>,
    panicked_jobs: Arc<AtomicUsize>,
}

impl ThreadPool {
    /// Starts `size` workers sharing a queue of `queue_capacity` slots.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidArgument`]
    /// when `size` or `queue_capacity` is zero.
    pub fn new(size: usize, queue_capacity: usize) -> SyncResult<Self> {
        if size == 0 {
            return Err(SyncError::InvalidArgument("thread pool needs at least one worker"));
        }

        let jobs = Arc::new(BoundedQueue::new(queue_capacity)?);
        let panicked_jobs = Arc::new(AtomicUsize::new(0));
        let workers = (0..size)
            .map(|id| {
                let jobs = Arc::clone(&jobs);
                let panicked_jobs = Arc::clone(&panicked_jobs);
                thread::spawn(move || {
                    while let Some(job) = jobs.pop() {
                        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                            panicked_jobs.fetch_add(1, Ordering::Relaxed);
                            tracing::error!(worker = id, "job panicked");
                        }
                    }
                    tracing::debug!(worker = id, "worker shutting down");
                })
            })
            .collect();

        Ok(Self {
            workers,
            jobs,
            panicked_jobs,
        })
    }

    /// Queues a job, blocking while the queue is full.
    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.jobs.push(Some(Box::new(f)));
    }

    /// Jobs that panicked so far.
    #[must_use]
    pub fn panicked_jobs(&self) -> usize {
        self.panicked_jobs.load(Ordering::Relaxed)
    }

    /// Number of jobs queued and not yet picked up by a worker.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.jobs.len()
    }
}

impl fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadPool")
            .field("workers", &self.workers.len())
            .field("pending", &self.pending())
            .field("panicked_jobs", &self.panicked_jobs())
            .finish()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        for _ in 0..self.workers.len() {
            self.jobs.push(None);
        }

        let panicked = self
            .workers
            .drain(..)
            .map(thread::JoinHandle::join)
            .filter(Result::is_err)
            .count();
        if panicked > 0 {
            tracing::error!(panicked, "thread pool workers panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;

    #[test]
    fn test_zero_sizes_are_rejected() {
        assert!(ThreadPool::new(0, 4).unwrap_err().is_invalid_argument());
        assert!(ThreadPool::new(2, 0).unwrap_err().is_invalid_argument());
    }

    /// WHY: A full job queue must hold the submitter back, not grow
    /// WHAT: With the only worker parked, the queue never exceeds its capacity
    #[test]
    #[ntest::timeout(10000)]
    fn test_submission_is_bounded() {
        let pool = ThreadPool::new(1, 2).unwrap();
        let gate = Arc::new(Barrier::new(2));
        let ran = Arc::new(AtomicUsize::new(0));

        {
            let gate = Arc::clone(&gate);
            pool.execute(move || {
                gate.wait();
            });
        }
        for _ in 0..2 {
            let ran = Arc::clone(&ran);
            pool.execute(move || {
                ran.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert!(pool.pending() <= 2);

        gate.wait();
        drop(pool);
        assert_eq!(ran.load(Ordering::SeqCst), 2);
    }

    /// WHY: A panicking job must not take its worker down with it, or the
    /// shutdown markers outnumber the workers left to consume them
    /// WHAT: Two of three workers run panicking jobs; the pool still runs
    /// later jobs and drops without hanging
    #[test]
    #[ntest::timeout(10000)]
    fn test_panicking_jobs_keep_workers_alive() {
        let pool = ThreadPool::new(3, 1).unwrap();
        let ran = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            pool.execute(|| panic!("job failed"));
        }
        for _ in 0..6 {
            let ran = Arc::clone(&ran);
            pool.execute(move || {
                ran.fetch_add(1, Ordering::SeqCst);
            });
        }

        let panicked = Arc::clone(&pool.panicked_jobs);
        drop(pool);
        assert_eq!(ran.load(Ordering::SeqCst), 6);
        assert_eq!(panicked.load(Ordering::SeqCst), 2);
    }
}
