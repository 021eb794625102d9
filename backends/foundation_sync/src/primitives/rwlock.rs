//! Reader/writer lock with a selectable scheduling [`Policy`].
//!
//! Unlike `std::sync::RwLock`, the order in which blocked readers and
//! writers are let in is fixed at construction:
//!
//! - [`Policy::Readers`]: a reader only waits while a writer holds the lock.
//! - [`Policy::Writers`]: a reader also waits while any writer is waiting.
//! - [`Policy::NWay`]: when a writer releases the lock and another writer is
//!   waiting, a batch of at most `width` readers is admitted before that
//!   writer proceeds.
//!
//! The lock protects no data itself. Callers either pair the raw
//! `*_lock`/`*_unlock` calls, use the RAII [`ReadGuard`]/[`WriteGuard`], or
//! reach for [`PolicyRwCell`](super::PolicyRwCell) to have the data inside.
//!
//! # Examples
//!
//! ```
//! use foundation_sync::primitives::{Policy, PolicyRwLock};
//!
//! let lock = PolicyRwLock::new(Policy::n_way(3).unwrap());
//!
//! {
//!     let _r1 = lock.read();
//!     let _r2 = lock.read();
//!     assert_eq!(lock.snapshot().active_readers, 2);
//! }
//!
//! lock.writer_lock();
//! assert_eq!(lock.snapshot().active_writers, 1);
//! lock.writer_unlock();
//! ```

use core::fmt;
use std::sync::{Condvar, Mutex, MutexGuard};

use crate::primitives::{lock_unpoisoned, wait_unpoisoned, Policy};

/// N-way batch bookkeeping. Only touched under [`Policy::NWay`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Batch {
    active: bool,
    admitted: usize,
    limit: usize,
}

impl Batch {
    fn open(limit: usize) -> Self {
        Self {
            active: true,
            admitted: 0,
            limit,
        }
    }

    #[inline]
    fn is_full(&self) -> bool {
        self.active && self.admitted >= self.limit
    }
}

/// What `writer_unlock` should wake after releasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handoff {
    Nobody,
    Readers,
    Writer,
}

#[derive(Debug, Default)]
struct Counters {
    active_readers: usize,
    active_writers: usize,
    waiting_readers: usize,
    waiting_writers: usize,
    batch: Batch,
}

impl Counters {
    fn reader_must_wait(&self, policy: Policy) -> bool {
        match policy {
            Policy::Readers => self.active_writers > 0,
            Policy::Writers => self.active_writers > 0 || self.waiting_writers > 0,
            Policy::NWay { .. } => self.active_writers > 0 || self.batch.is_full(),
        }
    }

    fn writer_must_wait(&self) -> bool {
        self.active_writers > 0 || self.active_readers > 0
    }

    fn admit_reader(&mut self, policy: Policy) {
        self.waiting_readers -= 1;
        self.active_readers += 1;
        if matches!(policy, Policy::NWay { .. }) && self.batch.active {
            self.batch.admitted += 1;
        }
    }

    fn admit_writer(&mut self, policy: Policy) {
        self.waiting_writers -= 1;
        self.active_writers = 1;
        if matches!(policy, Policy::NWay { .. }) {
            self.batch = Batch::default();
        }
    }

    /// Releases the writer and decides who runs next.
    fn release_writer(&mut self, policy: Policy) -> Handoff {
        self.active_writers = 0;

        match policy {
            Policy::Readers => {
                if self.waiting_readers > 0 {
                    Handoff::Readers
                } else if self.waiting_writers > 0 {
                    Handoff::Writer
                } else {
                    Handoff::Nobody
                }
            }
            Policy::Writers => {
                if self.waiting_writers > 0 {
                    Handoff::Writer
                } else if self.waiting_readers > 0 {
                    Handoff::Readers
                } else {
                    Handoff::Nobody
                }
            }
            Policy::NWay { width } => {
                if self.waiting_writers == 0 {
                    self.batch = Batch::default();
                    return Handoff::Readers;
                }

                if self.waiting_readers == 0 {
                    return Handoff::Writer;
                }

                self.batch = Batch::open(self.waiting_readers.min(width.get()));
                debug!(
                    batch_limit = self.batch.limit,
                    waiting_readers = self.waiting_readers,
                    waiting_writers = self.waiting_writers,
                    "opening reader batch"
                );
                Handoff::Readers
            }
        }
    }

    fn snapshot(&self) -> LockSnapshot {
        LockSnapshot {
            active_readers: self.active_readers,
            active_writers: self.active_writers,
            waiting_readers: self.waiting_readers,
            waiting_writers: self.waiting_writers,
            batch_active: self.batch.active,
            current_batch_readers: self.batch.admitted,
            batch_limit: self.batch.limit,
        }
    }

    #[inline]
    fn check_invariants(&self) {
        debug_assert!(self.active_writers <= 1, "more than one active writer");
        debug_assert!(
            self.active_writers == 0 || self.active_readers == 0,
            "writer active alongside {} readers",
            self.active_readers
        );
        debug_assert!(
            !self.batch.active || self.batch.limit > 0,
            "active batch with a zero limit"
        );
        debug_assert!(
            self.batch.admitted <= self.batch.limit,
            "batch admitted {} readers over its limit of {}",
            self.batch.admitted,
            self.batch.limit
        );
    }
}

/// Point-in-time copy of a lock's counters, taken under its mutex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockSnapshot {
    pub active_readers: usize,
    pub active_writers: usize,
    pub waiting_readers: usize,
    pub waiting_writers: usize,
    pub batch_active: bool,
    pub current_batch_readers: usize,
    pub batch_limit: usize,
}

/// Who holds the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Idle,
    Reading(usize),
    Writing,
}

impl LockSnapshot {
    #[must_use]
    pub const fn state(&self) -> LockState {
        if self.active_writers > 0 {
            LockState::Writing
        } else if self.active_readers > 0 {
            LockState::Reading(self.active_readers)
        } else {
            LockState::Idle
        }
    }
}

/// A reader/writer lock whose admission order follows a [`Policy`].
///
/// All counters live behind one mutex; blocked readers park on
/// `readers_cv` and blocked writers on `writers_cv`. Every wait re-checks
/// its admit predicate, so spurious wakeups are harmless.
///
/// Lock and unlock calls must be balanced by the caller. An unmatched
/// unlock trips a debug assertion, and is otherwise ignored with a warning.
pub struct PolicyRwLock {
    policy: Policy,
    counters: Mutex<Counters>,
    readers_cv: Condvar,
    writers_cv: Condvar,
}

impl PolicyRwLock {
    /// Creates an unlocked lock scheduled by `policy`.
    #[must_use]
    pub fn new(policy: Policy) -> Self {
        debug!(%policy, "created policy rwlock");
        Self {
            policy,
            counters: Mutex::new(Counters::default()),
            readers_cv: Condvar::new(),
            writers_cv: Condvar::new(),
        }
    }

    #[must_use]
    pub const fn policy(&self) -> Policy {
        self.policy
    }

    #[inline]
    fn counters(&self) -> MutexGuard<'_, Counters> {
        lock_unpoisoned(&self.counters)
    }

    /// Acquires shared access, blocking while the policy's reader-admit
    /// predicate is false.
    pub fn reader_lock(&self) {
        let mut counters = self.counters();
        counters.waiting_readers += 1;
        counters.check_invariants();

        while counters.reader_must_wait(self.policy) {
            debug!(
                active_writers = counters.active_writers,
                waiting_writers = counters.waiting_writers,
                batch_readers = counters.batch.admitted,
                batch_limit = counters.batch.limit,
                "reader waiting"
            );
            counters = wait_unpoisoned(&self.readers_cv, counters);
        }

        counters.admit_reader(self.policy);
        counters.check_invariants();
        debug!(
            active_readers = counters.active_readers,
            waiting_readers = counters.waiting_readers,
            "reader admitted"
        );
    }

    /// Releases shared access. The last reader out wakes one waiting writer.
    pub fn reader_unlock(&self) {
        let mut counters = self.counters();
        debug_assert!(
            counters.active_readers > 0,
            "reader_unlock without a matching reader_lock"
        );
        if counters.active_readers == 0 {
            warn!("reader_unlock called with no active readers, ignoring");
            return;
        }

        counters.active_readers -= 1;
        counters.check_invariants();

        if counters.active_readers == 0 && counters.waiting_writers > 0 {
            debug!(waiting_writers = counters.waiting_writers, "last reader out, waking writer");
            self.writers_cv.notify_one();
        }
    }

    /// Acquires exclusive access, blocking while anyone else holds the lock.
    pub fn writer_lock(&self) {
        let mut counters = self.counters();
        counters.waiting_writers += 1;
        counters.check_invariants();

        while counters.writer_must_wait() {
            debug!(
                active_readers = counters.active_readers,
                active_writers = counters.active_writers,
                "writer waiting"
            );
            counters = wait_unpoisoned(&self.writers_cv, counters);
        }

        counters.admit_writer(self.policy);
        counters.check_invariants();
        debug!(waiting_writers = counters.waiting_writers, "writer admitted");
    }

    /// Releases exclusive access and hands the lock off according to the policy.
    pub fn writer_unlock(&self) {
        let mut counters = self.counters();
        debug_assert!(
            counters.active_writers == 1,
            "writer_unlock without a matching writer_lock"
        );
        if counters.active_writers == 0 {
            warn!("writer_unlock called with no active writer, ignoring");
            return;
        }

        let handoff = counters.release_writer(self.policy);
        counters.check_invariants();
        debug!(
            ?handoff,
            waiting_readers = counters.waiting_readers,
            waiting_writers = counters.waiting_writers,
            "writer released"
        );

        match handoff {
            Handoff::Readers => self.readers_cv.notify_all(),
            Handoff::Writer => self.writers_cv.notify_one(),
            Handoff::Nobody => {}
        }
    }

    /// Acquires shared access until the returned guard is dropped.
    pub fn read(&self) -> ReadGuard<'_> {
        self.reader_lock();
        ReadGuard { lock: self }
    }

    /// Acquires exclusive access until the returned guard is dropped.
    pub fn write(&self) -> WriteGuard<'_> {
        self.writer_lock();
        WriteGuard { lock: self }
    }

    /// Copies the current counters.
    #[must_use]
    pub fn snapshot(&self) -> LockSnapshot {
        self.counters().snapshot()
    }
}

impl fmt::Debug for PolicyRwLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyRwLock")
            .field("policy", &self.policy)
            .field("state", &self.snapshot())
            .finish()
    }
}

/// RAII shared access to a [`PolicyRwLock`].
#[must_use = "if unused the read lock is released immediately"]
pub struct ReadGuard<'a> {
    lock: &'a PolicyRwLock,
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        self.lock.reader_unlock();
    }
}

/// RAII exclusive access to a [`PolicyRwLock`].
#[must_use = "if unused the write lock is released immediately"]
pub struct WriteGuard<'a> {
    lock: &'a PolicyRwLock,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.lock.writer_unlock();
    }
}
