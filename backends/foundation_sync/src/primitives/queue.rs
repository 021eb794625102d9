//! Bounded blocking FIFO queue.
//!
//! A fixed ring of slots guarded by one mutex, with a `not_full` condition
//! variable for producers and a `not_empty` one for consumers.
//!
//! # Examples
//!
//! ```
//! use foundation_sync::primitives::BoundedQueue;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let queue = Arc::new(BoundedQueue::new(2).unwrap());
//!
//! let producer = {
//!     let queue = Arc::clone(&queue);
//!     thread::spawn(move || {
//!         for i in 0..5 {
//!             queue.push(i);
//!         }
//!     })
//! };
//!
//! let received: Vec<i32> = (0..5).map(|_| queue.pop()).collect();
//! producer.join().unwrap();
//! assert_eq!(received, vec![0, 1, 2, 3, 4]);
//! ```

use core::fmt;
use std::sync::{Condvar, Mutex};

use crate::errors::{SyncError, SyncResult};
use crate::primitives::{lock_unpoisoned, wait_unpoisoned};

/// Fixed ring of slots. `[head, head + count)` (mod capacity) are live.
struct Ring<T> {
    slots: Box<[Option<T>]>,
    head: usize,
    tail: usize,
    count: usize,
}

impl<T> Ring<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn is_full(&self) -> bool {
        self.count == self.capacity()
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn push_back(&mut self, elem: T) {
        debug_assert!(!self.is_full(), "push_back on a full ring");
        debug_assert!(self.slots[self.tail].is_none(), "tail slot still holds an entry");

        self.slots[self.tail] = Some(elem);
        self.tail = (self.tail + 1) % self.capacity();
        self.count += 1;
    }

    fn pop_front(&mut self) -> Option<T> {
        let elem = self.slots[self.head].take()?;
        self.head = (self.head + 1) % self.capacity();
        self.count -= 1;
        Some(elem)
    }

    #[inline]
    fn check_invariants(&self) {
        debug_assert!(self.count <= self.capacity(), "count exceeds capacity");
        debug_assert_eq!(
            (self.head + self.count) % self.capacity(),
            self.tail,
            "tail is not count slots past head"
        );
    }
}

/// A fixed-capacity, blocking, multi-producer multi-consumer FIFO queue.
///
/// [`push`](Self::push) blocks while the queue is full and
/// [`pop`](Self::pop) blocks while it is empty. Payloads come out in the
/// order their pushes were serialized by the internal mutex. There is no
/// fairness among several blocked producers or several blocked consumers.
///
/// Dropping the queue drops any payloads still inside it.
pub struct BoundedQueue<T> {
    ring: Mutex<Ring<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Creates an empty queue holding at most `capacity` payloads.
    ///
    /// This is the only allocation the queue performs.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidArgument`] when `capacity` is 0.
    pub fn new(capacity: usize) -> SyncResult<Self> {
        if capacity == 0 {
            return Err(SyncError::InvalidArgument("queue capacity must be at least 1"));
        }

        debug!(capacity, "created bounded queue");
        Ok(Self {
            ring: Mutex::new(Ring::with_capacity(capacity)),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        })
    }

    /// Appends `elem` at the tail, blocking while the queue is full.
    ///
    /// Wakes one consumer blocked in [`pop`](Self::pop), if any.
    pub fn push(&self, elem: T) {
        let mut ring = lock_unpoisoned(&self.ring);

        while ring.is_full() {
            debug!(capacity = self.capacity, "queue full, producer waiting");
            ring = wait_unpoisoned(&self.not_full, ring);
        }

        ring.push_back(elem);
        ring.check_invariants();

        drop(ring);
        self.not_empty.notify_one();
    }

    /// Removes the payload at the head, blocking while the queue is empty.
    ///
    /// Wakes one producer blocked in [`push`](Self::push), if any.
    pub fn pop(&self) -> T {
        let mut ring = lock_unpoisoned(&self.ring);

        loop {
            if let Some(elem) = ring.pop_front() {
                ring.check_invariants();
                drop(ring);
                self.not_full.notify_one();
                return elem;
            }

            debug!("queue empty, consumer waiting");
            ring = wait_unpoisoned(&self.not_empty, ring);
        }
    }

    /// Appends `elem` only if a slot is free right now.
    ///
    /// # Errors
    ///
    /// Hands `elem` back when the queue is full.
    pub fn try_push(&self, elem: T) -> Result<(), T> {
        let mut ring = lock_unpoisoned(&self.ring);
        if ring.is_full() {
            return Err(elem);
        }

        ring.push_back(elem);
        ring.check_invariants();

        drop(ring);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Removes the head payload only if one is available right now.
    pub fn try_pop(&self) -> Option<T> {
        let mut ring = lock_unpoisoned(&self.ring);
        let elem = ring.pop_front()?;
        ring.check_invariants();

        drop(ring);
        self.not_full.notify_one();
        Some(elem)
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of payloads in the queue at the moment of the call.
    #[must_use]
    pub fn len(&self) -> usize {
        lock_unpoisoned(&self.ring).count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock_unpoisoned(&self.ring).is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        lock_unpoisoned(&self.ring).is_full()
    }
}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
