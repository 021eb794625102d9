//! Blocking synchronization primitives for multi-threaded servers.
//!
//! - [`BoundedQueue`]: fixed-capacity FIFO work queue, blocking on full/empty.
//! - [`PolicyRwLock`]: reader/writer lock whose admission order is chosen by a [`Policy`].
//! - [`PolicyRwCell`]: a [`PolicyRwLock`] that owns the data it protects.
//!
//! Each primitive is one `std::sync::Mutex` plus its condition variables. The
//! critical sections never run caller code, so a poisoned internal mutex is
//! still consistent and is recovered rather than reported.

use std::sync::{Condvar, Mutex, MutexGuard};

pub mod policy;
pub mod queue;
pub mod rw_cell;
pub mod rwlock;

pub use policy::{Policy, PolicyKind};
pub use queue::BoundedQueue;
pub use rw_cell::{CellReadGuard, CellWriteGuard, PolicyRwCell};
pub use rwlock::{LockSnapshot, LockState, PolicyRwLock, ReadGuard, WriteGuard};

#[inline]
pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(err) => err.into_inner(),
    }
}

#[inline]
pub(crate) fn wait_unpoisoned<'a, T>(condvar: &Condvar, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
    match condvar.wait(guard) {
        Ok(guard) => guard,
        Err(err) => err.into_inner(),
    }
}
