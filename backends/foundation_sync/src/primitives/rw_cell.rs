//! Data-carrying wrapper around [`PolicyRwLock`].
//!
//! # Examples
//!
//! ```
//! use foundation_sync::primitives::{Policy, PolicyRwCell};
//!
//! let cell = PolicyRwCell::new(Policy::Writers, vec![1, 2, 3]);
//!
//! {
//!     let r1 = cell.read();
//!     let r2 = cell.read();
//!     assert_eq!(r1.len(), 3);
//!     assert_eq!(*r2, vec![1, 2, 3]);
//! }
//!
//! cell.write().push(4);
//! assert_eq!(cell.into_inner(), vec![1, 2, 3, 4]);
//! ```

use core::cell::UnsafeCell;
use core::fmt;
use core::ops::{Deref, DerefMut};

use crate::primitives::{LockSnapshot, Policy, PolicyRwLock, ReadGuard, WriteGuard};

/// A value protected by a [`PolicyRwLock`].
///
/// Shared references come from [`read`](Self::read), the exclusive one from
/// [`write`](Self::write); the admission order between them follows the
/// cell's [`Policy`].
pub struct PolicyRwCell<T: ?Sized> {
    lock: PolicyRwLock,
    data: UnsafeCell<T>,
}

// SAFETY: access to `data` is mediated by `lock`, which hands out either many
// shared references or one exclusive reference, never both.
unsafe impl<T: ?Sized + Send> Send for PolicyRwCell<T> {}
unsafe impl<T: ?Sized + Send + Sync> Sync for PolicyRwCell<T> {}

/// Shared access to the value inside a [`PolicyRwCell`].
#[must_use = "if unused the read lock is released immediately"]
pub struct CellReadGuard<'a, T: ?Sized + 'a> {
    data: &'a T,
    _guard: ReadGuard<'a>,
}

/// Exclusive access to the value inside a [`PolicyRwCell`].
#[must_use = "if unused the write lock is released immediately"]
pub struct CellWriteGuard<'a, T: ?Sized + 'a> {
    data: &'a mut T,
    _guard: WriteGuard<'a>,
}

impl<T> PolicyRwCell<T> {
    #[must_use]
    pub fn new(policy: Policy, data: T) -> Self {
        Self {
            lock: PolicyRwLock::new(policy),
            data: UnsafeCell::new(data),
        }
    }

    #[must_use]
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: ?Sized> PolicyRwCell<T> {
    /// Blocks until shared access is admitted.
    pub fn read(&self) -> CellReadGuard<'_, T> {
        let guard = self.lock.read();
        // SAFETY: a reader is admitted, so no writer holds the lock.
        let data = unsafe { &*self.data.get() };
        CellReadGuard {
            data,
            _guard: guard,
        }
    }

    /// Blocks until exclusive access is admitted.
    pub fn write(&self) -> CellWriteGuard<'_, T> {
        let guard = self.lock.write();
        // SAFETY: the writer is admitted, so nobody else holds the lock.
        let data = unsafe { &mut *self.data.get() };
        CellWriteGuard {
            data,
            _guard: guard,
        }
    }

    /// Since this takes `&mut self`, no locking is needed.
    #[must_use]
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    #[must_use]
    pub const fn policy(&self) -> Policy {
        self.lock.policy()
    }

    #[must_use]
    pub fn snapshot(&self) -> LockSnapshot {
        self.lock.snapshot()
    }
}

impl<T: ?Sized> Deref for CellReadGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        self.data
    }
}

impl<T: ?Sized> Deref for CellWriteGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        self.data
    }
}

impl<T: ?Sized> DerefMut for CellWriteGuard<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        self.data
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for CellReadGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for CellWriteGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T: ?Sized> fmt::Debug for PolicyRwCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyRwCell")
            .field("lock", &self.lock)
            .finish_non_exhaustive()
    }
}
