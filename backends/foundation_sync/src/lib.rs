//! Blocking synchronization primitives for multi-threaded servers.
//!
//! This crate provides:
//! - **`BoundedQueue<T>`**: fixed-capacity FIFO work queue that blocks producers
//!   when full and consumers when empty
//! - **`PolicyRwLock`**: reader/writer lock with reader-preferring,
//!   writer-preferring or bounded-batch (n-way) scheduling
//! - **`PolicyRwCell<T>`**: the same lock owning the value it protects
//!
//! # Examples
//!
//! ```rust
//! use foundation_sync::{BoundedQueue, Policy, PolicyRwLock};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let jobs = Arc::new(BoundedQueue::new(4).unwrap());
//! let lock = Arc::new(PolicyRwLock::new(Policy::Writers));
//!
//! let worker = {
//!     let jobs = Arc::clone(&jobs);
//!     let lock = Arc::clone(&lock);
//!     thread::spawn(move || {
//!         let job: u32 = jobs.pop();
//!         let _guard = lock.write();
//!         job * 2
//!     })
//! };
//!
//! jobs.push(21);
//! assert_eq!(worker.join().unwrap(), 42);
//! ```
//!
//! # Features
//!
//! - `log_debug`: trace every wait, admission and handoff through `tracing`
//! - `log_warnings`: report unbalanced unlocks (part of `standard`, the default)

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[macro_use]
mod macros;

pub mod errors;
pub mod primitives;

pub use errors::{SyncError, SyncResult};
pub use primitives::{
    BoundedQueue, CellReadGuard, CellWriteGuard, LockSnapshot, LockState, Policy, PolicyKind,
    PolicyRwCell, PolicyRwLock, ReadGuard, WriteGuard,
};
