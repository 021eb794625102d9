//! Common synchronization scenarios built on `foundation_sync`.
//!
//! Provides reusable implementations of classic concurrency patterns:
//! - Producer-consumer pipelines over a `BoundedQueue`
//! - A thread pool with a bounded job queue
//! - An admission log for checking rwlock scheduling order

pub mod admission;
pub mod producer_consumer;
pub mod thread_pool;

pub use admission::{Admission, AdmissionLog};
pub use producer_consumer::{Item, Pipeline, PipelineReport};
pub use thread_pool::ThreadPool;
