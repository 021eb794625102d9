//! Stress tests for `foundation_sync` primitives.

pub mod queue;
pub mod rwlock;

pub use queue::run_queue_stress;
pub use rwlock::{measure_rwlock_latency, run_rwlock_stress};
