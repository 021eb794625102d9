//! Reusable stress testing infrastructure for `foundation_sync` primitives.
//!
//! This crate provides:
//! - **Stress test framework**: Configurable high-contention testing
//! - **Invariant runners**: queue capacity/FIFO and rwlock exclusion checks under load
//! - **Scenarios**: admission logging, a worker pool fed by a `BoundedQueue`
//! - **Performance metrics**: acquisition latency and throughput per lock policy
//! - **Criterion benchmarks**: queue ping-pong and contended lock acquisition
//!
//! # Examples
//!
//! ```rust
//! use foundation_sync::Policy;
//! use foundation_testing::stress::{StressConfig, sync::run_rwlock_stress};
//!
//! let config = StressConfig::new()
//!     .threads(4)
//!     .iterations(200)
//!     .write_every(4);
//!
//! let result = run_rwlock_stress(Policy::n_way(2).unwrap(), config);
//! assert_eq!(result.failures, 0);
//! assert_eq!(result.successes, 800);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)] // Common for testing crates

pub mod metrics;
pub mod scenarios;
pub mod stress;

// Re-export commonly used items
pub use metrics::{Metrics, PerformanceReport};
pub use stress::{StressConfig, StressHarness, StressResult};
