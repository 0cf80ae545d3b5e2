//! pacekit core - pacing wrappers for asynchronous operations.
//!
//! This crate wraps any [`Operation`] (an async, single-argument, fallible
//! function) with added policy:
//! - [`RetryRunner`]: retry with power-law backoff, a ceiling and jitter
//! - [`BatchJobRunner`]: bounded-concurrency batches, one per call, with a
//!   resumable [`BatchJob`] snapshot between calls
//! - [`BatchRunner`]: the same batching, run to completion in one call
//! - [`SoftFail`]: replace failures with a fallback value
//!
//! Runners never spawn tasks; all concurrency happens inside the caller's
//! task. Logging goes through `tracing`; installing a subscriber is up to the
//! application.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use pacekit_core::{BatchJob, BatchPolicy};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let runner = BatchPolicy::new(2, Duration::from_millis(10))
//!     .job_runner(|x: u32| async move { Ok::<_, std::io::Error>(x * 2) });
//!
//! let mut job: BatchJob<u32, u32> = BatchJob::new(vec![1, 2, 3, 4, 5]);
//! while !job.is_complete() {
//!     job = runner.step(&job).await.expect("doubling never fails");
//!     println!("{:.0}% done", job.percentage());
//! }
//! assert_eq!(job.completed, vec![2, 4, 6, 8, 10]);
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod ext;
pub mod retry;
pub mod soft_fail;

pub use batch::{BatchError, BatchJob, BatchJobRunner, BatchPolicy, BatchRunner};
pub use config::{BatchSettings, PaceConfig, RetrySettings};
pub use error::{PaceError, Result};
pub use ext::OperationExt;
pub use pacekit_abstraction::{DynOperation, Operation};
pub use retry::{RetryPolicy, RetryRunner};
pub use soft_fail::SoftFail;
