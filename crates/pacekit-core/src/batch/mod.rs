//! Batch processing with bounded concurrency.
//!
//! Two runners share one pacing model: inputs are split into batches of at
//! most `batch_size`, every call of a batch runs concurrently, and each batch
//! after the first waits `batch_delay` before starting.
//!
//! - [`BatchJobRunner`] processes one batch per call and returns a resumable
//!   [`BatchJob`] snapshot.
//! - [`BatchRunner`] loops to completion and returns only the outputs.

pub mod error;
pub mod job_runner;
mod processor;
pub mod runner;
pub mod types;

pub use error::BatchError;
pub use job_runner::BatchJobRunner;
pub use runner::BatchRunner;
pub use types::{BatchJob, BatchPolicy};
