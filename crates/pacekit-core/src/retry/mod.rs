//! Retry-with-backoff for fallible operations.

pub mod policy;
pub mod runner;

pub use policy::RetryPolicy;
pub use runner::RetryRunner;
