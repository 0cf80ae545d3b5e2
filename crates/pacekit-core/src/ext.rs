//! Combinators for wrapping operations fluently.

use pacekit_abstraction::Operation;

use crate::batch::{BatchJobRunner, BatchPolicy, BatchRunner};
use crate::retry::{RetryPolicy, RetryRunner};
use crate::soft_fail::SoftFail;

/// Operation-first constructors for every runner.
///
/// ```rust
/// use std::time::Duration;
/// use pacekit_core::{BatchPolicy, OperationExt, RetryPolicy};
///
/// async fn fetch(id: u32) -> Result<String, std::io::Error> {
///     Ok(format!("item-{id}"))
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), std::io::Error> {
/// let runner = fetch
///     .with_retry(RetryPolicy::default())
///     .batched(BatchPolicy::new(8, Duration::from_millis(50)));
/// let items = runner.run(vec![1, 2, 3]).await?;
/// assert_eq!(items, vec!["item-1", "item-2", "item-3"]);
/// # Ok(())
/// # }
/// ```
pub trait OperationExt<P>: Operation<P> + Sized {
    /// Retry failures with backoff.
    fn with_retry(self, policy: RetryPolicy) -> RetryRunner<Self> {
        RetryRunner::with_policy(self, policy)
    }

    /// Turn failures into `fallback(error)`.
    fn soft_fail_with<F>(self, fallback: F) -> SoftFail<Self, F>
    where
        F: Fn(Self::Error) -> Self::Output + Send + Sync,
    {
        SoftFail::new(self, fallback)
    }

    /// Run inputs in batches until all are processed.
    fn batched(self, policy: BatchPolicy) -> BatchRunner<Self> {
        BatchRunner::with_policy(self, policy)
    }

    /// Run inputs one batch per call, returning resumable snapshots.
    fn batched_with_progress(self, policy: BatchPolicy) -> BatchJobRunner<Self> {
        BatchJobRunner::with_policy(self, policy)
    }
}

impl<P, Op> OperationExt<P> for Op where Op: Operation<P> {}
