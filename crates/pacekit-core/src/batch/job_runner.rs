//! Batch runner that hands control back to the caller after every batch.

use futures::Stream;
use pacekit_abstraction::Operation;
use tokio::time::Instant;
use tracing::{debug, info};

use super::error::BatchError;
use super::processor::process_batch;
use super::types::{BatchJob, BatchPolicy};

/// Processes a [`BatchJob`] one batch per call.
///
/// The caller drives the job by feeding each returned snapshot back into
/// [`step`](Self::step) until [`BatchJob::is_complete`]. Between calls the
/// caller can inspect partial results, update a UI, or start dependent work.
#[derive(Debug, Clone)]
pub struct BatchJobRunner<Op> {
    /// Wrapped operation.
    op: Op,
    /// Batch size and pacing.
    policy: BatchPolicy,
}

impl<Op> BatchJobRunner<Op> {
    /// Wrap `op` with the default policy.
    pub fn new(op: Op) -> Self {
        Self::with_policy(op, BatchPolicy::default())
    }

    /// Wrap `op` with `policy`.
    pub fn with_policy(op: Op, policy: BatchPolicy) -> Self {
        Self { op, policy }
    }

    pub fn policy(&self) -> &BatchPolicy {
        &self.policy
    }

    /// Process the next batch of `job` and return the updated snapshot.
    ///
    /// Takes up to `batch_size` items from the front of `pending`, runs them
    /// concurrently and appends their results to `completed`. Every batch but
    /// the first of a job is preceded by the policy's `batch_delay`. A job
    /// with nothing pending comes back unchanged.
    ///
    /// `job` itself is never modified. If an operation fails, its error is
    /// returned as [`BatchError::Operation`], no result of that batch is kept,
    /// and the caller may retry from the same `job`.
    ///
    /// # Errors
    /// [`BatchError::JobAlreadyCompleted`] if `job.in_progress` is false; no
    /// work is done in that case.
    pub async fn step<P, R, E>(
        &self,
        job: &BatchJob<P, R>,
    ) -> Result<BatchJob<P, R>, BatchError<E>>
    where
        Op: Operation<P, Output = R, Error = E>,
        P: Clone,
        R: Clone,
    {
        if job.is_complete() {
            return Err(BatchError::JobAlreadyCompleted);
        }

        if job.pending.is_empty() {
            return Ok(job.clone());
        }

        if !job.is_first_step() && !self.policy.batch_delay.is_zero() {
            debug!(
                delay_ms = self.policy.batch_delay.as_millis(),
                "Delaying before next batch"
            );
            tokio::time::sleep(self.policy.batch_delay).await;
        }

        let taken = self.policy.effective_batch_size().min(job.pending.len());
        let start_time = Instant::now();

        let results = process_batch(&self.op, job.pending[..taken].to_vec())
            .await
            .map_err(BatchError::Operation)?;
        let next = job.advance(taken, results);

        debug!(
            batched = next.batched,
            completed = next.completed.len(),
            remaining = next.remaining(),
            elapsed_ms = start_time.elapsed().as_millis(),
            "Batch step finished"
        );

        if next.is_complete() {
            info!(total = next.total(), "Batch job complete");
        }

        Ok(next)
    }

    /// Drive `job` to completion, yielding the snapshot after every step.
    ///
    /// The stream ends once `pending` is empty. An error is yielded once and
    /// ends the stream; the previously yielded snapshot is the one to resume
    /// from. A job that is already complete yields a single
    /// [`BatchError::JobAlreadyCompleted`], as [`step`](Self::step) would.
    pub fn progress<P, R, E>(
        &self,
        job: BatchJob<P, R>,
    ) -> impl Stream<Item = Result<BatchJob<P, R>, BatchError<E>>>
    where
        Op: Operation<P, Output = R, Error = E>,
        P: Clone,
        R: Clone,
    {
        // `None` once the final snapshot has been yielded.
        futures::stream::try_unfold(Some(job), move |state| async move {
            let Some(job) = state else {
                return Ok::<_, BatchError<E>>(None);
            };
            if job.is_complete() {
                return Err(BatchError::JobAlreadyCompleted);
            }
            if job.pending.is_empty() {
                return Ok(None);
            }

            let next = self.step(&job).await?;
            let state = if next.is_complete() {
                None
            } else {
                Some(next.clone())
            };
            Ok(Some((next, state)))
        })
    }
}
