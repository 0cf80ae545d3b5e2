//! Batch runner that only returns once every input has been processed.

use pacekit_abstraction::Operation;
use tokio::time::Instant;
use tracing::debug;

use super::processor::process_batch;
use super::types::BatchPolicy;

/// Runs all inputs through an operation in fixed-size batches and returns the
/// outputs in input order.
///
/// Pacing matches [`BatchJobRunner`](super::BatchJobRunner): no delay before
/// the first batch, `batch_delay` before each later one. There is no way to
/// resume: the first operation failure is returned and every result gathered
/// so far is discarded.
#[derive(Debug, Clone)]
pub struct BatchRunner<Op> {
    /// Wrapped operation.
    op: Op,
    /// Batch size and pacing.
    policy: BatchPolicy,
}

impl<Op> BatchRunner<Op> {
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

    /// Process every input and return the outputs in input order.
    pub async fn run<P, R, E>(&self, inputs: Vec<P>) -> Result<Vec<R>, E>
    where
        Op: Operation<P, Output = R, Error = E>,
    {
        let total = inputs.len();
        let batch_size = self.policy.effective_batch_size();
        let start_time = Instant::now();

        let mut completed = Vec::with_capacity(total);
        let mut pending = inputs.into_iter();
        let mut first_batch = true;

        loop {
            let batch: Vec<P> = pending.by_ref().take(batch_size).collect();
            if batch.is_empty() {
                break;
            }

            if !first_batch && !self.policy.batch_delay.is_zero() {
                debug!(
                    delay_ms = self.policy.batch_delay.as_millis(),
                    "Delaying between batches"
                );
                tokio::time::sleep(self.policy.batch_delay).await;
            }

            completed.extend(process_batch(&self.op, batch).await?);
            first_batch = false;
        }

        debug!(
            total_items = total,
            duration_ms = start_time.elapsed().as_millis(),
            "All batches completed"
        );

        Ok(completed)
    }
}
