//! Data types for batch processing.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::job_runner::BatchJobRunner;
use super::runner::BatchRunner;

/// Batch size and pacing shared by both batch runners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    /// Maximum number of concurrent calls per batch.
    pub batch_size: usize,
    /// Pause before every batch except the first.
    pub batch_delay: Duration,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            batch_size: 4,
            batch_delay: Duration::from_millis(150),
        }
    }
}

impl BatchPolicy {
    /// Create a new batch policy.
    pub fn new(batch_size: usize, batch_delay: Duration) -> Self {
        Self {
            batch_size,
            batch_delay,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_batch_delay(mut self, batch_delay: Duration) -> Self {
        self.batch_delay = batch_delay;
        self
    }

    /// Batch size actually used; zero behaves like one so every step makes
    /// progress.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }

    /// Number of steps needed to drain `total` items.
    pub fn batches_for(&self, total: usize) -> usize {
        total.div_ceil(self.effective_batch_size())
    }

    /// Wrap `op` in a progress-reporting runner using this policy.
    pub fn job_runner<Op>(self, op: Op) -> BatchJobRunner<Op> {
        BatchJobRunner::with_policy(op, self)
    }

    /// Wrap `op` in a run-to-completion runner using this policy.
    pub fn runner<Op>(self, op: Op) -> BatchRunner<Op> {
        BatchRunner::with_policy(op, self)
    }
}

/// Resumable snapshot of a batched job.
///
/// A value type: [`BatchJobRunner::step`] borrows one snapshot and returns a
/// new one, so a caller whose step failed still holds the last good snapshot
/// and may retry from it.
///
/// `completed.len() + pending.len()` always equals the number of inputs
/// submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchJob<P, R> {
    /// Inputs still to process, in submission order.
    pub pending: Vec<P>,
    /// Outputs so far, in the submission order of their inputs.
    pub completed: Vec<R>,
    /// Items processed by the most recent step. Zero on a fresh job.
    #[serde(default)]
    pub batched: usize,
    /// False once a step has drained `pending`.
    #[serde(default = "default_in_progress")]
    pub in_progress: bool,
}

fn default_in_progress() -> bool {
    true
}

impl<P, R> BatchJob<P, R> {
    /// Start a job over `inputs`.
    pub fn new(inputs: Vec<P>) -> Self {
        Self::resume(inputs, Vec::new())
    }

    /// Assemble a job from work already done elsewhere.
    ///
    /// The first step of a resumed job runs without the inter-batch delay.
    pub fn resume(pending: Vec<P>, completed: Vec<R>) -> Self {
        Self {
            pending,
            completed,
            batched: 0,
            in_progress: true,
        }
    }

    /// True once the runner has marked the job finished.
    pub fn is_complete(&self) -> bool {
        !self.in_progress
    }

    /// Total number of inputs submitted.
    pub fn total(&self) -> usize {
        self.completed.len() + self.pending.len()
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Get completion percentage.
    pub fn percentage(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 100.0;
        }
        (self.completed.len() as f64 / total as f64) * 100.0
    }

    /// Whether the next step is the first one for this snapshot.
    pub(crate) fn is_first_step(&self) -> bool {
        self.batched == 0
    }

    /// New snapshot with the first `taken` pending items replaced by
    /// `results`.
    pub(crate) fn advance(&self, taken: usize, results: Vec<R>) -> Self
    where
        P: Clone,
        R: Clone,
    {
        let pending = self.pending[taken..].to_vec();

        let mut completed = Vec::with_capacity(self.completed.len() + results.len());
        completed.extend_from_slice(&self.completed);
        completed.extend(results);

        Self {
            in_progress: !pending.is_empty(),
            pending,
            completed,
            batched: taken,
        }
    }
}
