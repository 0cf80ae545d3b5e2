//! Retrying wrapper around an operation.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use pacekit_abstraction::Operation;
use rand::Rng;
use tracing::{debug, warn};

use super::policy::RetryPolicy;

/// Wraps an operation with retries and backoff.
///
/// Each call starts a fresh failure counter. On failure the operation is
/// called again with a clone of the original input after a backoff delay,
/// until it succeeds or [`RetryPolicy::max_attempts`] is reached, in which
/// case the last error is returned unchanged.
///
/// `RetryRunner` is itself an [`Operation`], so it can be handed to a batch
/// runner.
pub struct RetryRunner<Op> {
    /// Wrapped operation, shared with in-flight calls.
    op: Arc<Op>,
    /// Backoff settings.
    policy: RetryPolicy,
    /// Name used in diagnostic records.
    name: Arc<str>,
}

impl<Op> RetryRunner<Op> {
    /// Wrap `op` with the default policy.
    pub fn new(op: Op) -> Self {
        Self::with_policy(op, RetryPolicy::default())
    }

    /// Wrap `op` with `policy`.
    pub fn with_policy(op: Op, policy: RetryPolicy) -> Self {
        Self {
            op: Arc::new(op),
            policy,
            name: Arc::from(std::any::type_name::<Op>()),
        }
    }

    /// Override the operation name used in log records.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Arc::from(name.into());
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Call the operation, retrying failures according to the policy.
    pub async fn run<P>(&self, input: P) -> Result<Op::Output, Op::Error>
    where
        Op: Operation<P>,
        P: Clone,
    {
        retry_with_backoff(self.op.as_ref(), &self.policy, &self.name, input).await
    }
}

impl<Op> Clone for RetryRunner<Op> {
    fn clone(&self) -> Self {
        Self {
            op: Arc::clone(&self.op),
            policy: self.policy,
            name: Arc::clone(&self.name),
        }
    }
}

impl<Op> fmt::Debug for RetryRunner<Op> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryRunner")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<P, Op> Operation<P> for RetryRunner<Op>
where
    Op: Operation<P> + 'static,
    Op::Output: 'static,
    Op::Error: 'static,
    P: Clone + Send + 'static,
{
    type Output = Op::Output;
    type Error = Op::Error;
    type Future = BoxFuture<'static, Result<Op::Output, Op::Error>>;

    fn call(&self, input: P) -> Self::Future {
        let op = Arc::clone(&self.op);
        let policy = self.policy;
        let name = Arc::clone(&self.name);

        Box::pin(async move { retry_with_backoff(op.as_ref(), &policy, &name, input).await })
    }
}

async fn retry_with_backoff<P, Op>(
    op: &Op,
    policy: &RetryPolicy,
    name: &str,
    input: P,
) -> Result<Op::Output, Op::Error>
where
    Op: Operation<P> + ?Sized,
    P: Clone,
{
    let max_attempts = policy.effective_max_attempts();
    let mut failures: u32 = 0;

    loop {
        match op.call(input.clone()).await {
            Ok(output) => return Ok(output),
            Err(error) => {
                failures += 1;
                if failures >= max_attempts {
                    warn!(
                        operation = %name,
                        attempts = failures,
                        "Operation failed, retries exhausted"
                    );
                    return Err(error);
                }
            }
        }

        let delay = policy.jittered_delay(failures, jitter_sample());
        debug!(
            operation = %name,
            attempt = failures,
            delay = ?delay,
            "Operation failed, retrying after backoff"
        );
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Uniform draw from `[0, 1)`. The RNG handle is not `Send`, so it never
/// outlives this call.
fn jitter_sample() -> f64 {
    rand::thread_rng().gen_range(0.0..1.0)
}
