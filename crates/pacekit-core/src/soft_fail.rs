//! Fallback values for failed operations.

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use pacekit_abstraction::Operation;
use tracing::warn;

/// Wraps an operation so that failures resolve to a fallback value.
///
/// The wrapped operation's error is handed to the fallback function and the
/// returned value becomes the output, so a `SoftFail` never fails. Handy
/// inside a batch, where one failing item would otherwise abort the whole
/// batch.
pub struct SoftFail<Op, F> {
    op: Op,
    fallback: Arc<F>,
}

impl<Op, F> SoftFail<Op, F> {
    /// Wrap `op`, mapping every error through `fallback`.
    pub fn new(op: Op, fallback: F) -> Self {
        Self {
            op,
            fallback: Arc::new(fallback),
        }
    }
}

impl<Op> SoftFail<Op, ()> {
    /// Wrap `op`, substituting a clone of `value` for every error.
    pub fn with_value<R, E>(op: Op, value: R) -> SoftFail<Op, impl Fn(E) -> R + Send + Sync>
    where
        R: Clone + Send + Sync,
    {
        SoftFail::new(op, move |_: E| value.clone())
    }
}

impl<Op: Clone, F> Clone for SoftFail<Op, F> {
    fn clone(&self) -> Self {
        Self {
            op: self.op.clone(),
            fallback: Arc::clone(&self.fallback),
        }
    }
}

impl<Op: fmt::Debug, F> fmt::Debug for SoftFail<Op, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftFail")
            .field("op", &self.op)
            .finish_non_exhaustive()
    }
}

impl<P, Op, F> Operation<P> for SoftFail<Op, F>
where
    Op: Operation<P>,
    Op::Output: 'static,
    Op::Error: 'static,
    Op::Future: 'static,
    F: Fn(Op::Error) -> Op::Output + Send + Sync + 'static,
{
    type Output = Op::Output;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Op::Output, Infallible>>;

    fn call(&self, input: P) -> Self::Future {
        let pending = self.op.call(input);
        let fallback = Arc::clone(&self.fallback);

        Box::pin(async move {
            match pending.await {
                Ok(output) => Ok(output),
                Err(error) => {
                    warn!(
                        operation = std::any::type_name::<Op>(),
                        "Operation failed, substituting fallback value"
                    );
                    Ok((*fallback)(error))
                }
            }
        })
    }
}
