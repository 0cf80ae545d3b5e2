//! Operation abstraction layer for pacekit.
//!
//! This module defines the one trait every runner wraps: an asynchronous,
//! single-argument operation that resolves to a `Result`.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

/// An asynchronous operation taking exactly one input.
///
/// Operations taking several arguments are adapted by the caller, usually by
/// taking a tuple or by capturing the extra arguments in a closure.
///
/// Implemented for every `Fn(P) -> Fut` where `Fut` resolves to a `Result`,
/// so plain `async fn`s and closures returning `async move` blocks can be
/// handed to any runner directly.
///
/// All operations must be `Send + Sync` so a runner can be shared across
/// tasks.
pub trait Operation<P>: Send + Sync {
    /// Value produced on success.
    type Output;
    /// Error produced on failure. Runners never inspect it.
    type Error;
    /// Future returned by [`Operation::call`].
    type Future: Future<Output = Result<Self::Output, Self::Error>> + Send;

    /// Start the operation for `input`.
    fn call(&self, input: P) -> Self::Future;
}

impl<F, Fut, P, R, E> Operation<P> for F
where
    F: Fn(P) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, E>> + Send,
{
    type Output = R;
    type Error = E;
    type Future = Fut;

    fn call(&self, input: P) -> Self::Future {
        self(input)
    }
}

type BoxedOperation<P, R, E> =
    dyn Operation<P, Output = R, Error = E, Future = BoxFuture<'static, Result<R, E>>>;

/// A type-erased, cheaply cloneable operation.
///
/// Useful to store operations of different concrete types side by side, or
/// to name the type of a wrapped operation in a struct field.
pub struct DynOperation<P, R, E> {
    inner: Arc<BoxedOperation<P, R, E>>,
}

/// Boxes the future of the wrapped operation so it fits [`DynOperation`].
struct BoxingAdapter<Op>(Op);

impl<P, Op> Operation<P> for BoxingAdapter<Op>
where
    Op: Operation<P>,
    Op::Future: 'static,
{
    type Output = Op::Output;
    type Error = Op::Error;
    type Future = BoxFuture<'static, Result<Op::Output, Op::Error>>;

    fn call(&self, input: P) -> Self::Future {
        Box::pin(self.0.call(input))
    }
}

impl<P, R, E> DynOperation<P, R, E> {
    /// Erase the concrete type of `op`.
    pub fn new<Op>(op: Op) -> Self
    where
        Op: Operation<P, Output = R, Error = E> + 'static,
        Op::Future: 'static,
    {
        Self {
            inner: Arc::new(BoxingAdapter(op)),
        }
    }
}

impl<P, R, E> Clone for DynOperation<P, R, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, R, E> fmt::Debug for DynOperation<P, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynOperation").finish_non_exhaustive()
    }
}

impl<P, R, E> Operation<P> for DynOperation<P, R, E> {
    type Output = R;
    type Error = E;
    type Future = BoxFuture<'static, Result<R, E>>;

    fn call(&self, input: P) -> Self::Future {
        self.inner.call(input)
    }
}
