//! Error types for batch processing.

use thiserror::Error;

/// Errors returned by [`BatchJobRunner::step`](super::BatchJobRunner::step).
///
/// `E` is the wrapped operation's own error type.
#[derive(Error, Debug)]
pub enum BatchError<E> {
    /// `step` was called on a job whose `in_progress` flag is already false.
    #[error("This job is already completed")]
    JobAlreadyCompleted,

    /// The wrapped operation failed; the original error is carried unchanged.
    #[error(transparent)]
    Operation(E),
}

impl<E> BatchError<E> {
    /// True for caller mistakes as opposed to operation failures.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::JobAlreadyCompleted)
    }

    pub fn operation_error(&self) -> Option<&E> {
        match self {
            Self::Operation(error) => Some(error),
            Self::JobAlreadyCompleted => None,
        }
    }

    /// Recover the operation's own error, if that is what failed.
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            Self::Operation(error) => Some(error),
            Self::JobAlreadyCompleted => None,
        }
    }
}
