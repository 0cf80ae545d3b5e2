//! Concurrent execution of a single batch.

use futures::future::try_join_all;
use pacekit_abstraction::Operation;
use tokio::time::Instant;
use tracing::debug;

/// Run `op` over every item of one batch and wait for all of them.
///
/// Every call is started before any is awaited; all of them run in the
/// caller's task, nothing is spawned. Results keep the order of `items`.
/// The first failure is returned as-is and the remaining calls of the batch
/// are dropped.
pub(crate) async fn process_batch<P, Op>(
    op: &Op,
    items: Vec<P>,
) -> Result<Vec<Op::Output>, Op::Error>
where
    Op: Operation<P> + ?Sized,
{
    let size = items.len();
    let start_time = Instant::now();

    let results = match try_join_all(items.into_iter().map(|item| op.call(item))).await {
        Ok(results) => results,
        Err(error) => {
            debug!(
                batch_size = size,
                elapsed_ms = start_time.elapsed().as_millis(),
                "Batch aborted by operation failure"
            );
            return Err(error);
        }
    };

    debug!(
        batch_size = size,
        elapsed_ms = start_time.elapsed().as_millis(),
        "Batch processed"
    );

    Ok(results)
}
