//! Integration tests for the resumable batch runner.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use common::{AttemptFailed, CallLog, failing_times, init_tracing};
use futures::{StreamExt, TryStreamExt};
use pacekit_core::{
    BatchError, BatchJob, BatchJobRunner, BatchPolicy, OperationExt, RetryPolicy, SoftFail,
};
use tokio::time::Instant;

fn paced(batch_size: usize, delay_ms: u64) -> BatchPolicy {
    BatchPolicy::new(batch_size, Duration::from_millis(delay_ms))
}

#[tokio::test(start_paused = true)]
async fn test_doubling_five_items_in_batches_of_two() {
    init_tracing();
    let runner = paced(2, 150).job_runner(|x: u32| async move { Ok::<_, String>(x * 2) });
    let start = Instant::now();

    let job: BatchJob<u32, u32> = BatchJob::new(vec![1, 2, 3, 4, 5]);
    let job = runner.step(&job).await.unwrap();
    assert_eq!(job.completed, vec![2, 4]);
    assert_eq!(job.pending, vec![3, 4, 5]);
    assert_eq!(job.batched, 2);
    assert!(job.in_progress);
    assert_eq!(start.elapsed(), Duration::ZERO);

    let job = runner.step(&job).await.unwrap();
    assert_eq!(job.completed, vec![2, 4, 6, 8]);
    assert_eq!(job.pending, vec![5]);
    assert_eq!(job.batched, 2);
    assert!(job.in_progress);
    assert_eq!(start.elapsed(), Duration::from_millis(150));

    let job = runner.step(&job).await.unwrap();
    assert_eq!(job.completed, vec![2, 4, 6, 8, 10]);
    assert!(job.pending.is_empty());
    assert_eq!(job.batched, 1);
    assert!(!job.in_progress);
    assert_eq!(start.elapsed(), Duration::from_millis(300));
}

#[tokio::test(start_paused = true)]
async fn test_items_are_conserved_and_step_count_is_ceiling() {
    for batch_size in 1..=4 {
        let runner = paced(batch_size, 0).job_runner(|x: usize| async move { Ok::<_, String>(x) });

        for len in 0..=9 {
            let inputs: Vec<usize> = (0..len).collect();
            let mut job: BatchJob<usize, usize> = BatchJob::new(inputs.clone());
            let mut steps = 0;

            while !job.pending.is_empty() {
                job = runner.step(&job).await.unwrap();
                steps += 1;
                assert_eq!(job.completed.len() + job.pending.len(), len);
                assert!(job.batched <= batch_size);
            }

            assert_eq!(steps, len.div_ceil(batch_size));
            assert_eq!(steps, runner.policy().batches_for(len));
            assert_eq!(job.completed, inputs);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_step_on_completed_job_is_a_usage_error() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let runner = paced(2, 150).job_runner(move |x: u32| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move { Ok::<_, String>(x) }
    });

    let mut job: BatchJob<u32, u32> = BatchJob::new(vec![1]);
    job = runner.step(&job).await.unwrap();
    assert!(job.is_complete());

    let start = Instant::now();
    let err = runner.step(&job).await.unwrap_err();

    assert!(matches!(err, BatchError::JobAlreadyCompleted));
    assert!(err.is_usage_error());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_failed_step_can_be_retried_from_last_snapshot() {
    init_tracing();
    let failed_once = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&failed_once);
    // Input 3 fails the first time it is seen.
    let runner = paced(2, 150).job_runner(move |x: u32| {
        let fail = x == 3 && !flag.swap(true, Ordering::SeqCst);
        async move {
            if fail {
                Err(format!("item {} failed", x))
            } else {
                Ok(x * 10)
            }
        }
    });

    let first: BatchJob<u32, u32> = BatchJob::new(vec![1, 2, 3, 4, 5]);
    let second = runner.step(&first).await.unwrap();

    let err = runner.step(&second).await.unwrap_err();
    assert_eq!(err.operation_error(), Some(&"item 3 failed".to_string()));
    assert_eq!(second.completed, vec![10, 20]);
    assert_eq!(second.pending, vec![3, 4, 5]);

    let third = runner.step(&second).await.unwrap();
    assert_eq!(third.completed, vec![10, 20, 30, 40]);
    assert_eq!(third.pending, vec![5]);
}

#[tokio::test(start_paused = true)]
async fn test_resumed_job_starts_without_delay() {
    let runner = paced(2, 150).job_runner(|x: u32| async move { Ok::<_, String>(x) });
    let job: BatchJob<u32, u32> = BatchJob::resume(vec![3, 4], vec![1, 2]);

    let start = Instant::now();
    let job = runner.step(&job).await.unwrap();

    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(job.completed, vec![1, 2, 3, 4]);
    assert!(job.is_complete());
}

#[tokio::test(start_paused = true)]
async fn test_progress_stream_yields_every_snapshot() {
    let runner = paced(2, 150).job_runner(|x: u32| async move { Ok::<_, String>(x + 1) });
    let job: BatchJob<u32, u32> = BatchJob::new(vec![1, 2, 3, 4, 5]);
    let start = Instant::now();

    let snapshots: Vec<BatchJob<u32, u32>> = runner.progress(job).try_collect().await.unwrap();

    // No delay before the first batch, 150ms before each of the other two.
    assert_eq!(start.elapsed(), Duration::from_millis(300));
    let completed: Vec<usize> = snapshots.iter().map(|s| s.completed.len()).collect();
    assert_eq!(completed, vec![2, 4, 5]);
    let last = snapshots.last().unwrap();
    assert!(last.is_complete());
    assert_eq!(last.completed, vec![2, 3, 4, 5, 6]);
}

#[tokio::test(start_paused = true)]
async fn test_progress_stream_ends_at_first_error() {
    let runner = paced(1, 10).job_runner(|x: u32| async move {
        if x == 2 {
            Err("two is not allowed".to_string())
        } else {
            Ok(x)
        }
    });
    let job: BatchJob<u32, u32> = BatchJob::new(vec![1, 2, 3]);

    let items: Vec<_> = runner.progress(job).collect().await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap().completed, vec![1]);
    assert!(matches!(&items[1], Err(BatchError::Operation(msg)) if msg == "two is not allowed"));
}

#[tokio::test(start_paused = true)]
async fn test_progress_stream_on_completed_job_is_a_usage_error() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let runner = paced(2, 150).job_runner(move |x: u32| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move { Ok::<_, String>(x) }
    });
    let job: BatchJob<u32, u32> = BatchJob::new(vec![7]);
    let done = runner.step(&job).await.unwrap();
    assert!(done.is_complete());

    let items: Vec<_> = runner.progress(done).collect().await;

    assert_eq!(items.len(), 1);
    assert!(matches!(&items[0], Err(BatchError::JobAlreadyCompleted)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_progress_stream_of_empty_job_is_empty() {
    let runner = paced(2, 150).job_runner(|x: u32| async move { Ok::<_, String>(x) });
    let job: BatchJob<u32, u32> = BatchJob::new(Vec::new());

    let snapshots: Vec<BatchJob<u32, u32>> = runner.progress(job).try_collect().await.unwrap();

    assert!(snapshots.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_retry_inside_batch_absorbs_transient_failures() {
    let log = CallLog::new();
    let retrying = failing_times(1, log.clone()).with_retry(
        RetryPolicy::default()
            .with_initial_delay(Duration::from_millis(20))
            .with_jitter_fraction(0.0),
    );
    let runner = BatchJobRunner::with_policy(retrying, paced(2, 0));
    let job: BatchJob<&'static str, String> = BatchJob::new(vec!["a", "b"]);

    let job = runner.step(&job).await.unwrap();

    // Only the first call overall fails, so one retry is enough.
    assert_eq!(log.count(), 3);
    assert!(job.is_complete());
    assert_eq!(job.completed.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_soft_fail_keeps_the_batch_alive() {
    let log = CallLog::new();
    let soft = SoftFail::with_value::<String, AttemptFailed>(
        failing_times(2, log.clone()),
        "fallback".to_string(),
    );
    let runner = BatchJobRunner::with_policy(soft, paced(3, 0));
    let job: BatchJob<&'static str, String> = BatchJob::new(vec!["x", "y", "z"]);

    let job = runner.step(&job).await.unwrap();

    assert_eq!(
        job.completed,
        vec![
            "fallback".to_string(),
            "fallback".to_string(),
            "z after 3 attempts".to_string(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_survives_json_round_trip() {
    let runner = paced(2, 150).job_runner(|x: u32| async move { Ok::<_, String>(x * 2) });
    let job: BatchJob<u32, u32> = BatchJob::new(vec![1, 2, 3]);
    let job = runner.step(&job).await.unwrap();

    let saved = serde_json::to_string(&job).unwrap();
    let restored: BatchJob<u32, u32> = serde_json::from_str(&saved).unwrap();
    assert_eq!(restored, job);

    // A restored mid-progress job still pays the inter-batch delay.
    let start = Instant::now();
    let done = runner.step(&restored).await.unwrap();
    assert_eq!(start.elapsed(), Duration::from_millis(150));
    assert_eq!(done.completed, vec![2, 4, 6]);
}
