//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing_subscriber::EnvFilter;

/// Route `tracing` output through the test harness. Set `RUST_LOG=debug` to
/// see runner diagnostics.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Error produced by the fake operations below.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("attempt {attempt} failed for {input}")]
pub struct AttemptFailed {
    pub input: String,
    pub attempt: u32,
}

/// Records the (tokio) instant of every call an operation receives.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Instant>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a call and return its 1-based number.
    pub fn record(&self) -> u32 {
        let mut calls = self.calls.lock().unwrap();
        calls.push(Instant::now());
        calls.len() as u32
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Time between consecutive calls.
    pub fn gaps(&self) -> Vec<Duration> {
        let calls = self.calls.lock().unwrap();
        calls.windows(2).map(|pair| pair[1] - pair[0]).collect()
    }
}

/// An operation that fails its first `failures` calls, then echoes its input.
pub fn failing_times(
    failures: u32,
    log: CallLog,
) -> impl Fn(&'static str) -> std::future::Ready<Result<String, AttemptFailed>> + Send + Sync + 'static
{
    move |input: &'static str| {
        let attempt = log.record();
        let result = if attempt <= failures {
            Err(AttemptFailed {
                input: input.to_string(),
                attempt,
            })
        } else {
            Ok(format!("{} after {} attempts", input, attempt))
        };
        std::future::ready(result)
    }
}
