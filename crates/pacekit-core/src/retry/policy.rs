//! Backoff policy for retrying failed operations.

use std::time::Duration;

use super::runner::RetryRunner;

/// Retry policy with power-law backoff, a delay ceiling and subtractive jitter.
///
/// The default settings produce delays of roughly 250ms, 2s, 6.75s, 16s and
/// 31.25s (before jitter) across six attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first call.
    pub max_attempts: u32,
    /// Delay after the first failure.
    pub initial_delay: Duration,
    /// Power applied to the failure count. Fractional values are fine.
    pub backoff_exponent: f64,
    /// Upper limit on a single delay.
    pub max_delay: Duration,
    /// Fraction (0.0-1.0) of the delay that jitter may remove.
    pub jitter_fraction: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            initial_delay: Duration::from_millis(250),
            backoff_exponent: 3.0,
            max_delay: Duration::from_secs(300),
            jitter_fraction: 0.25,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy.
    pub fn new(
        max_attempts: u32,
        initial_delay: Duration,
        backoff_exponent: f64,
        max_delay: Duration,
        jitter_fraction: f64,
    ) -> Self {
        Self {
            max_attempts,
            initial_delay,
            backoff_exponent,
            max_delay,
            jitter_fraction,
        }
    }

    /// A policy that calls the operation once and never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    pub fn with_backoff_exponent(mut self, backoff_exponent: f64) -> Self {
        self.backoff_exponent = backoff_exponent;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_jitter_fraction(mut self, jitter_fraction: f64) -> Self {
        self.jitter_fraction = jitter_fraction;
        self
    }

    /// Attempt cap actually enforced; zero behaves like a single attempt.
    pub fn effective_max_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Check if another attempt is allowed after `failures` failed ones.
    pub fn should_retry(&self, failures: u32) -> bool {
        failures < self.effective_max_attempts()
    }

    /// Capped delay after `failures` failures, before jitter.
    ///
    /// `initial_delay * failures^backoff_exponent`, capped at `max_delay`.
    /// The first failure (`failures == 1`) waits exactly `initial_delay`.
    /// Computed at nanosecond precision, so sub-millisecond delays survive.
    pub fn delay_for_attempt(&self, failures: u32) -> Duration {
        self.capped(self.delay_nanos(failures))
    }

    /// Delay after `failures` failures with jitter applied.
    ///
    /// `sample` is a uniform draw from `[0, 1)`; it removes
    /// `sample * jitter_fraction` of the capped delay. Jitter only ever
    /// shortens the wait.
    pub fn jittered_delay(&self, failures: u32, sample: f64) -> Duration {
        let fraction = if self.jitter_fraction.is_finite() {
            self.jitter_fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let sample = if sample.is_finite() {
            sample.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let delay_ns = self.delay_nanos(failures);

        self.capped(delay_ns * (1.0 - fraction * sample))
    }

    /// Wrap `op` with this policy.
    pub fn wrap<Op>(self, op: Op) -> RetryRunner<Op> {
        RetryRunner::with_policy(op, self)
    }

    fn delay_nanos(&self, failures: u32) -> f64 {
        if failures == 0 {
            return 0.0;
        }

        let initial_ns = self.initial_delay.as_nanos() as f64;
        let max_ns = self.max_delay.as_nanos() as f64;

        // NaN and infinity both collapse to the ceiling here.
        (initial_ns * f64::from(failures).powf(self.backoff_exponent)).min(max_ns)
    }

    /// Round `nanos` to a `Duration`, never exceeding `max_delay`.
    fn capped(&self, nanos: f64) -> Duration {
        if nanos.is_nan() || nanos <= 0.0 {
            return Duration::ZERO;
        }
        if nanos >= self.max_delay.as_nanos() as f64 || nanos >= u64::MAX as f64 {
            return self.max_delay;
        }
        Duration::from_nanos(nanos.round() as u64).min(self.max_delay)
    }
}
