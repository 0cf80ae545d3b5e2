//! Configuration module for pacekit.
//!
//! Policies can be loaded from TOML:
//!
//! ```toml
//! [retry]
//! max_attempts = 6
//! initial_delay_ms = 250
//! backoff_exponent = 3.0
//! max_delay_ms = 300000
//! jitter_fraction = 0.25
//!
//! [batch]
//! batch_size = 4
//! batch_delay_ms = 150
//! ```
//!
//! Every key is optional and falls back to the defaults shown above.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::batch::BatchPolicy;
use crate::error::{PaceError, Result};
use crate::retry::RetryPolicy;

/// `[retry]` section.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RetrySettings {
    /// Maximum attempts, including the first call.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay after the first failure, in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Backoff power.
    #[serde(default = "default_backoff_exponent")]
    pub backoff_exponent: f64,
    /// Delay ceiling, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Fraction of each delay that jitter may remove.
    #[serde(default = "default_jitter_fraction")]
    pub jitter_fraction: f64,
}

fn default_max_attempts() -> u32 {
    6
}

fn default_initial_delay_ms() -> u64 {
    250
}

fn default_backoff_exponent() -> f64 {
    3.0
}

fn default_max_delay_ms() -> u64 {
    300_000
}

fn default_jitter_fraction() -> f64 {
    0.25
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            backoff_exponent: default_backoff_exponent(),
            max_delay_ms: default_max_delay_ms(),
            jitter_fraction: default_jitter_fraction(),
        }
    }
}

impl RetrySettings {
    /// Reject values a [`RetryPolicy`] cannot sensibly run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(PaceError::InvalidConfig(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if !self.backoff_exponent.is_finite() || self.backoff_exponent < 0.0 {
            return Err(PaceError::InvalidConfig(format!(
                "retry.backoff_exponent must be a non-negative number, got {}",
                self.backoff_exponent
            )));
        }
        if !(0.0..=1.0).contains(&self.jitter_fraction) {
            return Err(PaceError::InvalidConfig(format!(
                "retry.jitter_fraction must be between 0 and 1, got {}",
                self.jitter_fraction
            )));
        }
        if self.max_delay_ms < self.initial_delay_ms {
            return Err(PaceError::InvalidConfig(format!(
                "retry.max_delay_ms ({}) is below retry.initial_delay_ms ({})",
                self.max_delay_ms, self.initial_delay_ms
            )));
        }
        Ok(())
    }

    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.initial_delay_ms),
            self.backoff_exponent,
            Duration::from_millis(self.max_delay_ms),
            self.jitter_fraction,
        )
    }
}

/// `[batch]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BatchSettings {
    /// Maximum concurrent calls per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Pause before every batch after the first, in milliseconds.
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
}

fn default_batch_size() -> usize {
    4
}

fn default_batch_delay_ms() -> u64 {
    150
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
        }
    }
}

impl BatchSettings {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(PaceError::InvalidConfig(
                "batch.batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_policy(&self) -> BatchPolicy {
        BatchPolicy::new(self.batch_size, Duration::from_millis(self.batch_delay_ms))
    }
}

/// Root configuration for pacekit.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PaceConfig {
    /// Retry configuration.
    #[serde(default)]
    pub retry: RetrySettings,
    /// Batch configuration.
    #[serde(default)]
    pub batch: BatchSettings,
}

impl PaceConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or a value is out of
    /// range.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is malformed, or holds an
    /// out-of-range value.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading pacing configuration");
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        self.retry.validate()?;
        self.batch.validate()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.to_policy()
    }

    pub fn batch_policy(&self) -> BatchPolicy {
        self.batch.to_policy()
    }
}
