//! Error types for pacekit core.

use thiserror::Error;

/// Errors raised while loading or validating pacing configuration.
///
/// Operation failures are never converted into this type; runners hand them
/// back to the caller as they were produced.
#[derive(Error, Debug)]
pub enum PaceError {
    /// I/O errors while reading a configuration file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed TOML
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value that parses but cannot drive a runner
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for pacekit configuration.
pub type Result<T> = std::result::Result<T, PaceError>;
