//! Error types for the logger core

use std::io;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring a logger.
///
/// Logging calls themselves never return errors.
#[derive(Debug, Error)]
pub enum Error {
    /// An environment variable held a value that could not be parsed.
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv {
        /// The variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
    },

    /// A severity name was not recognised.
    #[error("unknown severity: {0}")]
    UnknownSeverity(String),
}

/// Failure reported by a sink to the dispatcher.
#[derive(Debug, Error)]
pub enum SinkError {
    /// I/O operation failed.
    #[error("{0}: {1}")]
    Io(&'static str, #[source] io::Error),

    /// The sink has been stopped and no longer accepts entries.
    #[error("sink stopped")]
    Stopped,

    /// Sink specific failure.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}
