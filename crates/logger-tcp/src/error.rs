//! Error types for the TCP log sink

use proven_logger::SinkError;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur in the TCP log sink
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error with the operation that failed
    #[error("{0}: {1}")]
    Io(&'static str, #[source] io::Error),

    /// Connect or send did not finish in time
    #[error("{0}: timed out after {1:?}")]
    Timeout(&'static str, Duration),

    /// The sink needs a tokio runtime to run its background task
    #[error("no tokio runtime available for the network sink")]
    NoRuntime,

    /// The sink has been stopped
    #[error("network sink stopped")]
    Stopped,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for SinkError {
    fn from(error: Error) -> Self {
        match error {
            Error::Io(context, source) => Self::Io(context, source),
            Error::Stopped => Self::Stopped,
            other => Self::Other(Box::new(other)),
        }
    }
}
