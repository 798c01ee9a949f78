//! Error types for file-based logging

use proven_logger::SinkError;
use std::io;
use std::path::PathBuf;

/// Result type for file logger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during file logging
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error occurred
    #[error("{0}: {1}")]
    Io(&'static str, #[source] io::Error),

    /// Failed to create log directory
    #[error("failed to create log directory at {path}: {source}")]
    CreateDirectory {
        /// The path that failed to be created
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Failed to move the live file over the backup
    #[error("failed to rotate {from} to {to}: {source}")]
    Rotation {
        /// The live file
        from: PathBuf,
        /// The backup slot
        to: PathBuf,
        /// The underlying error
        source: io::Error,
    },
}

impl From<Error> for SinkError {
    fn from(error: Error) -> Self {
        match error {
            Error::Io(context, source) => Self::Io(context, source),
            other => Self::Other(Box::new(other)),
        }
    }
}
