//! Sink abstraction shared by the file and network sinks

use crate::error::SinkError;
use crate::record::ComposedEntry;
use std::fmt;

/// The attachment points a logger offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkSlot {
    /// Local capped file.
    File,
    /// Remote collector.
    Network,
}

impl fmt::Display for SinkSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => f.write_str("file"),
            Self::Network => f.write_str("network"),
        }
    }
}

/// A destination for persistent log entries.
///
/// `submit` runs on the calling thread and must not wait on the network.
pub trait Sink: Send + Sync + 'static {
    /// Accept one entry. `flush` asks for the entry to reach durable storage
    /// before returning, where the sink supports it.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry could not be accepted. The dispatcher
    /// reports it through the other channels and carries on.
    fn submit(&self, entry: &ComposedEntry, flush: bool) -> Result<(), SinkError>;

    /// Push buffered data to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush failed.
    fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }

    /// Called once when the sink is detached from its logger.
    fn shutdown(&self) {}
}
