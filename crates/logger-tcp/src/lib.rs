//! TCP network sink for the process logger.
//!
//! Persistent log records are queued in memory and shipped to a remote
//! collector by a background tokio task, framed as a 4-byte big-endian length
//! followed by the record as pretty-printed JSON. The caller never waits on
//! the network: a full queue drops its oldest record instead.

#![warn(missing_docs, unreachable_pub)]
#![forbid(unsafe_code)]

mod codec;
mod config;
mod error;
mod queue;
mod sink;

pub use codec::{FRAME_HEADER_SIZE, MAX_FRAME_SIZE, RecordCodec};
pub use config::{TcpSinkConfig, TcpSinkConfigBuilder};
pub use error::{Error, Result};
pub use queue::BoundedQueue;
pub use sink::{AttachNetworkSink, SinkState, TcpSink};
