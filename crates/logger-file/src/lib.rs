//! Size-capped rotating file sink.
//!
//! Appends composed log lines to a local file and keeps a single backup
//! generation. Writes happen synchronously on the logging thread; failures are
//! returned to the dispatcher, which reports them through the other channels.

#![warn(missing_docs, unreachable_pub)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod sink;

pub use config::{FileSinkConfig, FileSinkConfigBuilder};
pub use error::{Error, Result};
pub use sink::{AttachFileSink, FileSink};
