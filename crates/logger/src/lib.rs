//! Process-local logging core.
//!
//! Turns structured log calls into a fixed-width text line and a structured
//! record, echoes the line to standard error under the quiet/verbose/debug
//! policy, and fans persistent entries out to whichever sinks are attached.
//! The sinks themselves live in `proven-logger-file` and `proven-logger-tcp`.
//!
//! Logging calls never fail and never block on the network.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

mod composer;
mod config;
mod console;
mod error;
mod formatter;
mod identity;
mod logger;
mod macros;
mod record;
mod severity;
mod sink;
pub mod test_support;
mod value;

pub use composer::{Composer, MESSAGE_INDENT, expand, layout_message};
pub use config::{LoggerConfig, LoggerConfigBuilder, Verbosity};
pub use error::{Error, Result, SinkError};
pub use formatter::{Formatter, indent, outdent, pretty, sanitize_text};
pub use identity::{IdentityRegistry, NameOverrides, current_task};
pub use logger::{Logger, SELF_TAG, SinkReporter};
pub use record::{
    ComposedEntry, EVENT_WIDTH, LogEntry, MODULE_WIDTH, QueuedRecord, SEVERITY_WIDTH, TASK_WIDTH,
};
pub use severity::Severity;
pub use sink::{Sink, SinkSlot};
pub use value::{DisplayType, Inspect, Value};
