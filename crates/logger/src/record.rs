//! Log entry types

use crate::Severity;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Display width of the severity column.
pub const SEVERITY_WIDTH: usize = 6;
/// Display width of the module column.
pub const MODULE_WIDTH: usize = 6;
/// Display width of the event column.
pub const EVENT_WIDTH: usize = 8;
/// Display width of the caller-task column.
pub const TASK_WIDTH: usize = 4;

/// One log call, alive only while it is being dispatched.
#[derive(Debug, Clone, Copy)]
pub struct LogEntry<'a> {
    /// Severity of the entry
    pub severity: Severity,
    /// Short module tag
    pub module: &'a str,
    /// Short event tag
    pub event: &'a str,
    /// When the call was made
    pub timestamp: DateTime<Utc>,
    /// Expanded message, possibly spanning several lines
    pub message: &'a str,
    /// Display token of the calling task
    pub task: &'a str,
}

impl LogEntry<'_> {
    /// Snapshot suitable for the network sink.
    #[must_use]
    pub fn to_record(&self, env: &str) -> QueuedRecord {
        QueuedRecord {
            env: env.to_string(),
            timestamp: self.timestamp,
            severity: self.severity,
            module: self.module.to_string(),
            event: self.event.to_string(),
            message: self.message.to_string(),
        }
    }

    /// Timestamp in the `YYYY-MM-DD HH:MM:SS` form used in rendered lines.
    #[must_use]
    pub fn local_time(&self) -> String {
        self.timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }
}

/// Serializable snapshot of an entry, immutable once queued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedRecord {
    /// Environment tag
    pub env: String,
    /// When the entry was logged
    pub timestamp: DateTime<Utc>,
    /// Severity
    pub severity: Severity,
    /// Module tag
    pub module: String,
    /// Event tag
    pub event: String,
    /// Message, without column layout
    pub message: String,
}

/// Everything the dispatcher hands to sinks for one entry.
#[derive(Debug, Clone)]
pub struct ComposedEntry {
    /// Severity of the entry
    pub severity: Severity,
    /// The fixed-width line, newline terminated
    pub line: String,
    /// The structured record
    pub record: QueuedRecord,
}
