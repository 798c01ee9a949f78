//! Configuration for the TCP log sink

use crate::codec::MAX_FRAME_SIZE;
use std::time::Duration;

/// Configuration for a [`TcpSink`](crate::TcpSink)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpSinkConfig {
    /// Collector host name or address
    pub host: String,

    /// Collector port
    pub port: u16,

    /// Maximum queued records, `None` for an unbounded queue
    pub queue_capacity: Option<usize>,

    /// Deadline for each connect and each send, `None` to wait indefinitely
    pub timeout: Option<Duration>,

    /// Pause between failed connection attempts
    pub retry_delay: Duration,

    /// Largest encoded record accepted for sending; bigger records are dropped
    pub max_frame_size: usize,
}

impl TcpSinkConfig {
    /// Create a new configuration builder
    pub fn builder(host: impl Into<String>, port: u16) -> TcpSinkConfigBuilder {
        TcpSinkConfigBuilder {
            config: Self {
                host: host.into(),
                port,
                queue_capacity: Some(1000),
                timeout: Some(Duration::from_secs(5)),
                retry_delay: Duration::from_secs(1),
                max_frame_size: MAX_FRAME_SIZE,
            },
        }
    }

    /// `host:port`, as shown in reports
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Builder for [`TcpSinkConfig`]
#[derive(Debug)]
pub struct TcpSinkConfigBuilder {
    config: TcpSinkConfig,
}

impl TcpSinkConfigBuilder {
    /// Set the queue capacity. Zero means unbounded.
    #[must_use]
    pub const fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = if capacity == 0 { None } else { Some(capacity) };
        self
    }

    /// Set the connect/send deadline
    #[must_use]
    pub const fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the deadline from fractional seconds. Zero, negative or
    /// non-finite values disable it.
    #[must_use]
    pub fn timeout_secs(mut self, secs: f64) -> Self {
        self.config.timeout = Duration::try_from_secs_f64(secs)
            .ok()
            .filter(|timeout| !timeout.is_zero());
        self
    }

    /// Set the pause between failed connection attempts
    #[must_use]
    pub const fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry_delay = delay;
        self
    }

    /// Set the largest encoded record the sink will send
    #[must_use]
    pub const fn max_frame_size(mut self, size: usize) -> Self {
        self.config.max_frame_size = size;
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> TcpSinkConfig {
        self.config
    }
}
