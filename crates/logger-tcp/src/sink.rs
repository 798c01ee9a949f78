use crate::codec::RecordCodec;
use crate::config::TcpSinkConfig;
use crate::error::{Error, Result};
use crate::queue::BoundedQueue;

use std::fmt;
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::time::Duration;

use futures::SinkExt;
use proven_logger::{
    ComposedEntry, Logger, QueuedRecord, Severity, Sink, SinkError, SinkReporter, SinkSlot,
};
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::time::{sleep, timeout};
use tokio_util::codec::FramedWrite;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, trace};

type Connection = FramedWrite<TcpStream, RecordCodec>;

/// Where the background task is in its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SinkState {
    /// Queue empty, waiting to be resumed
    Suspended = 0,
    /// Establishing the connection, or waiting to retry it
    Connecting = 1,
    /// Sending the head record
    Sending = 2,
    /// Stop observed, closing the connection
    Stopping = 3,
    /// Background task finished
    Stopped = 4,
}

impl SinkState {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Suspended,
            1 => Self::Connecting,
            2 => Self::Sending,
            3 => Self::Stopping,
            _ => Self::Stopped,
        }
    }
}

struct Inner {
    config: TcpSinkConfig,
    queue: BoundedQueue<Arc<QueuedRecord>>,
    resume: Notify,
    shutdown: CancellationToken,
    state: AtomicU8,
    sent: AtomicU64,
    reporter: Option<SinkReporter>,
}

impl Inner {
    fn state(&self) -> SinkState {
        SinkState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: SinkState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn report(&self, severity: Severity, message: &dyn fmt::Display) {
        if let Some(reporter) = &self.reporter {
            reporter.report(severity, message);
        }
    }

    async fn connect(&self) -> Result<Connection> {
        let address = (self.config.host.as_str(), self.config.port);
        let stream = bounded(
            self.config.timeout,
            "error connecting to collector",
            TcpStream::connect(address),
        )
        .await?;
        stream
            .set_nodelay(true)
            .map_err(|e| Error::Io("error configuring connection", e))?;
        let codec = RecordCodec::new().with_max_frame_size(self.config.max_frame_size);
        Ok(FramedWrite::new(stream, codec))
    }

    async fn send(&self, connection: &mut Connection, record: &QueuedRecord) -> Result<()> {
        bounded(
            self.config.timeout,
            "error sending record",
            connection.send(record),
        )
        .await
    }

    async fn run(self: Arc<Self>) {
        let address = self.config.address();
        let mut connection: Option<Connection> = None;
        let mut outage = false;

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            let Some(record) = self.queue.front() else {
                self.set_state(SinkState::Suspended);
                trace!("network sink suspended");
                tokio::select! {
                    () = self.resume.notified() => {}
                    () = self.shutdown.cancelled() => {}
                }
                continue;
            };

            if connection.is_none() {
                self.set_state(SinkState::Connecting);
                match self.connect().await {
                    Ok(established) => {
                        debug!(%address, "connected to log collector");
                        connection = Some(established);
                        if outage {
                            outage = false;
                            self.report(Severity::Note, &format!("reconnected to {address}"));
                        }
                    }
                    Err(e) => {
                        debug!(%address, error = %e, "log collector unreachable");
                        self.outage(&mut outage, &address, &e);
                        tokio::select! {
                            () = sleep(self.config.retry_delay) => {}
                            () = self.shutdown.cancelled() => {}
                        }
                        continue;
                    }
                }
            }
            let Some(established) = connection.as_mut() else {
                continue;
            };

            self.set_state(SinkState::Sending);
            let result = self.send(established, &record).await;
            match result {
                Ok(()) => {
                    self.queue.pop_front_if(|head| Arc::ptr_eq(head, &record));
                    self.sent.fetch_add(1, Ordering::Relaxed);
                }
                Err(Error::Io(_, e)) if e.kind() == io::ErrorKind::InvalidData => {
                    // the record itself cannot be framed, retrying will not help
                    self.queue.pop_front_if(|head| Arc::ptr_eq(head, &record));
                    self.report(Severity::Error, &format!("dropped unsendable record: {e}"));
                }
                Err(e) => {
                    debug!(%address, error = %e, "lost connection to log collector");
                    self.outage(&mut outage, &address, &e);
                    connection = None;
                }
            }
        }

        self.set_state(SinkState::Stopping);
        if let Some(mut established) = connection.take() {
            let limit = self.config.timeout.unwrap_or(Duration::from_secs(1));
            let _ = timeout(limit, established.close()).await;
        }
        self.set_state(SinkState::Stopped);
        debug!(%address, "network sink stopped");
    }

    /// Reports the first failure of an outage only.
    fn outage(&self, outage: &mut bool, address: &str, error: &Error) {
        if !*outage {
            *outage = true;
            self.report(Severity::Error, &format!("{address}: {error}"));
        }
    }
}

async fn bounded<T>(
    limit: Option<Duration>,
    context: &'static str,
    operation: impl Future<Output = io::Result<T>>,
) -> Result<T> {
    let result = match limit {
        Some(limit) => timeout(limit, operation)
            .await
            .map_err(|_| Error::Timeout(context, limit))?,
        None => operation.await,
    };
    result.map_err(|e| Error::Io(context, e))
}

/// Ships queued records to a remote collector over one persistent TCP
/// connection.
///
/// [`ship`](Self::ship) only touches the in-memory queue. A background task
/// sends the oldest record, removes it once the send has completed, and
/// reconnects after any failure. Delivery is best-effort: records are lost
/// under sustained overflow and may be duplicated if the process dies between
/// a send and its removal.
pub struct TcpSink {
    inner: Arc<Inner>,
    tracker: TaskTracker,
}

impl fmt::Debug for TcpSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpSink")
            .field("config", &self.inner.config)
            .field("state", &self.state())
            .field("queued", &self.queued())
            .finish_non_exhaustive()
    }
}

impl TcpSink {
    /// Start a sink and its background task on the current tokio runtime.
    ///
    /// Failures of the background task are reported through `reporter`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRuntime`] when called outside a tokio runtime.
    pub fn spawn(config: TcpSinkConfig, reporter: Option<SinkReporter>) -> Result<Self> {
        let handle = Handle::try_current().map_err(|_| Error::NoRuntime)?;

        let inner = Arc::new(Inner {
            queue: BoundedQueue::new(config.queue_capacity),
            config,
            resume: Notify::new(),
            shutdown: CancellationToken::new(),
            state: AtomicU8::new(SinkState::Suspended as u8),
            sent: AtomicU64::new(0),
            reporter,
        });

        let tracker = TaskTracker::new();
        tracker.spawn_on(inner.clone().run(), &handle);
        tracker.close();

        debug!(address = %inner.config.address(), "network sink started");
        Ok(Self { inner, tracker })
    }

    /// Queue `record` for delivery. Never waits; when the queue is full the
    /// oldest record is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stopped`] once [`stop`](Self::stop) has been called.
    pub fn ship(&self, record: QueuedRecord) -> Result<()> {
        if self.inner.shutdown.is_cancelled() {
            return Err(Error::Stopped);
        }
        if self.inner.queue.push(Arc::new(record)).is_some() {
            trace!("network sink queue full, dropped oldest record");
        }
        self.inner.resume.notify_one();
        Ok(())
    }

    /// Ask the background task to finish. It notices at its next wait, so a
    /// connect or send in progress completes first. Queued records are
    /// abandoned.
    pub fn stop(&self) {
        self.inner.shutdown.cancel();
    }

    /// Wait until the background task has finished.
    pub async fn stopped(&self) {
        self.tracker.wait().await;
    }

    /// Current background task state
    #[must_use]
    pub fn state(&self) -> SinkState {
        self.inner.state()
    }

    /// Records waiting to be sent
    #[must_use]
    pub fn queued(&self) -> usize {
        self.inner.queue.len()
    }

    /// Copies of the waiting records, oldest first
    #[must_use]
    pub fn queued_records(&self) -> Vec<QueuedRecord> {
        self.inner
            .queue
            .snapshot()
            .into_iter()
            .map(Arc::unwrap_or_clone)
            .collect()
    }

    /// Records dropped by queue overflow
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.inner.queue.dropped()
    }

    /// Records sent
    #[must_use]
    pub fn sent(&self) -> u64 {
        self.inner.sent.load(Ordering::Relaxed)
    }

    /// The sink's configuration
    #[must_use]
    pub fn config(&self) -> &TcpSinkConfig {
        &self.inner.config
    }
}

impl Drop for TcpSink {
    fn drop(&mut self) {
        self.inner.shutdown.cancel();
    }
}

impl Sink for TcpSink {
    fn submit(&self, entry: &ComposedEntry, _flush: bool) -> std::result::Result<(), SinkError> {
        self.ship(entry.record.clone()).map_err(SinkError::from)
    }

    fn shutdown(&self) {
        self.stop();
    }
}

/// Attaches a [`TcpSink`] to a [`Logger`].
pub trait AttachNetworkSink {
    /// Ship persistent entries to `host:port`, queueing at most
    /// `queue_capacity` records (zero for unbounded). `timeout_secs` bounds
    /// each connect and send; zero waits indefinitely. Replaces any network
    /// sink already attached.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRuntime`] when called outside a tokio runtime.
    fn attach_network_sink(
        &self,
        host: impl Into<String>,
        port: u16,
        queue_capacity: usize,
        timeout_secs: f64,
    ) -> Result<Arc<TcpSink>>;

    /// Attach a sink built from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRuntime`] when called outside a tokio runtime.
    fn attach_network_sink_with(&self, config: TcpSinkConfig) -> Result<Arc<TcpSink>>;

    /// Detach the network sink and stop its background task. Returns whether
    /// one was attached.
    fn detach_network_sink(&self) -> bool;
}

impl AttachNetworkSink for Logger {
    fn attach_network_sink(
        &self,
        host: impl Into<String>,
        port: u16,
        queue_capacity: usize,
        timeout_secs: f64,
    ) -> Result<Arc<TcpSink>> {
        self.attach_network_sink_with(
            TcpSinkConfig::builder(host, port)
                .queue_capacity(queue_capacity)
                .timeout_secs(timeout_secs)
                .build(),
        )
    }

    fn attach_network_sink_with(&self, config: TcpSinkConfig) -> Result<Arc<TcpSink>> {
        let sink = Arc::new(TcpSink::spawn(
            config,
            Some(self.reporter(SinkSlot::Network)),
        )?);
        self.attach_sink(SinkSlot::Network, sink.clone());
        Ok(sink)
    }

    fn detach_network_sink(&self) -> bool {
        self.detach_sink(SinkSlot::Network).is_some()
    }
}
