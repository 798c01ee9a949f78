//! Integration tests against a local collector

use chrono::Utc;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use proven_logger::test_support::SharedBuffer;
use proven_logger::{Logger, LoggerConfig, QueuedRecord, Severity, SinkSlot, Value};
use proven_logger_tcp::{
    AttachNetworkSink, Error, RecordCodec, SinkState, TcpSink, TcpSinkConfig,
};
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout};
use tokio_util::codec::FramedRead;

const WAIT: Duration = Duration::from_secs(5);

fn record(message: &str) -> QueuedRecord {
    QueuedRecord {
        env: "test".to_string(),
        timestamp: Utc::now(),
        severity: Severity::Note,
        module: "test".to_string(),
        event: "ship".to_string(),
        message: message.to_string(),
    }
}

fn config(port: u16) -> TcpSinkConfig {
    TcpSinkConfig::builder("127.0.0.1", port)
        .queue_capacity(100)
        .timeout_secs(1.0)
        .retry_delay(Duration::from_millis(20))
        .build()
}

/// A port nothing listens on.
async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_until(condition: impl Fn() -> bool) {
    let deadline = Instant::now() + WAIT;
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        sleep(Duration::from_millis(10)).await;
    }
}

async fn accept(listener: &TcpListener) -> FramedRead<TcpStream, RecordCodec> {
    let (stream, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
    FramedRead::new(stream, RecordCodec::new())
}

async fn next_record(frames: &mut FramedRead<TcpStream, RecordCodec>) -> QueuedRecord {
    timeout(WAIT, frames.next()).await.unwrap().unwrap().unwrap()
}

#[tokio::test]
async fn test_records_arrive_in_order() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let sink = TcpSink::spawn(config(port), None).unwrap();

    let shipped: Vec<QueuedRecord> = (0..5).map(|i| record(&format!("record {i}"))).collect();
    for r in &shipped {
        sink.ship(r.clone()).unwrap();
    }

    let mut frames = accept(&listener).await;
    for expected in &shipped {
        assert_eq!(&next_record(&mut frames).await, expected);
    }

    wait_until(|| sink.sent() == 5).await;
    wait_until(|| sink.state() == SinkState::Suspended).await;
    assert_eq!(sink.queued(), 0);

    sink.stop();
    timeout(WAIT, sink.stopped()).await.unwrap();
    assert_eq!(sink.state(), SinkState::Stopped);
    assert!(matches!(sink.ship(record("late")), Err(Error::Stopped)));
}

#[tokio::test]
async fn test_unreachable_collector_keeps_newest_records() {
    let port = closed_port().await;
    let sink = TcpSink::spawn(
        TcpSinkConfig::builder("127.0.0.1", port)
            .queue_capacity(3)
            .timeout_secs(0.1)
            .retry_delay(Duration::from_millis(20))
            .build(),
        None,
    )
    .unwrap();

    let start = Instant::now();
    for i in 0..5 {
        sink.ship(record(&format!("record {i}"))).unwrap();
    }
    assert!(start.elapsed() < Duration::from_millis(100));

    let kept: Vec<String> = sink
        .queued_records()
        .into_iter()
        .map(|r| r.message)
        .collect();
    assert_eq!(kept, vec!["record 2", "record 3", "record 4"]);
    assert_eq!(sink.dropped(), 2);

    wait_until(|| sink.state() == SinkState::Connecting).await;
    sleep(Duration::from_millis(150)).await;
    assert_eq!(sink.state(), SinkState::Connecting);
    assert_eq!(sink.queued(), 3);
    assert_eq!(sink.sent(), 0);

    sink.stop();
    timeout(WAIT, sink.stopped()).await.unwrap();
    assert_eq!(sink.state(), SinkState::Stopped);
}

#[tokio::test]
async fn test_logger_ships_persistent_entries() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let logger = Logger::with_console(
        LoggerConfig::builder().environment_tag("prod").build(),
        SharedBuffer::new(),
    );
    let sink = logger.attach_network_sink("127.0.0.1", port, 16, 1.0).unwrap();

    logger.debug("net", "trace", "transient", &[]);
    logger.note("net", "up", "collector attached", &[]);
    logger.warn_if(true, "net", "slow", "line one\nline two", &[]);

    let mut frames = accept(&listener).await;
    let first = next_record(&mut frames).await;
    assert_eq!(first.env, "prod");
    assert_eq!(first.severity, Severity::Note);
    assert_eq!(first.module, "net");
    assert_eq!(first.event, "up");
    assert_eq!(first.message, "collector attached");

    let second = next_record(&mut frames).await;
    assert_eq!(second.severity, Severity::Warn);
    assert_eq!(second.message, "line one\nline two");

    wait_until(|| sink.sent() == 2).await;
    assert!(logger.detach_network_sink());
    timeout(WAIT, sink.stopped()).await.unwrap();
}

#[tokio::test]
async fn test_overflow_through_attach_api() {
    let port = closed_port().await;
    let logger = Logger::with_console(LoggerConfig::default(), SharedBuffer::new());
    let sink = logger.attach_network_sink("127.0.0.1", port, 3, 0.1).unwrap();

    for i in 0..5 {
        logger.note("app", "tick", "record {}", &[Value::from(i)]);
    }

    let kept: Vec<String> = sink
        .queued_records()
        .into_iter()
        .map(|r| r.message)
        .collect();
    assert_eq!(kept, vec!["record 2", "record 3", "record 4"]);
    assert!(logger.detach_network_sink());
}

#[tokio::test]
async fn test_outage_is_reported_once_and_recovery_noted() {
    let port = closed_port().await;
    let console = SharedBuffer::new();
    let logger = Logger::with_console(
        LoggerConfig::builder().verbose(true).build(),
        console.clone(),
    );
    let sink = logger.attach_network_sink_with(config(port)).unwrap();

    logger.log_error("app", "crash", "boom", &[]);

    wait_until(|| console.contains("network sink:")).await;
    // several retries later there is still a single report
    sleep(Duration::from_millis(200)).await;
    assert_eq!(console.contents().matches("network sink:").count(), 1);
    assert!(console.contains(&format!("127.0.0.1:{port}")));

    let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
    let mut frames = accept(&listener).await;
    let delivered = next_record(&mut frames).await;
    assert_eq!(delivered.severity, Severity::Error);
    assert_eq!(delivered.message, "boom");

    wait_until(|| console.contains("reconnected to")).await;
    assert_eq!(sink.dropped(), 0);
    logger.detach_network_sink();
}

#[tokio::test]
async fn test_dropped_connection_resumes_in_order() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let sink = TcpSink::spawn(config(port), None).unwrap();

    sink.ship(record("record 0")).unwrap();
    let mut frames = accept(&listener).await;
    assert_eq!(next_record(&mut frames).await.message, "record 0");
    wait_until(|| sink.sent() == 1).await;
    drop(frames);

    // keep shipping until a failed send makes the sink dial again
    let mut shipped = 1;
    let mut frames = loop {
        sink.ship(record(&format!("record {shipped}"))).unwrap();
        shipped += 1;
        if let Ok(accepted) = timeout(Duration::from_millis(50), listener.accept()).await {
            let (stream, _) = accepted.unwrap();
            break FramedRead::new(stream, RecordCodec::new());
        }
        assert!(shipped < 100, "sink never reconnected");
    };

    let last = format!("record {}", shipped - 1);
    let mut received = Vec::new();
    loop {
        let delivered = next_record(&mut frames).await;
        let index: usize = delivered.message["record ".len()..].parse().unwrap();
        received.push(index);
        if delivered.message == last {
            break;
        }
    }

    // a record written into the dead socket may be lost, the rest resume in order
    assert!(received[0] >= 1, "{received:?}");
    assert!(received.windows(2).all(|w| w[1] == w[0] + 1), "{received:?}");
    wait_until(|| sink.queued() == 0).await;
    assert_eq!(sink.dropped(), 0);

    sink.stop();
    timeout(WAIT, sink.stopped()).await.unwrap();
}

#[tokio::test]
async fn test_oversized_record_is_reported_and_dropped() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let console = SharedBuffer::new();
    let logger = Logger::with_console(
        LoggerConfig::builder().verbose(true).build(),
        console.clone(),
    );
    let sink = logger
        .attach_network_sink_with(
            TcpSinkConfig::builder("127.0.0.1", port)
                .timeout_secs(1.0)
                .max_frame_size(512)
                .build(),
        )
        .unwrap();

    sink.ship(record(&"x".repeat(2000))).unwrap();
    sink.ship(record("fits")).unwrap();

    let mut frames = accept(&listener).await;
    assert_eq!(next_record(&mut frames).await.message, "fits");

    wait_until(|| sink.sent() == 1).await;
    assert_eq!(sink.queued(), 0);
    assert!(console.contains("dropped unsendable record"));
    assert!(console.contains("512 byte limit"));
    // the connection survived, so nothing else was reported
    assert_eq!(console.contents().matches("network sink:").count(), 1);
    assert!(!console.contains("reconnected to"));

    assert!(logger.detach_network_sink());
}

#[tokio::test]
async fn test_detach_stops_background_task() {
    let port = closed_port().await;
    let logger = Logger::with_console(LoggerConfig::default(), SharedBuffer::new());
    let sink = logger.attach_network_sink("127.0.0.1", port, 8, 0.1).unwrap();

    logger.note("app", "tick", "queued", &[]);
    assert!(logger.detach_network_sink());
    assert!(!logger.detach_network_sink());

    timeout(WAIT, sink.stopped()).await.unwrap();
    assert_eq!(sink.state(), SinkState::Stopped);

    logger.note("app", "tick", "after detach", &[]);
    assert_eq!(sink.queued(), 1);
}

#[test]
fn test_spawn_requires_runtime() {
    assert!(matches!(
        TcpSink::spawn(config(9), None),
        Err(Error::NoRuntime)
    ));

    let logger = Logger::with_console(LoggerConfig::default(), SharedBuffer::new());
    assert!(logger.attach_network_sink("127.0.0.1", 9, 8, 1.0).is_err());
    assert!(logger.sink(SinkSlot::Network).is_none());
}
