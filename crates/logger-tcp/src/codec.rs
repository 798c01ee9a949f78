//! Length-prefixed framing for queued records.
//!
//! Each frame is a 4-byte big-endian payload length followed by the record
//! as pretty-printed JSON.

use bytes::{Buf, BufMut, BytesMut};
use proven_logger::QueuedRecord;
use std::io;
use tokio_util::codec::{Decoder, Encoder};

/// Length prefix size in bytes.
pub const FRAME_HEADER_SIZE: usize = 4;

/// Maximum payload size (10MB by default).
pub const MAX_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Codec for [`QueuedRecord`] frames.
#[derive(Debug, Clone)]
pub struct RecordCodec {
    max_frame_size: usize,
}

impl RecordCodec {
    /// Create a new record codec.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_frame_size: MAX_FRAME_SIZE,
        }
    }

    /// Create a codec with custom max frame size.
    #[must_use]
    pub const fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    fn too_large(&self, size: usize) -> io::Error {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "frame of {size} bytes exceeds the {} byte limit",
                self.max_frame_size
            ),
        )
    }
}

impl Default for RecordCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder<&QueuedRecord> for RecordCodec {
    type Error = io::Error;

    fn encode(&mut self, record: &QueuedRecord, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload = serde_json::to_vec_pretty(record)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if payload.len() > self.max_frame_size {
            return Err(self.too_large(payload.len()));
        }
        let len = u32::try_from(payload.len()).map_err(|_| self.too_large(payload.len()))?;

        dst.reserve(FRAME_HEADER_SIZE + payload.len());
        dst.put_u32(len);
        dst.put_slice(&payload);
        Ok(())
    }
}

impl Decoder for RecordCodec {
    type Item = QueuedRecord;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if buf.len() < FRAME_HEADER_SIZE {
            return Ok(None);
        }

        let mut header = &buf[..FRAME_HEADER_SIZE];
        let payload_len = header.get_u32() as usize;
        if payload_len > self.max_frame_size {
            return Err(self.too_large(payload_len));
        }

        let frame_len = FRAME_HEADER_SIZE + payload_len;
        if buf.len() < frame_len {
            buf.reserve(frame_len - buf.len());
            return Ok(None);
        }

        buf.advance(FRAME_HEADER_SIZE);
        let payload = buf.split_to(payload_len);
        serde_json::from_slice(&payload)
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use proven_logger::Severity;

    fn record(message: &str) -> QueuedRecord {
        QueuedRecord {
            env: "dev".to_string(),
            timestamp: Utc::now(),
            severity: Severity::Warn,
            module: "net".to_string(),
            event: "retry".to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_frame_layout() {
        let record = record("peer gone");
        let mut buf = BytesMut::new();
        RecordCodec::new().encode(&record, &mut buf).unwrap();

        let len = u32::from_be_bytes(buf[..4].try_into().unwrap()) as usize;
        assert_eq!(len, buf.len() - FRAME_HEADER_SIZE);

        let payload = std::str::from_utf8(&buf[4..]).unwrap();
        assert_eq!(payload, serde_json::to_string_pretty(&record).unwrap());
        assert!(payload.contains("\n  \"message\": \"peer gone\""));
    }

    #[test]
    fn test_decode_waits_for_whole_frame() {
        let first = record("one");
        let second = record("two");
        let mut encoded = BytesMut::new();
        let mut codec = RecordCodec::new();
        codec.encode(&first, &mut encoded).unwrap();
        codec.encode(&second, &mut encoded).unwrap();

        let mut buf = BytesMut::new();
        buf.extend_from_slice(&encoded[..3]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&encoded[3..10]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&encoded[10..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(first));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(second));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_oversized_frames_are_rejected() {
        let mut codec = RecordCodec::new().with_max_frame_size(16);
        let mut buf = BytesMut::new();

        let err = codec.encode(&record("too long for the limit"), &mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(buf.is_empty());

        buf.put_u32(1024);
        assert!(codec.decode(&mut buf).is_err());
    }
}
