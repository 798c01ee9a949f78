//! Test support utilities
//!
//! In-memory console capture for asserting on the echo a logger writes.

use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

/// A cloneable in-memory writer. Every clone appends to the same buffer.
#[derive(Clone, Debug, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Create an empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    /// Captured lines, without their terminators
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    /// Check if the buffer contains a specific string
    #[must_use]
    pub fn contains(&self, text: &str) -> bool {
        self.contents().contains(text)
    }

    /// Clear captured output
    pub fn clear(&self) {
        self.bytes.lock().clear();
    }
}

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
