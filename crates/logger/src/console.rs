//! Console echo used for the process's standard error stream

use parking_lot::Mutex;
use std::io::{self, Write};

/// Serialised writer for the console echo.
pub(crate) struct Console {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl Console {
    pub(crate) fn stderr() -> Self {
        Self::new(io::stderr())
    }

    pub(crate) fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// Writes one rendered line. Errors are ignored, there is nowhere left to
    /// report them.
    pub(crate) fn write_line(&self, line: &str) {
        let mut writer = self.writer.lock();
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }
}
