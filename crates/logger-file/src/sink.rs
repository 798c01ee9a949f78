use crate::config::FileSinkConfig;
use crate::error::{Error, Result};

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use proven_logger::{ComposedEntry, Logger, Sink, SinkError, SinkSlot};
use tracing::debug;

#[derive(Debug, Default)]
struct FileState {
    file: Option<File>,
    size: u64,
}

/// Appends composed lines to a capped local file.
///
/// The file is opened lazily in append mode. Once the live size plus the
/// incoming line would cross half the cap, the live file is renamed over the
/// single backup slot and a fresh one is started, so the two generations
/// together stay near the cap. Any I/O failure drops the handle and the next
/// write reopens it.
#[derive(Debug)]
pub struct FileSink {
    config: FileSinkConfig,
    backup: PathBuf,
    state: Mutex<FileState>,
    rotations: AtomicU64,
}

impl FileSink {
    /// Create a sink. Nothing touches the filesystem until the first write.
    #[must_use]
    pub fn new(config: FileSinkConfig) -> Self {
        let backup = config.backup_path();
        Self {
            config,
            backup,
            state: Mutex::new(FileState::default()),
            rotations: AtomicU64::new(0),
        }
    }

    /// Live file path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Backup slot path
    #[must_use]
    pub fn backup_path(&self) -> &Path {
        &self.backup
    }

    /// Tracked size of the live file
    #[must_use]
    pub fn size(&self) -> u64 {
        self.state.lock().size
    }

    /// Rotations performed since creation
    #[must_use]
    pub fn rotations(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }

    /// Append one line, rotating first if it would cross the threshold.
    ///
    /// # Errors
    ///
    /// Returns an error if the file could not be opened, rotated, written or
    /// synced. The cached handle is dropped in every case.
    pub fn write(&self, line: &str, flush: bool) -> Result<()> {
        let mut state = self.state.lock();
        let result = self.write_locked(&mut state, line.as_bytes(), flush);
        if result.is_err() {
            state.file = None;
        }
        result
    }

    fn write_locked(&self, state: &mut FileState, bytes: &[u8], flush: bool) -> Result<()> {
        if state.file.is_none() {
            self.open(state)?;
        }

        let len = bytes.len() as u64;
        if let Some(threshold) = self.config.rotation_threshold() {
            if state.size + len > threshold {
                self.rotate(state)?;
            }
        }

        let Some(file) = state.file.as_mut() else {
            return Err(Error::Io(
                "error opening log file",
                std::io::Error::other("no open handle"),
            ));
        };
        file.write_all(bytes)
            .map_err(|e| Error::Io("error writing log file", e))?;
        state.size += len;

        if flush || self.config.flush_on_write {
            file.sync_data()
                .map_err(|e| Error::Io("error flushing log file", e))?;
        }

        Ok(())
    }

    fn open(&self, state: &mut FileState) -> Result<()> {
        let path = &self.config.path;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| Error::CreateDirectory {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::Io("error opening log file", e))?;
        state.size = file
            .metadata()
            .map_err(|e| Error::Io("error reading log file size", e))?
            .len();
        state.file = Some(file);
        Ok(())
    }

    fn rotate(&self, state: &mut FileState) -> Result<()> {
        state.file = None;
        fs::rename(&self.config.path, &self.backup).map_err(|source| Error::Rotation {
            from: self.config.path.clone(),
            to: self.backup.clone(),
            source,
        })?;
        self.rotations.fetch_add(1, Ordering::Relaxed);
        debug!(
            path = %self.config.path.display(),
            backup = %self.backup.display(),
            size = state.size,
            "rotated log file"
        );
        self.open(state)
    }
}

impl Sink for FileSink {
    fn submit(&self, entry: &ComposedEntry, flush: bool) -> std::result::Result<(), SinkError> {
        self.write(&entry.line, flush).map_err(SinkError::from)
    }

    fn flush(&self) -> std::result::Result<(), SinkError> {
        let mut state = self.state.lock();
        let Some(file) = state.file.as_mut() else {
            return Ok(());
        };
        if let Err(e) = file.sync_data() {
            state.file = None;
            return Err(SinkError::Io("error flushing log file", e));
        }
        Ok(())
    }

    fn shutdown(&self) {
        self.state.lock().file = None;
    }
}

/// Attaches a [`FileSink`] to a [`Logger`].
pub trait AttachFileSink {
    /// Route persistent entries to `path`, rotating at half of `max_size`
    /// bytes. A zero `max_size` never rotates. Replaces any file sink already
    /// attached.
    fn attach_file_sink(&self, path: impl Into<PathBuf>, max_size: u64) -> Arc<FileSink>;

    /// Attach a sink built from an explicit configuration.
    fn attach_file_sink_with(&self, config: FileSinkConfig) -> Arc<FileSink>;

    /// Detach the file sink, closing its handle. Returns whether one was
    /// attached.
    fn detach_file_sink(&self) -> bool;
}

impl AttachFileSink for Logger {
    fn attach_file_sink(&self, path: impl Into<PathBuf>, max_size: u64) -> Arc<FileSink> {
        self.attach_file_sink_with(FileSinkConfig::builder(path).max_size(max_size).build())
    }

    fn attach_file_sink_with(&self, config: FileSinkConfig) -> Arc<FileSink> {
        let sink = Arc::new(FileSink::new(config));
        self.attach_sink(SinkSlot::File, sink.clone());
        sink
    }

    fn detach_file_sink(&self) -> bool {
        self.detach_sink(SinkSlot::File).is_some()
    }
}
