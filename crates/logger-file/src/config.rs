//! Configuration for the file sink

use std::path::{Path, PathBuf};

/// Configuration for a [`FileSink`](crate::FileSink)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSinkConfig {
    /// Live log file
    pub path: PathBuf,

    /// Size cap in bytes, `None` to never rotate
    pub max_size: Option<u64>,

    /// Sync after every write, whatever the logger asks for
    pub flush_on_write: bool,
}

impl FileSinkConfig {
    /// Create a config for `path` with no size cap
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_size: None,
            flush_on_write: false,
        }
    }

    /// Create a new configuration builder
    pub fn builder(path: impl Into<PathBuf>) -> FileSinkConfigBuilder {
        FileSinkConfigBuilder {
            config: Self::new(path),
        }
    }

    /// The single backup slot: `app.log` rotates to `app0.log`.
    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        backup_path(&self.path)
    }

    /// Live size at which the next write rotates.
    #[must_use]
    pub fn rotation_threshold(&self) -> Option<u64> {
        self.max_size.map(|cap| cap / 2)
    }
}

pub(crate) fn backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}0.{}", ext.to_string_lossy()),
        None => format!("{stem}0"),
    };
    path.with_file_name(name)
}

/// Builder for [`FileSinkConfig`]
#[derive(Debug)]
pub struct FileSinkConfigBuilder {
    config: FileSinkConfig,
}

impl FileSinkConfigBuilder {
    /// Set the size cap. Zero disables rotation.
    #[must_use]
    pub const fn max_size(mut self, bytes: u64) -> Self {
        self.config.max_size = if bytes == 0 { None } else { Some(bytes) };
        self
    }

    /// Sync after every write
    #[must_use]
    pub const fn flush_on_write(mut self, flush: bool) -> Self {
        self.config.flush_on_write = flush;
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> FileSinkConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_path() {
        assert_eq!(backup_path(Path::new("app.log")), PathBuf::from("app0.log"));
        assert_eq!(
            backup_path(Path::new("/var/log/node.txt")),
            PathBuf::from("/var/log/node0.txt")
        );
        assert_eq!(backup_path(Path::new("logs/app")), PathBuf::from("logs/app0"));
    }

    #[test]
    fn test_zero_cap_disables_rotation() {
        let config = FileSinkConfig::builder("app.log").max_size(0).build();
        assert_eq!(config.rotation_threshold(), None);

        let config = FileSinkConfig::builder("app.log").max_size(1000).build();
        assert_eq!(config.rotation_threshold(), Some(500));
    }
}
