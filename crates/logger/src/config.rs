//! Dispatcher configuration

use crate::Severity;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::env;

/// Which note entries are echoed to the console.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Notes are not echoed.
    #[default]
    Off,
    /// Notes from every module are echoed.
    All,
    /// Notes from the listed modules are echoed.
    Modules(HashSet<String>),
}

impl Verbosity {
    /// Whether notes from `module` are echoed.
    #[must_use]
    pub fn enabled_for(&self, module: &str) -> bool {
        match self {
            Self::Off => false,
            Self::All => true,
            Self::Modules(modules) => modules.contains(module),
        }
    }
}

impl From<bool> for Verbosity {
    fn from(value: bool) -> Self {
        if value { Self::All } else { Self::Off }
    }
}

impl From<&str> for Verbosity {
    fn from(module: &str) -> Self {
        Self::Modules(HashSet::from([module.to_string()]))
    }
}

/// Configuration recognised by the dispatcher.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Suppress the console echo entirely
    pub quiet: bool,
    /// Echo notes to the console
    #[serde(deserialize_with = "deserialize_verbosity")]
    pub verbose: Verbosity,
    /// Echo debug entries to the console
    pub debug: bool,
    /// Flush the file sink to durable storage after every write
    pub flush_on_write: bool,
    /// Severities dropped before composing
    pub severity_filter: HashSet<Severity>,
    /// Environment tag, its first letter leads every line
    pub environment_tag: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            quiet: false,
            verbose: Verbosity::Off,
            debug: false,
            flush_on_write: true,
            severity_filter: HashSet::new(),
            environment_tag: "dev".to_string(),
        }
    }
}

impl LoggerConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> LoggerConfigBuilder {
        LoggerConfigBuilder::default()
    }

    /// Reads the configuration from `LOG_*` environment variables, falling
    /// back to defaults for unset ones.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to a value that cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup("LOG_QUIET") {
            config.quiet = parse_flag("LOG_QUIET", &value)?;
        }
        if let Some(value) = lookup("LOG_VERBOSE") {
            config.verbose = match parse_flag("LOG_VERBOSE", &value) {
                Ok(flag) => Verbosity::from(flag),
                Err(_) => Verbosity::Modules(split_list(&value).map(str::to_string).collect()),
            };
        }
        if let Some(value) = lookup("LOG_DEBUG") {
            config.debug = parse_flag("LOG_DEBUG", &value)?;
        }
        if let Some(value) = lookup("LOG_FLUSH") {
            config.flush_on_write = parse_flag("LOG_FLUSH", &value)?;
        }
        if let Some(value) = lookup("LOG_SUPPRESS") {
            config.severity_filter = split_list(&value)
                .map(|name| {
                    name.parse().map_err(|_| Error::InvalidEnv {
                        var: "LOG_SUPPRESS",
                        value: value.clone(),
                    })
                })
                .collect::<Result<_>>()?;
        }
        if let Some(value) = lookup("LOG_ENV") {
            config.environment_tag = value;
        }

        Ok(config)
    }
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(Error::InvalidEnv {
            var,
            value: value.to_string(),
        }),
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|item| !item.is_empty())
}

fn deserialize_verbosity<'de, D>(deserializer: D) -> std::result::Result<Verbosity, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Flag(bool),
        Module(String),
        Modules(HashSet<String>),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Flag(flag) => Verbosity::from(flag),
        Raw::Module(module) => Verbosity::from(module.as_str()),
        Raw::Modules(modules) => Verbosity::Modules(modules),
    })
}

/// Builder for [`LoggerConfig`]
#[derive(Debug, Default)]
pub struct LoggerConfigBuilder {
    config: LoggerConfig,
}

impl LoggerConfigBuilder {
    /// Suppress the console echo
    #[must_use]
    pub const fn quiet(mut self, quiet: bool) -> Self {
        self.config.quiet = quiet;
        self
    }

    /// Set note verbosity
    #[must_use]
    pub fn verbose(mut self, verbose: impl Into<Verbosity>) -> Self {
        self.config.verbose = verbose.into();
        self
    }

    /// Echo debug entries
    #[must_use]
    pub const fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Flush the file sink after every write
    #[must_use]
    pub const fn flush_on_write(mut self, flush: bool) -> Self {
        self.config.flush_on_write = flush;
        self
    }

    /// Drop entries of `severity`
    #[must_use]
    pub fn suppress(mut self, severity: Severity) -> Self {
        self.config.severity_filter.insert(severity);
        self
    }

    /// Set the environment tag
    #[must_use]
    pub fn environment_tag(mut self, tag: impl Into<String>) -> Self {
        self.config.environment_tag = tag.into();
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> LoggerConfig {
        self.config
    }
}
