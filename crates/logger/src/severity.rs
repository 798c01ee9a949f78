//! Log severities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Classification of a log entry.
///
/// `Debug` is the transient severity: it renders with an empty label, is only
/// ever echoed to the console, and is never handed to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Transient, debug-only entry.
    Debug,
    /// Informational note.
    Note,
    /// Warning.
    Warn,
    /// Error.
    Error,
}

impl Severity {
    /// Label used in rendered lines and structured records.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Debug => "",
            Self::Note => "note",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Whether entries of this severity are forwarded to sinks.
    #[must_use]
    pub const fn is_persistent(self) -> bool {
        !matches!(self, Self::Debug)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "debug" => Ok(Self::Debug),
            "note" => Ok(Self::Note),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(Error::UnknownSeverity(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_debug_is_transient() {
        assert!(!Severity::Debug.is_persistent());
        assert!(Severity::Note.is_persistent());
        assert!(Severity::Warn.is_persistent());
        assert!(Severity::Error.is_persistent());
    }

    #[test]
    fn test_display_honours_width() {
        assert_eq!(format!("{:>6}|", Severity::Warn), "  warn|");
        assert_eq!(format!("{:>6}|", Severity::Debug), "      |");
    }

    #[test]
    fn test_parse() {
        assert_eq!("WARN".parse::<Severity>().unwrap(), Severity::Warn);
        assert_eq!("".parse::<Severity>().unwrap(), Severity::Debug);
        assert!("fatal".parse::<Severity>().is_err());
    }
}
