//! Turns log arguments into short, deterministic display tokens.

use crate::identity::{IdentityRegistry, NameOverrides};
use crate::value::{DisplayType, Inspect, Value};
use std::borrow::Cow;
use std::sync::Arc;

/// Display type used for handles that declare neither a type nor a structure.
const OPAQUE: DisplayType = DisplayType::Named("o");

/// Value formatter with its identity and naming tables.
#[derive(Default)]
pub struct Formatter {
    registry: IdentityRegistry,
    names: NameOverrides,
}

impl Formatter {
    /// Creates a formatter with empty tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The identity registry backing handle tokens.
    #[must_use]
    pub const fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    /// Gives `value` a display name for as long as it lives.
    pub fn assign_display_name(&self, value: &Arc<dyn Inspect>, name: impl Into<String>) {
        self.names.assign(value, name);
    }

    /// Removes a display name given earlier.
    pub fn clear_display_name(&self, value: &Arc<dyn Inspect>) -> Option<String> {
        self.names.clear(value)
    }

    /// Formats one value.
    #[must_use]
    pub fn format(&self, value: &Value<'_>) -> String {
        match value {
            Value::Bool(true) => "Y".to_string(),
            Value::Bool(false) => "N".to_string(),
            Value::Nil => "nil".to_string(),
            Value::Int(i) => i.to_string(),
            Value::UInt(u) => u.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Str(s) => sanitize_text(s),
            Value::Data(data) => pretty(data),
            Value::Handle(handle) => self.format_handle(handle),
        }
    }

    /// Formats every value, keeping position and arity, trailing `Nil`s
    /// included.
    #[must_use]
    pub fn format_all(&self, values: &[Value<'_>]) -> Vec<String> {
        values.iter().map(|value| self.format(value)).collect()
    }

    /// Display token of `handle`: its assigned name, its own display text,
    /// its structure, or a type prefix followed by its registry id.
    #[must_use]
    pub fn format_handle(&self, handle: &Arc<dyn Inspect>) -> String {
        if let Some(name) = self.names.get(handle) {
            return name;
        }
        if let Some(text) = handle.display() {
            return sanitize_text(&text);
        }
        let display_type = match handle.display_type() {
            Some(display_type) => display_type,
            None => match handle.structure() {
                Some(data) => return pretty(&data),
                None => OPAQUE,
            },
        };
        let id = self.registry.id(display_type, handle);
        format!("{}{id}", display_type.prefix())
    }
}

/// Pretty-printed structural dump shared with the wire format.
#[must_use]
pub fn pretty(data: &serde_json::Value) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string())
}

/// Makes text safe to embed in a log line.
///
/// CRLF pairs become LF. Text with a newline is outdented and led by a blank
/// line. Control bytes other than tab, LF and CR, and every byte of a non-ASCII
/// sequence, become `.`.
#[must_use]
pub fn sanitize_text(text: &str) -> String {
    let text: Cow<'_, str> = if text.contains("\r\n") {
        Cow::Owned(text.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(text)
    };

    let text = if text.contains('\n') {
        let block = outdent(&text);
        if block.starts_with('\n') {
            block
        } else {
            format!("\n{block}")
        }
    } else {
        text.into_owned()
    };

    if text.bytes().all(is_printable) {
        return text;
    }
    text.bytes()
        .map(|b| if is_printable(b) { char::from(b) } else { '.' })
        .collect()
}

const fn is_printable(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\r' | 0x20..=0x7F)
}

/// Removes the leading whitespace shared by every non-blank line.
#[must_use]
pub fn outdent(text: &str) -> String {
    let common = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    if common == 0 {
        return text.to_string();
    }

    text.split('\n')
        .map(|line| line.get(common..).unwrap_or_else(|| line.trim_start_matches([' ', '\t'])))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prefixes every non-blank line with `prefix`.
#[must_use]
pub fn indent(text: &str, prefix: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
