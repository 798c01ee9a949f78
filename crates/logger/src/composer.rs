//! Builds the rendered line and the structured record for one log call.

use crate::formatter::{Formatter, indent, outdent};
use crate::identity::current_task;
use crate::record::{
    ComposedEntry, EVENT_WIDTH, LogEntry, MODULE_WIDTH, SEVERITY_WIDTH, TASK_WIDTH,
};
use crate::{Severity, Value};
use chrono::Utc;
use std::borrow::Cow;

/// Indent applied to the body of a multi-line message.
pub const MESSAGE_INDENT: &str = "    ";

/// Composes entries against a formatter and environment tag.
pub struct Composer<'a> {
    formatter: &'a Formatter,
    env: &'a str,
}

impl<'a> Composer<'a> {
    /// Creates a composer.
    #[must_use]
    pub const fn new(formatter: &'a Formatter, env: &'a str) -> Self {
        Self { formatter, env }
    }

    /// Expands `template` against `args` and builds the line and record.
    #[must_use]
    pub fn compose(
        &self,
        severity: Severity,
        module: &str,
        event: &str,
        template: Option<&str>,
        args: &[Value<'_>],
    ) -> ComposedEntry {
        let message = template.map_or_else(String::new, |template| {
            expand(template, &self.formatter.format_all(args))
        });
        let task = self.formatter.format_handle(&current_task());

        let entry = LogEntry {
            severity,
            module,
            event,
            timestamp: Utc::now(),
            message: &message,
            task: &task,
        };

        ComposedEntry {
            severity,
            line: self.render(&entry),
            record: entry.to_record(self.env),
        }
    }

    /// Renders the fixed-width line for `entry`. A multi-line message starts
    /// below the header, which then carries no column padding.
    #[must_use]
    pub fn render(&self, entry: &LogEntry<'_>) -> String {
        let header = format!(
            "{env} {time} {severity:>sw$.sw$} {module:<mw$.mw$} {event:<ew$.ew$} {task:<tw$.tw$}",
            env = env_letter(self.env),
            time = entry.local_time(),
            severity = entry.severity,
            module = entry.module,
            event = entry.event,
            task = entry.task,
            sw = SEVERITY_WIDTH,
            mw = MODULE_WIDTH,
            ew = EVENT_WIDTH,
            tw = TASK_WIDTH,
        );
        let message = layout_message(entry.message);
        if message.starts_with('\n') {
            format!("{}{message}\n", header.trim_end())
        } else {
            format!("{header} {message}\n")
        }
    }
}

fn env_letter(env: &str) -> char {
    env.chars()
        .next()
        .map_or('-', |c| c.to_ascii_uppercase())
}

/// Lays out a message for the line. A multi-line message is outdented, then
/// indented by one level, and led by the header's line break plus exactly one
/// blank line. Trailing newlines are dropped; the line supplies the final one.
#[must_use]
pub fn layout_message(message: &str) -> Cow<'_, str> {
    if !message.contains('\n') {
        return Cow::Borrowed(message);
    }
    let body = indent(&outdent(message.trim_matches('\n')), MESSAGE_INDENT);
    Cow::Owned(format!("\n\n{body}"))
}

/// Substitutes `args` into the `{}` placeholders of `template`.
///
/// `{{` and `}}` are literal braces. A placeholder with no argument left stays
/// as `{}`; arguments with no placeholder left are appended, space separated.
#[must_use]
pub fn expand(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len() + args.iter().map(String::len).sum::<usize>());
    let mut args = args.iter();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('{', Some('{')) | ('}', Some('}')) => {
                chars.next();
                out.push(c);
            }
            ('{', Some('}')) => {
                chars.next();
                match args.next() {
                    Some(arg) => out.push_str(arg),
                    None => out.push_str("{}"),
                }
            }
            _ => out.push(c),
        }
    }

    for arg in args {
        out.push(' ');
        out.push_str(arg);
    }
    out
}
