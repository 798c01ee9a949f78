//! Logging macros
//!
//! Each macro checks the severity filter before converting its arguments, so
//! a suppressed severity costs one lock and a set lookup.

/// Log an entry at an explicit severity.
///
/// ```ignore
/// log!(logger, Severity::Warn, "net", "retry", "attempt {} of {}", n, max);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $severity:expr, $module:expr, $event:expr, $template:expr $(, $arg:expr)* $(,)?) => {{
        let logger = &$logger;
        let severity: $crate::Severity = $severity;
        if logger.is_enabled(severity) {
            logger.log(
                severity,
                $module,
                $event,
                ::core::option::Option::Some($template),
                &[$($crate::Value::from($arg)),*],
            );
        }
    }};
}

/// Log a note.
#[macro_export]
macro_rules! note {
    ($logger:expr, $module:expr, $event:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $crate::log!($logger, $crate::Severity::Note, $module, $event, $template $(, $arg)*)
    };
}

/// Log a transient debug entry.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $module:expr, $event:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $crate::log!($logger, $crate::Severity::Debug, $module, $event, $template $(, $arg)*)
    };
}

/// Log a warning if the condition holds.
#[macro_export]
macro_rules! warn_if {
    ($logger:expr, $condition:expr, $module:expr, $event:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        if $condition {
            $crate::log!($logger, $crate::Severity::Warn, $module, $event, $template $(, $arg)*)
        }
    };
}

/// Log an error.
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $module:expr, $event:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $crate::log!($logger, $crate::Severity::Error, $module, $event, $template $(, $arg)*)
    };
}
