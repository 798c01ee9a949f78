//! The dispatcher: severity filtering, console echo and sink fan-out

use crate::composer::Composer;
use crate::console::Console;
use crate::error::SinkError;
use crate::formatter::Formatter;
use crate::identity::current_task;
use crate::record::ComposedEntry;
use crate::sink::{Sink, SinkSlot};
use crate::{Inspect, LoggerConfig, Severity, Value, Verbosity};
use parking_lot::RwLock;
use std::fmt::{self, Write as _};
use std::io::Write;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Module and event tag of entries the logger writes about itself.
pub const SELF_TAG: &str = "log";

/// Set of sink slots an entry must not be handed to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Skip {
    file: bool,
    network: bool,
}

impl Skip {
    const fn with(mut self, slot: SinkSlot) -> Self {
        match slot {
            SinkSlot::File => self.file = true,
            SinkSlot::Network => self.network = true,
        }
        self
    }

    const fn contains(self, slot: SinkSlot) -> bool {
        match slot {
            SinkSlot::File => self.file,
            SinkSlot::Network => self.network,
        }
    }
}

struct Shared {
    config: RwLock<LoggerConfig>,
    formatter: Formatter,
    file: RwLock<Option<Arc<dyn Sink>>>,
    network: RwLock<Option<Arc<dyn Sink>>>,
    console: Console,
}

impl Shared {
    const fn slot(&self, slot: SinkSlot) -> &RwLock<Option<Arc<dyn Sink>>> {
        match slot {
            SinkSlot::File => &self.file,
            SinkSlot::Network => &self.network,
        }
    }

    fn dispatch(
        &self,
        severity: Severity,
        module: &str,
        event: &str,
        template: Option<&str>,
        args: &[Value<'_>],
        skip: Skip,
    ) {
        let (env, echo, flush) = {
            let config = self.config.read();
            if config.severity_filter.contains(&severity) {
                return;
            }
            let echo = !config.quiet
                && (severity.is_persistent() || config.debug)
                && (severity != Severity::Note || config.verbose.enabled_for(module));
            (
                config.environment_tag.clone(),
                echo,
                config.flush_on_write,
            )
        };

        let entry =
            Composer::new(&self.formatter, &env).compose(severity, module, event, template, args);

        if echo {
            self.console.write_line(&entry.line);
        }

        if severity.is_persistent() {
            for slot in [SinkSlot::File, SinkSlot::Network] {
                if !skip.contains(slot) {
                    self.submit(slot, &entry, flush, skip);
                }
            }
        }
    }

    fn submit(&self, slot: SinkSlot, entry: &ComposedEntry, flush: bool, skip: Skip) {
        let Some(sink) = self.slot(slot).read().clone() else {
            return;
        };
        if let Err(e) = sink.submit(entry, flush) {
            self.report(slot, Severity::Error, &e, skip);
        }
    }

    /// Logs a problem raised by the sink in `slot` through every channel but
    /// that sink and any sink already failing further up the stack.
    fn report(&self, slot: SinkSlot, severity: Severity, message: &dyn fmt::Display, skip: Skip) {
        self.dispatch(
            severity,
            SELF_TAG,
            SELF_TAG,
            Some("{} sink: {}"),
            &[Value::from(slot.to_string()), Value::from(message.to_string())],
            skip.with(slot),
        );
    }
}

/// Process-local logger.
///
/// Cheap to clone; clones share configuration, tables and sinks. Logging
/// methods never fail and never wait on the network.
#[derive(Clone)]
pub struct Logger {
    shared: Arc<Shared>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("config", &*self.shared.config.read())
            .field("file", &self.shared.file.read().is_some())
            .field("network", &self.shared.network.read().is_some())
            .finish_non_exhaustive()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LoggerConfig::default())
    }
}

impl Logger {
    /// Create a logger echoing to standard error
    #[must_use]
    pub fn new(config: LoggerConfig) -> Self {
        Self::build(config, Console::stderr())
    }

    /// Create a logger echoing to `console` instead of standard error
    #[must_use]
    pub fn with_console(config: LoggerConfig, console: impl Write + Send + 'static) -> Self {
        Self::build(config, Console::new(console))
    }

    fn build(config: LoggerConfig, console: Console) -> Self {
        Self {
            shared: Arc::new(Shared {
                config: RwLock::new(config),
                formatter: Formatter::new(),
                file: RwLock::new(None),
                network: RwLock::new(None),
                console,
            }),
        }
    }

    /// Snapshot of the current configuration
    #[must_use]
    pub fn config(&self) -> LoggerConfig {
        self.shared.config.read().clone()
    }

    /// Suppress or restore the console echo
    pub fn set_quiet(&self, quiet: bool) {
        self.shared.config.write().quiet = quiet;
    }

    /// Change which notes are echoed
    pub fn set_verbose(&self, verbose: impl Into<Verbosity>) {
        self.shared.config.write().verbose = verbose.into();
    }

    /// Echo debug entries or not
    pub fn set_debug(&self, debug: bool) {
        self.shared.config.write().debug = debug;
    }

    /// Flush the file sink after every write or not
    pub fn set_flush_on_write(&self, flush: bool) {
        self.shared.config.write().flush_on_write = flush;
    }

    /// Drop every later entry of `severity` before it is composed
    pub fn suppress(&self, severity: Severity) {
        self.shared.config.write().severity_filter.insert(severity);
    }

    /// Undo [`Logger::suppress`]
    pub fn unsuppress(&self, severity: Severity) {
        self.shared.config.write().severity_filter.remove(&severity);
    }

    /// Whether entries of `severity` get past the filter
    #[must_use]
    pub fn is_enabled(&self, severity: Severity) -> bool {
        !self.shared.config.read().severity_filter.contains(&severity)
    }

    /// The value formatter used by this logger
    #[must_use]
    pub fn formatter(&self) -> &Formatter {
        &self.shared.formatter
    }

    /// Give `value` a display name for as long as it lives
    pub fn assign_display_name(&self, value: &Arc<dyn Inspect>, name: impl Into<String>) {
        self.shared.formatter.assign_display_name(value, name);
    }

    /// Give the calling thread a display name, e.g. `main`
    pub fn name_current_task(&self, name: impl Into<String>) {
        self.shared
            .formatter
            .assign_display_name(&current_task(), name);
    }

    /// Log an entry
    pub fn log(
        &self,
        severity: Severity,
        module: &str,
        event: &str,
        template: Option<&str>,
        args: &[Value<'_>],
    ) {
        self.shared
            .dispatch(severity, module, event, template, args, Skip::default());
    }

    /// Log a note
    pub fn note(&self, module: &str, event: &str, template: &str, args: &[Value<'_>]) {
        self.log(Severity::Note, module, event, Some(template), args);
    }

    /// Log a transient debug entry, echoed only in debug mode and never
    /// persisted
    pub fn debug(&self, module: &str, event: &str, template: &str, args: &[Value<'_>]) {
        self.log(Severity::Debug, module, event, Some(template), args);
    }

    /// Log a warning when `condition` holds
    pub fn warn_if(
        &self,
        condition: bool,
        module: &str,
        event: &str,
        template: &str,
        args: &[Value<'_>],
    ) {
        if condition {
            self.log(Severity::Warn, module, event, Some(template), args);
        }
    }

    /// Log an error
    pub fn log_error(&self, module: &str, event: &str, template: &str, args: &[Value<'_>]) {
        self.log(Severity::Error, module, event, Some(template), args);
    }

    /// Log `error` together with its chain of sources
    pub fn report_error(&self, module: &str, event: &str, error: &(dyn std::error::Error + 'static)) {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            let _ = write!(message, "\ncaused by: {cause}");
            source = cause.source();
        }
        self.log(Severity::Error, module, event, Some("{}"), &[Value::from(message)]);
    }

    /// Attach `sink` to `slot`, returning the sink it replaces. The replaced
    /// sink is shut down.
    pub fn attach_sink(&self, slot: SinkSlot, sink: Arc<dyn Sink>) -> Option<Arc<dyn Sink>> {
        let previous = self.shared.slot(slot).write().replace(sink);
        debug!(%slot, replaced = previous.is_some(), "sink attached");
        if let Some(previous) = &previous {
            previous.shutdown();
        }
        previous
    }

    /// Detach and shut down the sink in `slot`
    pub fn detach_sink(&self, slot: SinkSlot) -> Option<Arc<dyn Sink>> {
        let previous = self.shared.slot(slot).write().take();
        if let Some(previous) = &previous {
            debug!(%slot, "sink detached");
            previous.shutdown();
        }
        previous
    }

    /// The sink currently attached to `slot`
    #[must_use]
    pub fn sink(&self, slot: SinkSlot) -> Option<Arc<dyn Sink>> {
        self.shared.slot(slot).read().clone()
    }

    /// A handle through which the sink in `slot` reports its own failures
    #[must_use]
    pub fn reporter(&self, slot: SinkSlot) -> SinkReporter {
        SinkReporter {
            shared: Arc::downgrade(&self.shared),
            slot,
        }
    }

    /// Push buffered entries of every sink to durable storage. Failures are
    /// reported like write failures.
    pub fn flush(&self) {
        for slot in [SinkSlot::File, SinkSlot::Network] {
            let Some(sink) = self.sink(slot) else {
                continue;
            };
            if let Err(e) = sink.flush() {
                self.shared
                    .report(slot, Severity::Error, &e, Skip::default());
            }
        }
    }
}

/// Lets a sink report problems found outside a `submit` call, typically from
/// a background task.
///
/// Reports go through every channel except the reporting sink. The reporter
/// does not keep the logger alive.
#[derive(Clone)]
pub struct SinkReporter {
    shared: Weak<Shared>,
    slot: SinkSlot,
}

impl fmt::Debug for SinkReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkReporter")
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}

impl SinkReporter {
    /// Report a failure at error severity
    pub fn error(&self, error: &SinkError) {
        self.report(Severity::Error, error);
    }

    /// Report at the given severity
    pub fn report(&self, severity: Severity, message: &dyn fmt::Display) {
        if let Some(shared) = self.shared.upgrade() {
            shared.report(self.slot, severity, message, Skip::default());
        }
    }
}
