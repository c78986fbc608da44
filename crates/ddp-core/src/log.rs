//! Severity-gated diagnostics
//!
//! A [`Logger`] pairs a minimum [`LogLevel`] with an optional [`LogSink`].
//! Messages below the minimum are discarded before any formatting happens;
//! accepted messages are formatted once and handed to the sink. A logger
//! without a sink drops everything.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::assert::{AssertAction, ASSERTS_ENABLED};
use crate::result::{DdResult, ResultCode};

/// Diagnostic severity, ordered from least to most severe
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum LogLevel {
    Debug = 0,
    Verbose = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Always = 5,
    /// Bound on valid levels; never printed
    Count = 6,
    /// Disable value for the minimum level
    Never = 0xFF,
}

impl LogLevel {
    /// Legacy name for `Warn`
    pub const ALERT: LogLevel = LogLevel::Warn;

    /// Default minimum level for this build profile
    pub const fn build_default() -> Self {
        if cfg!(debug_assertions) {
            LogLevel::Verbose
        } else {
            LogLevel::Error
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Verbose => "verbose",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Always => "always",
            LogLevel::Count => "count",
            LogLevel::Never => "never",
        }
    }

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Debug),
            1 => Some(Self::Verbose),
            2 => Some(Self::Info),
            3 => Some(Self::Warn),
            4 => Some(Self::Error),
            5 => Some(Self::Always),
            6 => Some(Self::Count),
            0xFF => Some(Self::Never),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ResultCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "verbose" => Ok(LogLevel::Verbose),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" | "alert" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "always" => Ok(LogLevel::Always),
            "never" | "off" => Ok(LogLevel::Never),
            _ => Err(ResultCode::InvalidParameter),
        }
    }
}

/// Destination for formatted diagnostics.
///
/// The sink only performs output; level filtering and formatting are done by
/// the [`Logger`] before it is called.
pub trait LogSink: Send + Sync {
    fn write(&self, level: LogLevel, message: &str);
}

impl<F> LogSink for F
where
    F: Fn(LogLevel, &str) + Send + Sync,
{
    fn write(&self, level: LogLevel, message: &str) {
        self(level, message)
    }
}

/// Sink that forwards into `tracing` events under the `ddp` target
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => tracing::trace!(target: "ddp", "{message}"),
            LogLevel::Verbose => tracing::debug!(target: "ddp", "{message}"),
            LogLevel::Info => tracing::info!(target: "ddp", "{message}"),
            LogLevel::Warn => tracing::warn!(target: "ddp", "{message}"),
            LogLevel::Error | LogLevel::Always => tracing::error!(target: "ddp", "{message}"),
            LogLevel::Count | LogLevel::Never => {}
        }
    }
}

/// Level filter plus sink, passed explicitly to diagnostic call sites
#[derive(Clone)]
pub struct Logger {
    min_level: LogLevel,
    sink: Option<Arc<dyn LogSink>>,
    asserts_enabled: bool,
    assert_action: AssertAction,
}

impl Logger {
    /// Create a logger writing to `sink`
    pub fn new(min_level: LogLevel, sink: Arc<dyn LogSink>) -> Self {
        Self {
            min_level,
            sink: Some(sink),
            asserts_enabled: ASSERTS_ENABLED,
            assert_action: AssertAction::default(),
        }
    }

    /// Create a logger with no sink; every message is dropped
    pub fn silent(min_level: LogLevel) -> Self {
        Self {
            min_level,
            sink: None,
            asserts_enabled: ASSERTS_ENABLED,
            assert_action: AssertAction::default(),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_min_level(mut self, min_level: LogLevel) -> Self {
        self.min_level = min_level;
        self
    }

    /// Override whether assert/warn checks run (the build default is [`ASSERTS_ENABLED`])
    pub fn with_asserts(mut self, enabled: bool) -> Self {
        self.asserts_enabled = enabled;
        self
    }

    pub fn with_assert_action(mut self, action: AssertAction) -> Self {
        self.assert_action = action;
        self
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    pub fn asserts_enabled(&self) -> bool {
        self.asserts_enabled
    }

    pub fn assert_action(&self) -> AssertAction {
        self.assert_action
    }

    /// Whether a message at `level` would be forwarded
    #[inline]
    pub fn should_print(&self, level: LogLevel) -> bool {
        level >= self.min_level && level < LogLevel::Count
    }

    /// Filter, format and forward a message.
    ///
    /// Nothing is formatted unless the level passes the filter and a sink is present.
    pub fn print(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        if !self.should_print(level) {
            return;
        }
        let Some(sink) = &self.sink else {
            return;
        };
        let message = match args.as_str() {
            Some(s) => Cow::Borrowed(s),
            None => Cow::Owned(args.to_string()),
        };
        sink.write(level, &message);
    }
}

impl Default for Logger {
    /// Build-profile minimum level writing to [`TracingSink`]
    fn default() -> Self {
        Logger::new(LogLevel::build_default(), Arc::new(TracingSink))
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("min_level", &self.min_level)
            .field("has_sink", &self.sink.is_some())
            .field("asserts_enabled", &self.asserts_enabled)
            .field("assert_action", &self.assert_action)
            .finish()
    }
}

static PROCESS_LOGGER: OnceLock<Logger> = OnceLock::new();

/// Install the process logger.
///
/// Must happen before the first diagnostic; returns `EntryExists` if a logger
/// was already installed or the default was already materialized.
pub fn install_logger(logger: Logger) -> DdResult {
    PROCESS_LOGGER
        .set(logger)
        .map_err(|_| ResultCode::EntryExists)
}

/// The process logger, falling back to [`Logger::default`]
pub fn logger() -> &'static Logger {
    PROCESS_LOGGER.get_or_init(Logger::default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct SpySink {
        messages: Mutex<Vec<(LogLevel, String)>>,
    }

    impl SpySink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                messages: Mutex::new(Vec::new()),
            })
        }

        fn count(&self) -> usize {
            self.messages.lock().unwrap().len()
        }
    }

    impl LogSink for SpySink {
        fn write(&self, level: LogLevel, message: &str) {
            self.messages
                .lock()
                .unwrap()
                .push((level, message.to_string()));
        }
    }

    struct Exploding;

    impl fmt::Display for Exploding {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            panic!("filtered message was formatted");
        }
    }

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Verbose);
        assert!(LogLevel::Verbose < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Always);
        assert!(LogLevel::Always < LogLevel::Count);
        assert_eq!(LogLevel::ALERT, LogLevel::Warn);
    }

    #[test]
    fn test_should_print_bounds() {
        let logger = Logger::silent(LogLevel::Info);
        assert!(!logger.should_print(LogLevel::Debug));
        assert!(!logger.should_print(LogLevel::Verbose));
        assert!(logger.should_print(LogLevel::Info));
        assert!(logger.should_print(LogLevel::Always));
        assert!(!logger.should_print(LogLevel::Count));
        assert!(!logger.should_print(LogLevel::Never));
    }

    #[test]
    fn test_never_disables_everything() {
        let logger = Logger::silent(LogLevel::Never);
        assert!(!logger.should_print(LogLevel::Always));
    }

    #[test]
    fn test_below_minimum_never_reaches_sink() {
        let spy = SpySink::new();
        let logger = Logger::new(LogLevel::Warn, spy.clone());

        for level in [LogLevel::Debug, LogLevel::Verbose, LogLevel::Info] {
            logger.print(level, format_args!("dropped {}", 1));
        }
        assert_eq!(spy.count(), 0);

        logger.print(LogLevel::Warn, format_args!("kept {}", 2));
        logger.print(LogLevel::Error, format_args!("kept"));
        assert_eq!(spy.count(), 2);

        let messages = spy.messages.lock().unwrap();
        assert_eq!(messages[0], (LogLevel::Warn, "kept 2".to_string()));
        assert_eq!(messages[1], (LogLevel::Error, "kept".to_string()));
    }

    #[test]
    fn test_filtered_message_is_not_formatted() {
        let spy = SpySink::new();
        let logger = Logger::new(LogLevel::Error, spy.clone());
        logger.print(LogLevel::Info, format_args!("{}", Exploding));
        assert_eq!(spy.count(), 0);
    }

    #[test]
    fn test_missing_sink_drops_without_formatting() {
        let logger = Logger::silent(LogLevel::Debug);
        logger.print(LogLevel::Error, format_args!("{}", Exploding));
    }

    #[test]
    fn test_closure_sink() {
        let hits = Arc::new(Mutex::new(0usize));
        let counter = hits.clone();
        let logger = Logger::new(
            LogLevel::Debug,
            Arc::new(move |_: LogLevel, _: &str| *counter.lock().unwrap() += 1),
        );
        logger.print(LogLevel::Debug, format_args!("a"));
        logger.print(LogLevel::Always, format_args!("b"));
        assert_eq!(*hits.lock().unwrap(), 2);
    }

    #[test]
    fn test_parse_levels() {
        assert_eq!("WARN".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!("alert".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!(" verbose ".parse::<LogLevel>(), Ok(LogLevel::Verbose));
        assert_eq!("off".parse::<LogLevel>(), Ok(LogLevel::Never));
        assert_eq!("loud".parse::<LogLevel>(), Err(ResultCode::InvalidParameter));
    }

    #[test]
    fn test_from_u8() {
        assert_eq!(LogLevel::from_u8(3), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_u8(0xFF), Some(LogLevel::Never));
        assert_eq!(LogLevel::from_u8(7), None);
    }
}
