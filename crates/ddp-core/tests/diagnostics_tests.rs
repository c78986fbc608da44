//! Diagnostic macro integration tests

use std::io;
use std::sync::{Arc, Mutex};

use ddp_core::{
    dd_alert, dd_alert_reason, dd_assert, dd_dbg, dd_log, dd_not_implemented, dd_print, dd_unhandled_result, dd_warn,
    install_logger, logger, result_to_str, AssertAction, LogLevel, LogSink, Logger, ResultCode,
    TracingSink, ASSERTS_ENABLED, UNRECOGNIZED_RESULT,
};

#[derive(Default)]
struct SpySink {
    messages: Mutex<Vec<(LogLevel, String)>>,
}

impl SpySink {
    fn count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    fn last(&self) -> Option<(LogLevel, String)> {
        self.messages.lock().unwrap().last().cloned()
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

fn spy_logger(min_level: LogLevel) -> (Logger, Arc<SpySink>) {
    let spy = Arc::new(SpySink::default());
    let logger = Logger::new(min_level, spy.clone())
        .with_asserts(true)
        .with_assert_action(AssertAction::LogOnly);
    (logger, spy)
}

#[test]
fn test_dd_log_filters_by_level() {
    let (logger, spy) = spy_logger(LogLevel::Info);
    let mut evaluated = 0;
    let mut side_effect = || {
        evaluated += 1;
        evaluated
    };

    dd_log!(&logger, LogLevel::Debug, "value {}", side_effect());
    assert_eq!(spy.count(), 0);

    dd_log!(&logger, LogLevel::Info, "value {}", side_effect());
    assert_eq!(spy.last(), Some((LogLevel::Info, "value 1".to_string())));
    // Filtered arguments are never evaluated.
    assert_eq!(evaluated, 1);
}

#[test]
fn test_dd_assert_reports_expression() {
    let (logger, spy) = spy_logger(LogLevel::Debug);
    let depth = 3;
    dd_assert!(@logger &logger, depth < 2);
    if !ASSERTS_ENABLED {
        assert_eq!(spy.count(), 0);
        return;
    }

    let (level, message) = spy.last().unwrap();
    assert_eq!(level, LogLevel::Error);
    assert!(message.contains("Assertion failed in"));
    assert!(message.contains("depth < 2"));
    assert!(message.contains("diagnostics_tests.rs"));
}

#[test]
fn test_dd_assert_passes_silently() {
    let (logger, spy) = spy_logger(LogLevel::Debug);
    dd_assert!(@logger &logger, 1 + 1 == 2);
    dd_warn!(@logger &logger, true);
    assert_eq!(spy.count(), 0);
}

#[test]
fn test_dd_warn_logs_at_warn() {
    let (logger, spy) = spy_logger(LogLevel::Debug);
    let ready = false;
    dd_warn!(@logger &logger, ready);
    if !ASSERTS_ENABLED {
        assert_eq!(spy.count(), 0);
        return;
    }
    let (level, message) = spy.last().unwrap();
    assert_eq!(level, LogLevel::Warn);
    assert!(message.contains("Warning triggered in"));
}

#[test]
fn test_dd_alert_matches_warn() {
    let (logger, spy) = spy_logger(LogLevel::Debug);
    let queue_full = true;
    dd_alert!(@logger &logger, !queue_full);
    dd_alert_reason!(@logger &logger, "fence timeout");
    if !ASSERTS_ENABLED {
        assert_eq!(spy.count(), 0);
        return;
    }

    let messages = spy.messages.lock().unwrap();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|(level, _)| *level == LogLevel::ALERT));
    assert!(messages[0].1.contains("!queue_full"));
    assert!(messages[1].1.contains("fence timeout"));
}

#[test]
fn test_dd_dbg_returns_value() {
    let (logger, spy) = spy_logger(LogLevel::Debug);
    let x = 5;
    let y = dd_dbg!(@logger &logger, LogLevel::Info, x + 10);
    assert_eq!(y, 15);
    let (_, message) = spy.last().unwrap();
    assert!(message.ends_with("\"x + 10\" == 15"));
}

#[test]
fn test_dd_unhandled_result() {
    let (logger, spy) = spy_logger(LogLevel::Debug);
    dd_unhandled_result!(@logger &logger, ResultCode::Success);
    assert_eq!(spy.count(), 0);

    dd_unhandled_result!(@logger &logger, ResultCode::FileIoError);
    let (level, message) = spy.last().unwrap();
    assert_eq!(level, LogLevel::Error);
    assert!(message.contains("\"ResultCode::FileIoError\" == \"FileIoError\" (0x11)"));
}

#[test]
fn test_unrecognized_result_warns() {
    let (logger, spy) = spy_logger(LogLevel::Debug);
    assert_eq!(result_to_str(12345, &logger), UNRECOGNIZED_RESULT);
    assert_eq!(
        spy.last(),
        Some((LogLevel::Warn, "Result code 12345 is not handled".to_string()))
    );

    assert_eq!(result_to_str(ResultCode::Aborted.raw(), &logger), "Aborted");
    assert_eq!(spy.count(), 1);
}

#[test]
fn test_process_logger_is_installed_once() {
    let spy = Arc::new(SpySink::default());
    let process_logger = Logger::new(LogLevel::Warn, spy.clone())
        .with_asserts(true)
        .with_assert_action(AssertAction::LogOnly);

    assert_eq!(install_logger(process_logger), Ok(()));
    assert_eq!(
        install_logger(Logger::silent(LogLevel::Debug)),
        Err(ResultCode::EntryExists)
    );
    assert_eq!(logger().min_level(), LogLevel::Warn);

    dd_print!(LogLevel::Info, "dropped");
    dd_print!(LogLevel::Error, "kept {}", 1);
    dd_not_implemented!();

    let messages = spy.messages.lock().unwrap();
    assert_eq!(messages[0], (LogLevel::Error, "kept 1".to_string()));
    if ASSERTS_ENABLED {
        assert_eq!(messages.len(), 2);
        assert!(messages[1].1.contains("Code not implemented!"));
    } else {
        assert_eq!(messages.len(), 1);
    }
}

/// Shared buffer handed to the fmt subscriber as its writer
#[derive(Clone, Default)]
struct CapturedOutput(Arc<Mutex<Vec<u8>>>);

impl CapturedOutput {
    fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_tracing_sink_maps_levels() {
    let output = CapturedOutput::default();
    let writer = output.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .without_time()
        .finish();

    let logger = Logger::new(LogLevel::Debug, Arc::new(TracingSink));
    tracing::subscriber::with_default(subscriber, || {
        dd_log!(&logger, LogLevel::Debug, "ring {}", 0);
        dd_log!(&logger, LogLevel::Verbose, "ring {}", 1);
        dd_log!(&logger, LogLevel::Info, "ring {}", 2);
        dd_log!(&logger, LogLevel::Warn, "ring {}", 3);
        dd_log!(&logger, LogLevel::Error, "ring {}", 4);
        dd_log!(&logger, LogLevel::Always, "ring {}", 5);
        TracingSink.write(LogLevel::Never, "ring 6");
    });

    let lines = output.lines();
    let expected = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR", "ERROR"];
    assert_eq!(lines.len(), expected.len());
    for (i, (line, level)) in lines.iter().zip(expected).enumerate() {
        assert!(line.contains(level), "{line}");
        assert!(line.ends_with(&format!("ddp: ring {i}")), "{line}");
    }
}
