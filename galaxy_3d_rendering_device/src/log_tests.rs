//! Unit tests for log.rs
//!
//! Tests Logger trait, LogEntry, LogSeverity, DefaultLogger and the
//! engine_err!/engine_bail! helpers.

use crate::log::{self, Logger, LogEntry, LogSeverity, DefaultLogger};
use crate::error::{Error, Result};
use serial_test::serial;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_severity_debug() {
    assert_eq!(format!("{:?}", LogSeverity::Trace), "Trace");
    assert_eq!(format!("{:?}", LogSeverity::Warn), "Warn");
    assert_eq!(format!("{:?}", LogSeverity::Error), "Error");
}

// ============================================================================
// DEFAULT LOGGER TESTS
// ============================================================================

#[test]
fn test_default_logger_all_severities() {
    let logger = DefaultLogger;
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        logger.log(&LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: "galaxy3d::RenderingDevice".to_string(),
            message: format!("{:?} message", severity),
            file: None,
            line: None,
        });
    }
}

#[test]
fn test_default_logger_error_with_file_line() {
    let logger = DefaultLogger;
    logger.log(&LogEntry {
        severity: LogSeverity::Error,
        timestamp: SystemTime::now(),
        source: "galaxy3d::RenderingDevice".to_string(),
        message: "Texture width is zero".to_string(),
        file: Some("rendering_device.rs"),
        line: Some(42),
    });
}

// ============================================================================
// CAPTURING LOGGER
// ============================================================================

struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn install_capture_logger() -> Arc<Mutex<Vec<LogEntry>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    log::set_logger(CaptureLogger { entries: entries.clone() });
    entries
}

#[test]
fn test_logger_trait_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DefaultLogger>();
    assert_send_sync::<CaptureLogger>();
}

#[test]
#[serial]
fn test_macros_route_to_installed_logger() {
    let entries = install_capture_logger();

    crate::engine_debug!("galaxy3d::RenderingDevice", "debug {}", 1);
    crate::engine_warn!("galaxy3d::RenderingDevice", "warn {}", 2);
    crate::engine_error!("galaxy3d::RenderingDevice", "error {}", 3);

    let captured = entries.lock().unwrap().clone();
    log::reset_logger();

    assert_eq!(captured.len(), 3);
    assert_eq!(captured[0].severity, LogSeverity::Debug);
    assert_eq!(captured[0].message, "debug 1");
    assert!(captured[0].file.is_none());
    assert_eq!(captured[1].severity, LogSeverity::Warn);
    assert_eq!(captured[2].severity, LogSeverity::Error);
    assert!(captured[2].file.is_some());
    assert!(captured[2].line.is_some());
}

#[test]
#[serial]
fn test_engine_err_logs_and_builds_variant() {
    let entries = install_capture_logger();

    let err = crate::engine_err!("galaxy3d::RenderingDevice", InvalidParameter, "bad size {}", 7);

    let captured = entries.lock().unwrap().clone();
    log::reset_logger();

    assert_eq!(err, Error::InvalidParameter("bad size 7".to_string()));
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].severity, LogSeverity::Error);
    assert_eq!(captured[0].source, "galaxy3d::RenderingDevice");
    assert_eq!(captured[0].message, "bad size 7");
}

#[test]
#[serial]
fn test_engine_bail_returns_early() {
    let entries = install_capture_logger();

    fn check(value: u32) -> Result<u32> {
        if value == 0 {
            crate::engine_bail!("galaxy3d::RenderingDevice", Unsupported, "zero is not supported");
        }
        Ok(value * 2)
    }

    let ok = check(4);
    let err = check(0);
    let captured = entries.lock().unwrap().len();
    log::reset_logger();

    assert_eq!(ok, Ok(8));
    assert_eq!(err, Err(Error::Unsupported("zero is not supported".to_string())));
    assert_eq!(captured, 1);
}
