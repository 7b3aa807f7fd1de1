//! Integration tests for the logging system
//!
//! A capturing logger is installed process-wide, so every test runs
//! serially and restores the default logger before returning.
//!
//! Run with: cargo test --test logging_integration_tests

mod test_utils;

use galaxy_3d_rendering_device::galaxy3d::log::{reset_logger, set_logger, LogEntry, LogSeverity, Logger};
use galaxy_3d_rendering_device::galaxy3d::device::{DataFormat, TextureDesc, TextureUsage, TextureView};
use galaxy_3d_rendering_device::{engine_info, engine_warn};
use serial_test::serial;
use std::sync::{Arc, Mutex};
use test_utils::*;

// ============================================================================
// TEST LOGGER IMPLEMENTATION
// ============================================================================

/// Test logger that captures log entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogger {
    fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self { entries: entries.clone() }, entries)
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn with_captured_logs<F: FnOnce()>(body: F) -> Vec<LogEntry> {
    let (test_logger, entries) = TestLogger::new();
    set_logger(test_logger);
    body();
    reset_logger();
    let captured = entries.lock().unwrap().clone();
    captured
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_custom_logger_receives_macros() {
    let captured = with_captured_logs(|| {
        engine_info!("test::module", "Loaded {} textures", 3);
        engine_warn!("test::module", "Slow frame: {} ms", 40);
    });

    assert_eq!(captured.len(), 2);
    assert_eq!(captured[0].severity, LogSeverity::Info);
    assert_eq!(captured[0].source, "test::module");
    assert_eq!(captured[0].message, "Loaded 3 textures");
    assert_eq!(captured[0].file, None);
    assert_eq!(captured[1].severity, LogSeverity::Warn);
    assert_eq!(captured[1].message, "Slow frame: 40 ms");
}

#[test]
#[serial]
fn test_integration_device_creation_is_logged() {
    let captured = with_captured_logs(|| {
        primary_device();
    });

    let created = captured
        .iter()
        .find(|e| e.severity == LogSeverity::Info && e.source == "galaxy3d::RenderingDevice")
        .expect("device creation should be logged");
    assert!(created.message.contains("Galaxy3D Software Device"));
    assert!(created.message.contains("frame delay 2"));
}

#[test]
#[serial]
fn test_integration_rejected_operation_logs_error_with_location() {
    let captured = with_captured_logs(|| {
        let mut device = local_device();
        let desc = TextureDesc::texture_2d(DataFormat::R8G8B8A8_UNORM, 0, 4, TextureUsage::SAMPLING);
        assert!(device.texture_create(&desc, &TextureView::default(), &[]).is_err());
    });

    let error = captured
        .iter()
        .find(|e| e.severity == LogSeverity::Error)
        .expect("rejected creation should log an error");
    assert_eq!(error.source, "galaxy3d::RenderingDevice");
    assert!(error.file.is_some());
    assert!(error.line.is_some());
}

#[test]
#[serial]
fn test_integration_double_free_logs_warning() {
    let captured = with_captured_logs(|| {
        let mut device = local_device();
        let buffer = device.uniform_buffer_create(16, None).unwrap();
        device.free(buffer).unwrap();
        device.free(buffer).unwrap();
    });

    let warnings: Vec<_> = captured.iter().filter(|e| e.severity == LogSeverity::Warn).collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("already freed"));
}

#[test]
#[serial]
fn test_integration_logger_reset() {
    let (test_logger, entries) = TestLogger::new();
    set_logger(test_logger);

    engine_info!("test", "Message 1");
    assert_eq!(entries.lock().unwrap().len(), 1);

    reset_logger();

    // Goes to the default logger, not captured
    engine_info!("test", "Message 2");
    assert_eq!(entries.lock().unwrap().len(), 1);
}
