//! Unit tests for the logging helpers in the `khomp-lora` crate.

use khomp_lora::logging::{init_logger_with_default, log_debug, log_error, log_info, log_warn};
use khomp_lora::decode;

/// Tests that the logging helpers do not panic once a logger is installed.
#[test]
fn test_logging() {
    init_logger_with_default("debug");
    log_error("This is an error message");
    log_warn("This is a warning message");
    log_info("This is an info message");
    log_debug("This is a debug message");
}

/// Repeated initialization is ignored.
#[test]
fn test_init_logger_twice() {
    init_logger_with_default("warn");
    init_logger_with_default("trace");
}

/// Decoding with a logger installed exercises the per-frame debug output and
/// the warning for an unknown extension module.
#[test]
fn test_decode_with_logging_enabled() {
    init_logger_with_default("debug");
    let doc = decode("nit2xli", &[0x00, 0x00, 0xFF], 3).unwrap();
    assert!(doc.group(khomp_lora::Group::Modules).is_none());
}
