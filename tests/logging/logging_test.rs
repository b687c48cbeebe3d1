//! Tests for `src/logging.rs`.

use tcds_guard::logging::LoggingGuard;

#[test]
fn logging_guard_is_send() {
    fn assert_send<T: Send>() {}
    assert_send::<LoggingGuard>();
}

#[test]
fn init_production_creates_logs_dir() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let logs_dir = tmp.path().join("logs");
    assert!(!logs_dir.exists());

    // Only one global subscriber may be installed per process, so the result
    // is not asserted. The directory is created before installation.
    let _result = tcds_guard::logging::init_production(&logs_dir, "info");
    assert!(logs_dir.exists(), "logs directory should be created");
}

#[test]
fn init_cli_is_idempotent() {
    tcds_guard::logging::init_cli("debug");
    tcds_guard::logging::init_cli("debug");
}
