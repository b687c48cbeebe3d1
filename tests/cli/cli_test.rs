//! CLI contract tests.

use std::path::Path;
use std::process::Output;

use assert_cmd::Command;

fn run(dir: &Path, args: &[&str]) -> Output {
    let mut cmd = Command::cargo_bin("tcds-guard").expect("binary should build");
    cmd.current_dir(dir)
        .env("TCDS_CONFIG_PATH", dir.join("absent.toml"))
        .env_remove("TCDS_STATE_FILE")
        .env_remove("TCDS_AUDIT_LOG")
        .env_remove("TCDS_LOGS_DIR")
        .env_remove("RUST_LOG")
        .args(args);
    cmd.output().expect("binary should run")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn status_on_clean_directory_is_normal() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let output = run(tmp.path(), &["status"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("normal state (green level)"));
}

#[test]
fn check_allows_default_origin() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let output = run(tmp.path(), &["check"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "allowed");
}

#[test]
fn check_refuses_blocked_origin() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let output = run(tmp.path(), &["check", "--origin", "kiosko_publico"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("TCDS_POLICY_BLOCK"));
}

#[test]
fn two_yellow_events_lock_across_invocations() {
    let tmp = tempfile::tempdir().expect("temp dir");

    let first = run(
        tmp.path(),
        &["event", "--severity", "yellow", "--reason", "first"],
    );
    assert!(first.status.success());
    assert!(stdout(&first).contains("alert state"));

    let second = run(
        tmp.path(),
        &["event", "--severity", "YELLOW", "--reason", "second"],
    );
    assert!(second.status.success());
    assert!(stdout(&second).contains("permanently LOCKED"));

    let check = run(tmp.path(), &["check"]);
    assert!(!check.status.success());
    assert!(String::from_utf8_lossy(&check.stderr).contains("TCDS_LOCK_PERMANENT"));

    assert!(tmp.path().join(".tcds_lock_state.json").exists());
    let audit = std::fs::read_to_string(tmp.path().join("tcds_security_audit.log"))
        .expect("audit log written");
    assert_eq!(audit.lines().count(), 2);
}

#[test]
fn state_path_can_be_overridden_by_env() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let mut cmd = Command::cargo_bin("tcds-guard").expect("binary should build");
    let output = cmd
        .current_dir(tmp.path())
        .env("TCDS_CONFIG_PATH", tmp.path().join("absent.toml"))
        .env("TCDS_STATE_FILE", tmp.path().join("custom.json"))
        .args(["event", "--severity", "red", "--reason", "harm"])
        .output()
        .expect("binary should run");
    assert!(output.status.success());
    assert!(tmp.path().join("custom.json").exists());
    assert!(!tmp.path().join(".tcds_lock_state.json").exists());
}
