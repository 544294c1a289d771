//! Smoke tests for the coach-probe CLI
//!
//! These run the built binary end to end. Nothing here needs a browser or a
//! running frontend: live scenarios are exercised through `--dry-run`.

#![allow(deprecated)] // Command::cargo_bin
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the coach-probe binary, isolated from the caller's environment
fn coach_probe() -> Command {
    let mut cmd = Command::cargo_bin("coach-probe").expect("coach-probe binary should exist");
    cmd.env_remove("CI")
        .env_remove("COACH_BASE_URL")
        .env_remove("COACH_OUTPUT_DIR")
        .env_remove("RUST_LOG");
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    coach_probe()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_flag() {
    coach_probe()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Decision Coach"))
        .stdout(predicate::str::contains("test"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("list"));
}

#[test]
fn test_no_args_shows_help() {
    coach_probe().assert().failure();
}

#[test]
fn test_test_subcommand_help() {
    coach_probe()
        .args(["test", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--filter"))
        .stdout(predicate::str::contains("--dry-run"));
}

// ============================================================================
// List
// ============================================================================

#[test]
fn test_list_all_scenarios() {
    coach_probe()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("basic_rendering"))
        .stdout(predicate::str::contains("multiple_queries"))
        .stdout(predicate::str::contains("error_states"))
        .stdout(predicate::str::contains("layout_dynamic_stability"));
}

#[test]
fn test_list_filtered() {
    coach_probe()
        .args(["list", "--filter", "layout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("layout_default"))
        .stdout(predicate::str::contains("basic_rendering").not());
}

// ============================================================================
// Test (dry run)
// ============================================================================

#[test]
fn test_dry_run_passes_and_writes_reports() {
    let temp = TempDir::new().expect("create temp dir");
    coach_probe()
        .args(["--color", "never", "test", "--dry-run", "--output"])
        .arg(temp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("PASSED"));

    let json = fs::read_to_string(temp.path().join("report.json")).unwrap();
    assert!(json.contains("layout_viewport_sweep"));
    assert!(temp.path().join("report.html").exists());
    assert!(temp.path().join("junit.xml").exists());
}

#[test]
fn test_dry_run_json_output() {
    let temp = TempDir::new().expect("create temp dir");
    let output = coach_probe()
        .args(["test", "--dry-run", "--only", "layout_default", "--format", "json", "--output"])
        .arg(temp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["results"][0]["name"], "layout_default");
    assert_eq!(report["results"][0]["status"], "passed");
}

#[test]
fn test_only_rejected_in_ci() {
    coach_probe()
        .env("CI", "true")
        .args(["test", "--dry-run", "--only", "layout_default"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--only"));
}

#[test]
fn test_unknown_scenario() {
    coach_probe()
        .args(["test", "--dry-run", "--only", "does_not_exist"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("does_not_exist"));
}

#[test]
fn test_bad_config_file() {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().join("coach-probe.yaml");
    fs::write(&path, "retries: [not, a, number]\n").unwrap();
    coach_probe()
        .args(["test", "--dry-run", "--config"])
        .arg(&path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("YAML"));
}

// ============================================================================
// Check
// ============================================================================

#[test]
fn test_check_unreachable_frontend() {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().join("coach-probe.yaml");
    fs::write(&path, "readiness:\n  attempts: 1\n  request_timeout: 1000\n").unwrap();
    coach_probe()
        .args(["check", "--base-url", "http://127.0.0.1:1", "--config"])
        .arg(&path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not ready"));
}
