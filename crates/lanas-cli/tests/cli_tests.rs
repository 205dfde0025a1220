//! Integration tests for the `lanas` CLI binary.
//!
//! The CLI runs as a subprocess against an address where nothing listens,
//! so these cover argument parsing, local input checks and exit codes.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::Path;
use std::process::Command;

fn lanas_bin() -> String {
    let path = env!("CARGO_BIN_EXE_lanas");
    assert!(Path::new(path).exists(), "lanas binary not found at {path}");
    path.to_owned()
}

/// Run lanas with args and return (`exit_code`, stdout, stderr).
fn run(args: &[&str]) -> (i32, String, String) {
    let output = Command::new(lanas_bin())
        .args(args)
        .env("LANAS_ADDR", "http://127.0.0.1:19998")
        .env_remove("LANAS_TOKEN")
        .output()
        .expect("failed to execute lanas");

    let code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (code, stdout, stderr)
}

// ── Version & help ───────────────────────────────────────────────────

#[test]
fn test_version_flag() {
    let (code, stdout, _) = run(&["--version"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("lanas"), "version output: {stdout}");
}

#[test]
fn test_help_lists_commands() {
    let (code, stdout, _) = run(&["--help"]);
    assert_eq!(code, 0);
    for cmd in ["status", "catalog", "leads", "submit"] {
        assert!(stdout.contains(cmd), "help should list '{cmd}'");
    }
    assert!(stdout.contains("LANAS_TOKEN"));
}

#[test]
fn test_leads_subcommand_help() {
    let (code, stdout, _) = run(&["leads", "--help"]);
    assert_eq!(code, 0);
    for cmd in ["list", "show", "export"] {
        assert!(stdout.contains(cmd), "leads help should list '{cmd}'");
    }
}

#[test]
fn test_unknown_command_fails() {
    let (code, _, _) = run(&["frobnicate"]);
    assert_ne!(code, 0);
}

// ── Failure paths ────────────────────────────────────────────────────

#[test]
fn test_status_without_server_fails() {
    let (code, _, stderr) = run(&["status"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("request failed"), "stderr: {stderr}");
}

#[test]
fn test_leads_list_requires_token() {
    let (code, _, stderr) = run(&["leads", "list"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("no token provided"), "stderr: {stderr}");
}

#[test]
fn test_submit_missing_file() {
    let (code, _, stderr) = run(&["submit", "/nonexistent/lead.json"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("failed to read"), "stderr: {stderr}");
}

#[test]
fn test_submit_rejects_invalid_json() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("lead.json");
    fs::write(&file, "{ not json").unwrap();

    let (code, _, stderr) = run(&["submit", file.to_str().unwrap()]);
    assert_ne!(code, 0);
    assert!(stderr.contains("not valid JSON"), "stderr: {stderr}");
}

#[test]
fn test_submit_rejects_non_object() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("lead.json");
    fs::write(&file, "[1, 2, 3]").unwrap();

    let (code, _, stderr) = run(&["submit", file.to_str().unwrap()]);
    assert_ne!(code, 0);
    assert!(stderr.contains("must contain a JSON object"), "stderr: {stderr}");
}
