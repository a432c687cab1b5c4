//! Integration tests for the `cvptool` binary.
//!
//! Argument validation, help output and completions run without any
//! controller; the remaining tests point the binary at a wiremock server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `cvptool` binary with env isolation.
///
/// Clears all `CVPKIT_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn cvptool_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("cvptool");
    cmd.env("HOME", "/tmp/cvptool-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/cvptool-test-nonexistent")
        .env("CVPKIT_CONFIG", "/tmp/cvptool-test-nonexistent/config.toml")
        .env_remove("CVPKIT_HOST")
        .env_remove("CVPKIT_USER")
        .env_remove("CVPKIT_PASSWORD")
        .env_remove("CVPKIT_PROFILE")
        .env_remove("CVPKIT_OUTPUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Connection flags for a mock controller.
fn connect_args(server: &MockServer) -> Vec<String> {
    let port = server.address().port().to_string();
    ["--host", "127.0.0.1", "--port", &port, "--user", "cvpadmin", "--password", "pw"]
        .into_iter()
        .map(str::to_owned)
        .collect()
}

async fn mock_login(server: &MockServer, version: &str) {
    Mock::given(method("POST"))
        .and(path("/web/login/authenticate.do"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sessionId": "s1"})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/web/cvpInfo/getCvpInfo.do"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": version})))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/web/login/logout.do"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": "success"})))
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = cvptool_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    cvptool_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("--tarFile")
            .and(predicate::str::contains("--objNames"))
            .and(predicate::str::contains("--skipVersionCheck")),
    );
}

#[test]
fn test_version_flag() {
    cvptool_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cvptool"));
}

#[test]
fn test_completions_bash() {
    cvptool_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Argument validation ─────────────────────────────────────────────

#[test]
fn test_backup_requires_tar_file() {
    cvptool_cmd()
        .args(["--host", "cvp", "--user", "u", "--password", "p", "--action", "backup"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--tarFile is required for backup"));
}

#[test]
fn test_obj_names_need_configlets_only() {
    cvptool_cmd()
        .args([
            "--host", "cvp", "--action", "restore", "--tarFile", "x.tar", "--objects", "configlets",
            "roles", "--objNames", "base",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("only configlets"));
}

#[test]
fn test_tasks_only_for_restore() {
    cvptool_cmd()
        .args(["--host", "cvp", "--action", "backup", "--tarFile", "x.tar", "--tasks", "true"])
        .assert()
        .code(2);
}

#[test]
fn test_invalid_object_type() {
    let output = cvptool_cmd()
        .args(["--host", "cvp", "--objects", "widgets"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("widgets"));
}

#[test]
fn test_missing_host_is_usage_error() {
    cvptool_cmd()
        .args(["--user", "u", "--password", "p", "--tarFile", "x.tar"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No controller host"));
}

#[test]
fn test_unknown_profile() {
    cvptool_cmd()
        .args(["--profile", "nope", "--tarFile", "x.tar"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("nope"));
}

#[test]
fn test_reset_without_terminal_requires_yes() {
    cvptool_cmd()
        .args(["--host", "cvp", "--user", "u", "--password", "p", "--action", "reset"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("requires confirmation"));
}

// ── Against a mock controller ───────────────────────────────────────

#[test]
fn test_unreachable_controller() {
    cvptool_cmd()
        .args([
            "--host", "127.0.0.1", "--port", "1", "--user", "u", "--password", "p", "--tarFile",
            "x.tar",
        ])
        .assert()
        .code(7);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_login_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/web/login/authenticate.do"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errorCode": "112498",
            "errorMessage": "Unauthorized User"
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let tar = dir.path().join("cvp.tar");
    cvptool_cmd()
        .args(connect_args(&server))
        .arg("--tarFile")
        .arg(&tar)
        .assert()
        .code(3);
    assert!(!tar.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_controller_version_gate() {
    let server = MockServer::start().await;
    mock_login(&server, "2017.2.0").await;

    let dir = tempfile::tempdir().unwrap();
    cvptool_cmd()
        .args(connect_args(&server))
        .arg("--tarFile")
        .arg(dir.path().join("cvp.tar"))
        .assert()
        .code(6)
        .stderr(predicate::str::contains("--skipVersionCheck"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_reset_roles_keeps_builtins() {
    let server = MockServer::start().await;
    mock_login(&server, "2016.1.2").await;
    Mock::given(method("GET"))
        .and(path("/web/role/getRoles.do"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 3,
            "roles": [
                {"key": "network-admin", "name": "network-admin", "moduleList": []},
                {"key": "network-operator", "name": "network-operator", "moduleList": []},
                {"key": "role_1", "name": "auditor", "moduleList": []}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/web/role/deleteRoles.do"))
        .and(wiremock::matchers::body_json(json!(["role_1"])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": "success"})))
        .expect(1)
        .mount(&server)
        .await;

    let output = cvptool_cmd()
        .args(connect_args(&server))
        .args(["--action", "reset", "--objects", "roles", "--yes", "--output", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["deleted"][0]["name"], "auditor");
    assert_eq!(report["deleted"].as_array().unwrap().len(), 1);
}
