//! Integration tests for the `aldes` CLI binary.
//!
//! Argument parsing, help, completions, local commands, and error
//! handling run without network access; the account-bound commands run
//! against a wiremock stand-in for the Aldes API.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `aldes` binary with env isolation.
///
/// Clears all `ALDES_*` env vars and points config directories at `home`
/// so tests never touch the user's real configuration.
fn aldes_cmd_in(home: &str) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("aldes");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("ALDES_PROFILE")
        .env_remove("ALDES_USERNAME")
        .env_remove("ALDES_PASSWORD")
        .env_remove("ALDES_API_URL")
        .env_remove("ALDES_OUTPUT")
        .env_remove("ALDES_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

fn aldes_cmd() -> assert_cmd::Command {
    aldes_cmd_in("/tmp/aldes-cli-test-nonexistent")
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

async fn mock_account() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "tok" })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/aldesoc/v5/users/me/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "modem": "0123",
                "reference": "AIR_TOP",
                "indicator": { "current_air_mode": "W", "tmpcu": "22" }
            },
            { "modem": "9999", "reference": "T_ONE_AIR" }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/aldesoc/v5/users/me/products/0123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mode": "V",
            "product_data": {
                "dateLastFilterUpdate": "2024-03-15 10:30:00Z",
                "indicator": { "AIR_OUTSIDE_TPT": 8.5, "AIR_EXTF_FLW": 120 }
            }
        })))
        .mount(&server)
        .await;

    server
}

fn account_cmd(server: &MockServer) -> assert_cmd::Command {
    let mut cmd = aldes_cmd();
    cmd.env("ALDES_API_URL", server.uri())
        .env("ALDES_PASSWORD", "hunter2")
        .args(["--username", "me@example.com"]);
    cmd
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = aldes_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    aldes_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("ventilation")
            .and(predicate::str::contains("products"))
            .and(predicate::str::contains("sensors"))
            .and(predicate::str::contains("set-mode")),
    );
}

#[test]
fn test_version_flag() {
    aldes_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("aldes"));
}

// ── Shell completions & man page ────────────────────────────────────

#[test]
fn test_completions_bash() {
    aldes_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    aldes_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_man_page() {
    aldes_cmd()
        .arg("man")
        .assert()
        .success()
        .stdout(predicate::str::contains(".TH"));
}

// ── Local commands ──────────────────────────────────────────────────

#[test]
fn test_modes_plain() {
    let output = aldes_cmd().args(["modes", "-o", "plain"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    insta::assert_snapshot!(stdout.trim_end(), @r"
    Holidays
    Daily
    Boost
    Guest
    Air Prog
    ");
}

#[test]
fn test_modes_json_includes_codes() {
    aldes_cmd()
        .args(["modes", "-o", "json-compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"name":"Air Prog","code":"Z"}"#));
}

#[test]
fn test_config_set_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let home = dir.path().to_str().unwrap().to_owned();

    aldes_cmd_in(&home)
        .args(["config", "set", "username", "me@example.com"])
        .assert()
        .success();

    aldes_cmd_in(&home)
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default *"));

    aldes_cmd_in(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[profiles.default]")
                .and(predicate::str::contains("username = \"me@example.com\"")),
        );
}

/// Config file location under an isolated `home` on this platform.
fn config_file_in(home: &std::path::Path) -> std::path::PathBuf {
    let linux = home.join("aldes").join("config.toml");
    let macos = home
        .join("Library")
        .join("Application Support")
        .join("com.aldes.aldes")
        .join("config.toml");
    if macos.exists() { macos } else { linux }
}

#[test]
fn test_malformed_config_is_never_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let home = dir.path().to_str().unwrap().to_owned();

    aldes_cmd_in(&home)
        .args(["config", "set", "username", "me@example.com"])
        .assert()
        .success();

    let path = config_file_in(dir.path());
    let broken = "[profiles.default\nusername = \"me@example.com\"\n";
    std::fs::write(&path, broken).unwrap();

    aldes_cmd_in(&home)
        .args(["config", "set", "timeout", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config loading failed"));

    aldes_cmd_in(&home)
        .args(["products"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found").not());

    assert_eq!(std::fs::read_to_string(&path).unwrap(), broken);
}

#[test]
fn test_config_use_unknown_profile() {
    let home = tempfile::tempdir().unwrap();
    aldes_cmd_in(home.path().to_str().unwrap())
        .args(["config", "use", "cabin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cabin"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = aldes_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_products_without_config() {
    aldes_cmd()
        .arg("products")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn test_set_mode_rejects_unknown_mode_before_login() {
    aldes_cmd()
        .args(["set-mode", "0123", "Turbo"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown mode 'Turbo'"));
}

// ── Account-bound commands ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_products_lists_supported_only() {
    let server = mock_account().await;

    account_cmd(&server)
        .args(["products", "-o", "json-compact"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(r#""id":"0123""#)
                .and(predicate::str::contains(r#""name":"InspirAIR TOP""#))
                .and(predicate::str::contains(r#""mode":"Daily""#))
                .and(predicate::str::contains(r#""tmpcu":"22""#))
                .and(predicate::str::contains("9999").not()),
        );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sensors_plain_output() {
    let server = mock_account().await;

    account_cmd(&server)
        .args(["sensors", "0123", "-o", "plain"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("outside_temperature=8.5")
                .and(predicate::str::contains("exit_air_flow=120"))
                .and(predicate::str::contains("last_filter_change=2024-03-15"))
                .and(predicate::str::contains("intake_air_speed=\n")),
        );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sensors_json_keeps_integer_readings() {
    let server = mock_account().await;

    account_cmd(&server)
        .args(["sensors", "0123", "-o", "json-compact"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(r#""sensor":"exit_air_flow","#)
                .and(predicate::str::contains(r#""value":120,"#))
                .and(predicate::str::contains("120.0").not())
                .and(predicate::str::contains(r#""value":8.5,"#)),
        );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sensors_unknown_product() {
    let server = mock_account().await;

    account_cmd(&server)
        .args(["sensors", "9999"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("product '9999' not found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_failure_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token/"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
        .mount(&server)
        .await;

    account_cmd(&server)
        .arg("products")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Authentication failed"));
}
