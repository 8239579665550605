use std::io::Write;

use assert_cmd::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::{NamedTempFile, TempDir};

/// Run the binary from an empty directory so no stray `.env` file is picked up.
fn isolated() -> (assert_cmd::Command, TempDir) {
    let dir = TempDir::new().expect("create temp dir");
    let mut cmd = cargo_bin_cmd!("llm-starter-kit");
    cmd.current_dir(dir.path())
        .env_remove("ANTHROPIC_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("ANTHROPIC_MODEL")
        .env_remove("OPENAI_MODEL")
        .env_remove("MAX_TOKENS")
        .env_remove("MAX_REQUESTS_PER_MINUTE")
        .env_remove("RETRY_MAX_ATTEMPTS")
        .env_remove("RETRY_DELAY_SECS");
    (cmd, dir)
}

#[test]
fn test_help_shows_usage() {
    cargo_bin_cmd!("llm-starter-kit")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rate-limited, retrying access"));
}

#[test]
fn test_version_shows_version() {
    cargo_bin_cmd!("llm-starter-kit")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("llm-starter-kit"));
}

#[test]
fn test_check_without_keys_reports_missing_keys() {
    let (mut cmd, _dir) = isolated();
    cmd.arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("ClaudeClient needs API key"))
        .stdout(predicate::str::contains("OpenAiClient needs API key"))
        .stdout(predicate::str::contains("Next step"));
}

#[test]
fn test_check_with_keys_initializes_clients() {
    let (mut cmd, _dir) = isolated();
    cmd.env("ANTHROPIC_API_KEY", "sk-ant-test")
        .env("OPENAI_API_KEY", "sk-test")
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("[ok]   ClaudeClient initializes"))
        .stdout(predicate::str::contains("[ok]   OpenAiClient initializes"))
        .stdout(predicate::str::contains("sk-test").not())
        .stdout(predicate::str::contains("Next step").not());
}

#[test]
fn test_check_rejects_zero_rate_limit() {
    let (mut cmd, _dir) = isolated();
    cmd.env("ANTHROPIC_API_KEY", "sk-ant-test")
        .env("OPENAI_API_KEY", "sk-test")
        .env("MAX_REQUESTS_PER_MINUTE", "0")
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid rate limit"))
        .stdout(predicate::str::contains("initializes").not());
}

#[test]
fn test_check_rejects_negative_retry_delay() {
    let (mut cmd, _dir) = isolated();
    cmd.env("RETRY_DELAY_SECS", "-1")
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid retry policy"));
}

#[test]
fn test_env_overrides_config_file() {
    let mut file = NamedTempFile::new().expect("create temp file");
    writeln!(file, "max_requests_per_minute = 0").expect("write temp file");

    let (mut cmd, _dir) = isolated();
    cmd.env("MAX_REQUESTS_PER_MINUTE", "7")
        .arg("--config")
        .arg(file.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("allows 7 calls per minute"));
}

#[test]
fn test_invalid_env_value_fails() {
    let (mut cmd, _dir) = isolated();
    cmd.env("MAX_REQUESTS_PER_MINUTE", "lots")
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("MAX_REQUESTS_PER_MINUTE"));
}

#[test]
fn test_config_file_is_loaded() {
    let mut file = NamedTempFile::new().expect("create temp file");
    writeln!(file, "openai_model = \"gpt-4o-mini\"").expect("write temp file");

    let (mut cmd, _dir) = isolated();
    cmd.arg("--config")
        .arg(file.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("gpt-4o-mini"));
}

#[test]
fn test_missing_config_file_fails() {
    let (mut cmd, _dir) = isolated();
    cmd.args(["--config", "does-not-exist.toml", "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
}

#[test]
fn test_unknown_provider_fails_gracefully() {
    let (mut cmd, _dir) = isolated();
    cmd.args(["--provider", "nonexistent", "ask", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown provider"));
}

#[test]
fn test_ask_without_api_key_fails_gracefully() {
    let (mut cmd, _dir) = isolated();
    cmd.args(["ask", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ANTHROPIC_API_KEY"));
}

#[test]
fn test_burst_rejects_zero_attempts() {
    let (mut cmd, _dir) = isolated();
    cmd.env("OPENAI_API_KEY", "sk-test")
        .args(["--provider", "openai", "burst", "--max-attempts", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid retry policy"));
}
