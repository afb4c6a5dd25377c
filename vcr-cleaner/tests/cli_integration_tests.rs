// vcr-cleaner/tests/cli_integration_tests.rs
//! Command-line integration tests for the `vcr-cleaner` binary.
//!
//! Each test writes its policy and exchange documents to temporary files,
//! runs the binary through `assert_cmd`, and checks stdout and the exit code.
//! Logs go to stderr and are not asserted on, except where noted.

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use tempfile::{Builder, NamedTempFile, TempDir};
use test_log::test;

const POLICY: &str = r#"
request:
  ignoreQueryFields: [apiKey]
  ignoreHeaders: [X-Api-Key]
  bodyScrubbers:
    - name: super_secret
      pattern: 'SuperSecret'
      replaceWith: ''
response:
  ignoreHeaders: ['*']
"#;

const EXCHANGE_JSON: &str = r#"{
  "request": {
    "method": "POST",
    "url": "http://127.0.0.1:61234/search?apiKey=somethingSensitive&q=keyword",
    "headers": {"X-Api-Key": "SuperToast", "X-Type": "application/vcr"},
    "body": "This is not secret, but this is SuperSecret"
  },
  "response": {
    "status": {"code": 200},
    "headers": {"Content-Type": "application/json", "X-Cache": "true"},
    "body": "{\"status\": 200}"
  }
}"#;

fn temp_file(suffix: &str, contents: &str) -> Result<NamedTempFile> {
    let mut file = Builder::new().suffix(suffix).tempfile()?;
    file.write_all(contents.as_bytes())?;
    Ok(file)
}

fn vcr_cleaner() -> Command {
    let mut cmd = Command::cargo_bin("vcr-cleaner").unwrap();
    cmd.env("RUST_LOG", "debug");
    cmd.env_remove("VCR_CLEANER_POLICY");
    cmd
}

#[test]
fn sanitize_stdin_to_stdout() -> Result<()> {
    let policy = temp_file(".yaml", POLICY)?;

    vcr_cleaner()
        .args(["sanitize", "--policy"])
        .arg(policy.path())
        .write_stdin(EXCHANGE_JSON)
        .assert()
        .success()
        .stdout(predicate::str::contains("somethingSensitive").not())
        .stdout(predicate::str::contains("SuperToast").not())
        .stdout(predicate::str::contains("SuperSecret").not())
        .stdout(predicate::str::contains("X-Cache").not())
        .stdout(predicate::str::contains("q=keyword"))
        .stdout(predicate::str::contains("\"X-Api-Key\": \"\""))
        .stdout(predicate::str::contains("This is not secret, but this is \""));
    Ok(())
}

#[test]
fn sanitize_yaml_file_to_file() -> Result<()> {
    let policy = temp_file(".yaml", POLICY)?;
    let yaml_exchange = r#"
request:
  method: GET
  url: "http://127.0.0.1:61234/search?apiKey=abc&q=keyword"
  headers:
    x-api-key: SuperToast
response:
  status:
    code: 200
  headers:
    X-Cache: "true"
"#;
    let input = temp_file(".yml", yaml_exchange)?;
    let dir = TempDir::new()?;
    let output = dir.path().join("sanitized.yaml");

    vcr_cleaner()
        .args(["--quiet", "sanitize", "--policy"])
        .arg(policy.path())
        .arg("--input")
        .arg(input.path())
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written = fs::read_to_string(&output)?;
    assert!(!written.contains("SuperToast"));
    assert!(!written.contains("apiKey"));
    assert!(written.contains("x-api-key"));
    assert!(!written.contains("X-Cache"));
    Ok(())
}

#[test]
fn command_line_flags_build_a_policy_without_a_file() -> Result<()> {
    vcr_cleaner()
        .args([
            "sanitize",
            "--ignore-hostname",
            "--ignore-query-field",
            "apiKey",
            "--ignore-header",
            "*",
        ])
        .write_stdin(EXCHANGE_JSON)
        .assert()
        .success()
        .stdout(predicate::str::contains("http://[]:61234/search?q=keyword"))
        .stdout(predicate::str::contains("application/vcr").not())
        // Response headers are untouched without a response policy.
        .stdout(predicate::str::contains("X-Cache"));
    Ok(())
}

#[test]
fn failing_policy_file_is_reported() -> Result<()> {
    let policy = temp_file(
        ".yaml",
        "request:\n  bodyScrubbers:\n    - name: broken\n      pattern: '(unclosed'\n",
    )?;

    vcr_cleaner()
        .args(["sanitize", "--policy"])
        .arg(policy.path())
        .write_stdin(EXCHANGE_JSON)
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken"));
    Ok(())
}

#[test]
fn malformed_url_fails_loudly() -> Result<()> {
    let exchange = r#"{"request": {"method": "GET", "url": "/relative"}, "response": {}}"#;

    vcr_cleaner()
        .args(["sanitize", "--ignore-hostname"])
        .write_stdin(exchange)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed URL"));
    Ok(())
}

#[test]
fn match_reports_every_matcher() -> Result<()> {
    let policy = temp_file(".yaml", POLICY)?;
    let recorded = temp_file(
        ".json",
        r#"{"method": "POST", "url": "http://127.0.0.1:61234/search?q=keyword",
            "headers": {"X-Api-Key": "", "X-Type": "application/vcr"},
            "body": "This is not secret, but this is "}"#,
    )?;
    let live = temp_file(".json", EXCHANGE_JSON)?;

    vcr_cleaner()
        .args(["match", "--policy"])
        .arg(policy.path())
        .arg(recorded.path())
        .arg(live.path())
        .assert()
        .success()
        .stdout("host: ok\nquery_string: ok\nheaders: ok\nbody: ok\npost_fields: ok\n");
    Ok(())
}

#[test]
fn match_exits_non_zero_on_mismatch() -> Result<()> {
    let recorded = temp_file(".json", r#"{"method": "GET", "url": "http://example.com/search?q=one"}"#)?;
    let live = temp_file(".json", r#"{"method": "GET", "url": "http://example.com/search?q=two"}"#)?;

    vcr_cleaner()
        .arg("match")
        .arg(recorded.path())
        .arg(live.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("query_string: mismatch"))
        .stdout(predicate::str::contains("host: ok"));
    Ok(())
}

#[test]
fn no_arguments_prints_help() {
    vcr_cleaner()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}
