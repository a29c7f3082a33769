//! Test assertion helpers.

use std::process::Output;

use assert_cmd::assert::OutputAssertExt;
use predicates::prelude::*;
use serde_json::Value;

/// Assert that a command output was successful.
pub fn assert_success(output: &Output) {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("Command failed:\n{}", stderr);
    }
}

/// Assert that a command output failed.
pub fn assert_failure(output: &Output) {
    assert!(
        !output.status.success(),
        "Expected command to fail but it succeeded:\n{}",
        stdout(output)
    );
}

/// Get stdout as String.
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Get stderr as String.
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Parse stdout as one JSON document.
pub fn json_stdout(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout)
        .unwrap_or_else(|e| panic!("stdout is not json ({}): {}", e, stdout(output)))
}

/// Assert stderr contains a string.
pub fn assert_stderr_contains(output: &Output, expected: &str) {
    output
        .clone()
        .assert()
        .stderr(predicate::str::contains(expected));
}

/// Assert stderr does not contain a string.
pub fn assert_stderr_lacks(output: &Output, unexpected: &str) {
    output
        .clone()
        .assert()
        .stderr(predicate::str::contains(unexpected).not());
}

/// Versions of a check response, in order.
pub fn versions(response: &Value) -> Vec<String> {
    response
        .as_array()
        .expect("check response is an array")
        .iter()
        .map(|v| v["version"].as_str().expect("version is a string").to_string())
        .collect()
}

/// Value of the named metadata entry.
pub fn metadata_value<'a>(response: &'a Value, name: &str) -> Option<&'a str> {
    response["metadata"]
        .as_array()?
        .iter()
        .find(|entry| entry["name"] == name)
        .and_then(|entry| entry["value"].as_str())
}
