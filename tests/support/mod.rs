//! Test support utilities for vault-resource integration tests.
//!
//! Provides an isolated build directory, a command helper for each resource
//! step, and a wiremock stand-in for the Vault HTTP API.

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;
pub mod vault;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use vault::Vault;

use std::path::Path;
use std::process::Output;

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// Test environment with an isolated build directory.
///
/// Steps run as child processes, so tests can safely run in parallel.
pub struct Test {
    /// Destination (`in`) or source (`out`) directory
    pub dir: TempDir,
}

impl Test {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        Self { dir }
    }

    /// A vault-resource command with a clean logging environment.
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd =
            Command::cargo_bin("vault-resource").expect("failed to find vault-resource binary");
        cmd.env_remove("VAULT_RESOURCE_LOG");
        for var in [
            "AWS_ACCESS_KEY_ID",
            "AWS_SECRET_ACCESS_KEY",
            "AWS_SESSION_TOKEN",
            "AWS_PROFILE",
        ] {
            cmd.env_remove(var);
        }
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Run `check` with `request` on stdin.
    pub fn check(&self, request: &Value) -> Output {
        self.cmd()
            .arg("check")
            .write_stdin(request.to_string())
            .output()
            .expect("failed to run check")
    }

    /// Run `in` with `request` on stdin, targeting the test directory.
    pub fn get(&self, request: &Value) -> Output {
        self.cmd()
            .arg("in")
            .arg(self.dir.path())
            .write_stdin(request.to_string())
            .output()
            .expect("failed to run in")
    }

    /// Run `out` with `request` on stdin.
    pub fn put(&self, request: &Value) -> Output {
        self.cmd()
            .arg("out")
            .arg(self.dir.path())
            .write_stdin(request.to_string())
            .output()
            .expect("failed to run out")
    }

    /// Parsed contents of `vault.json` in the test directory.
    pub fn secrets_file(&self) -> Value {
        read_json(&self.dir.path().join("vault.json"))
    }

    pub fn has_secrets_file(&self) -> bool {
        self.dir.path().join("vault.json").exists()
    }
}

impl Default for Test {
    fn default() -> Self {
        Self::new()
    }
}

pub fn read_json(path: &Path) -> Value {
    let contents = std::fs::read(path).expect("failed to read json file");
    serde_json::from_slice(&contents).expect("file is not valid json")
}
