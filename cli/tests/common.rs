//! # StackAI CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//!
//! ## Overview
//!
//! Shared helpers for the integration tests. Every test file in `cli/tests/` is
//! its own crate, so each one declares `mod common;` to pull these in.
//!
//! The binary reads configuration from the user's config directory, from any
//! `.stackai.toml` above the working directory, and from `OPENAI_API_KEY`. A
//! `Sandbox` points all three at a temporary directory so the host machine's
//! setup never leaks into a test.
//!

// Different test files use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Creates an `assert_cmd::Command` for the compiled `stackai` binary.
///
/// ## Panics
/// Panics if the binary cannot be found via `Command::cargo_bin`.
pub fn stackai_cmd() -> Command {
    Command::cargo_bin("stackai").expect("Failed to find stackai binary for testing")
}

/// An isolated home, config directory and working directory for one test.
pub struct Sandbox {
    pub dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create sandbox dir");
        // Stops the upward search for `.stackai.toml` at the sandbox root.
        fs::create_dir(dir.path().join(".git")).expect("Failed to create .git marker");
        Sandbox { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// A `stackai` command running inside the sandbox with no API key in scope.
    pub fn cmd(&self) -> Command {
        let mut cmd = stackai_cmd();
        cmd.current_dir(self.path())
            .env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join(".config"))
            .env_remove("OPENAI_API_KEY")
            .env_remove("STACKAI_CONFIG")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Writes `.stackai.toml` at the sandbox root.
    pub fn write_project_config(&self, contents: &str) {
        fs::write(self.path().join(".stackai.toml"), contents)
            .expect("Failed to write project config");
    }

    /// Writes a config file with an arbitrary name and returns its path.
    pub fn write_file(&self, name: &str, contents: &str) -> std::path::PathBuf {
        let path = self.path().join(name);
        fs::write(&path, contents).expect("Failed to write config file");
        path
    }
}

/// Parses the relay's stdout as a single JSON object.
pub fn parse_envelope(stdout: &[u8]) -> serde_json::Map<String, serde_json::Value> {
    let text = std::str::from_utf8(stdout).expect("stdout is not UTF-8");
    match serde_json::from_str(text) {
        Ok(serde_json::Value::Object(map)) => map,
        other => panic!("stdout is not a JSON object: {:?} (raw: {:?})", other, text),
    }
}

/// Runs the relay in `sandbox` with `stdin` and returns the parsed envelope.
pub fn relay(sandbox: &Sandbox, stdin: &str) -> serde_json::Map<String, serde_json::Value> {
    let output = sandbox
        .cmd()
        .write_stdin(stdin.to_string())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    parse_envelope(&output)
}

pub const GREETING_REPLY: &str = "Hi! I'm StackAI (fallback). Ask me about stocks or trading.";
pub const PRICE_REPLY: &str = "I can fetch stock prices from the site. Use the Get Price button to view the latest chart and price for a symbol like AAPL.";
pub const GENERIC_REPLY: &str =
    "Sorry, the AI model isn't available. This is a lightweight fallback reply.";
pub const EMPTY_PROMPT_REPLY: &str = "Please say something.";
