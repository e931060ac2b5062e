#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{Value, json};

/// Run the CLI against `api_url` with an isolated session file.
pub fn run_cli(args: &[&str], session_file: &Path, api_url: &str) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_teamhub"));
    cmd.args(args);
    cmd.env("TEAMHUB_SESSION_FILE", session_file);
    cmd.env("TEAMHUB_API_URL", api_url);
    cmd.env_remove("TEAMHUB_TIMEOUT_SECS");
    cmd.env_remove("TEAMHUB_PROACTIVE_REFRESH");
    cmd.env("NO_COLOR", "1");
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI and expect success, returning stdout.
pub fn run_cli_success(args: &[&str], session_file: &Path, api_url: &str) -> String {
    let output = run_cli(args, session_file, api_url);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn session_file(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("session.json")
}

pub fn read_session(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

pub fn grant_body(token: &str, refresh_token: &str) -> Value {
    json!({
        "id": "u-1",
        "firstName": "Alice",
        "lastName": "Liddell",
        "email": "alice@example.com",
        "token": token,
        "refreshToken": refresh_token,
        "expiresIn": 3600
    })
}
