//! CLI integration tests against a mock API.
//!
//! The binary runs as a child process; wiremock serves from its own thread,
//! so blocking on the child here is fine.

mod common;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{grant_body, read_session, run_cli, run_cli_success, session_file};

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/Auth/login"))
        .and(body_json(json!({
            "emailOrUsername": "alice",
            "password": "Secret123!"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(grant_body("T1", "R1")))
        .mount(server)
        .await;
}

fn login(file: &std::path::Path, api: &str) {
    run_cli_success(
        &[
            "auth",
            "login",
            "--identifier",
            "alice",
            "--password",
            "Secret123!",
        ],
        file,
        api,
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_whoami_logout() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let dir = TempDir::new().unwrap();
    let file = session_file(&dir);

    login(&file, &server.uri());
    let stored = read_session(&file);
    assert_eq!(stored["accessToken"], "T1");
    assert_eq!(stored["refreshToken"], "R1");
    assert_eq!(stored["accessTokenTtlSeconds"], 3600);

    let stdout = run_cli_success(&["auth", "whoami"], &file, &server.uri());
    assert!(stdout.contains("alice@example.com"));
    assert!(stdout.contains("Alice Liddell"));

    run_cli_success(&["auth", "logout"], &file, &server.uri());
    assert!(!file.exists());

    let output = run_cli(&["auth", "whoami"], &file, &server.uri());
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No active session"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_api_get_refreshes_and_persists_new_tokens() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/Projects"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Projects"))
        .and(query_param("page", "2"))
        .and(header("authorization", "Bearer T2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "name": "Apollo" }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/Auth/refresh"))
        .and(header("authorization", "Bearer T1"))
        .and(body_json(json!({ "refreshToken": "R1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(grant_body("T2", "R2")))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let file = session_file(&dir);
    login(&file, &server.uri());

    let stdout = run_cli_success(
        &["api", "get", "/Projects", "--query", "page=2"],
        &file,
        &server.uri(),
    );
    assert!(stdout.contains("Apollo"));

    let stored = read_session(&file);
    assert_eq!(stored["accessToken"], "T2");
    assert_eq!(stored["refreshToken"], "R2");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_refresh_signs_out() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/Projects"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/Auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let file = session_file(&dir);
    login(&file, &server.uri());

    let output = run_cli(&["api", "get", "/Projects"], &file, &server.uri());
    assert!(!output.status.success());
    assert!(!file.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_api_post_sends_body() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/Projects"))
        .and(header("authorization", "Bearer T1"))
        .and(body_json(json!({ "name": "Apollo" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 7 })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let file = session_file(&dir);
    login(&file, &server.uri());

    let stdout = run_cli_success(
        &["api", "post", "/Projects", "--data", r#"{"name":"Apollo"}"#],
        &file,
        &server.uri(),
    );
    assert!(stdout.contains("\"id\":7"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_register_prints_field_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/Auth/register"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "DuplicateEmail",
            "message": "Email is already registered."
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = run_cli(
        &[
            "auth",
            "register",
            "--email",
            "alice@example.com",
            "--password",
            "Secret123!",
            "--first-name",
            "Alice",
            "--last-name",
            "Liddell",
            "--user-name",
            "alice",
        ],
        &session_file(&dir),
        &server.uri(),
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("email: Email is already registered."));
}

#[test]
fn test_missing_api_url_is_reported() {
    let dir = TempDir::new().unwrap();
    let mut cmd = std::process::Command::new(env!("CARGO_BIN_EXE_teamhub"));
    cmd.args(["api", "get", "/Projects"])
        .env("TEAMHUB_SESSION_FILE", session_file(&dir))
        .env_remove("TEAMHUB_API_URL");
    let output = cmd.output().unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("TEAMHUB_API_URL"));
}

#[test]
fn test_logout_without_session_succeeds() {
    let dir = TempDir::new().unwrap();
    run_cli_success(&["auth", "logout"], &session_file(&dir), "http://127.0.0.1:1");
}
