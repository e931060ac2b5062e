//! Shared fixtures for the mock API tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::{Value, json};
use teamhub_client::{ApiGateway, AuthTransport, ClientConfig, SessionManager};
use teamhub_core::{
    AccessToken, ApiUrl, RefreshToken, SessionPolicy, StoredSession, UserSummary,
};
use teamhub_store::MemoryCredentialStore;
use wiremock::MockServer;

/// Client configuration pointing at the mock server.
pub fn mock_config(server: &MockServer) -> ClientConfig {
    // Plain HTTP is accepted for loopback addresses
    ClientConfig::new(ApiUrl::new(server.uri()).unwrap())
}

pub fn alice() -> UserSummary {
    UserSummary {
        id: "u-1".to_string(),
        first_name: "Alice".to_string(),
        last_name: "Liddell".to_string(),
        email: "alice@example.com".to_string(),
    }
}

/// A session holding `T1`/`R1`, issued just now.
pub fn fresh_session() -> StoredSession {
    let now = Utc::now();
    StoredSession {
        access_token: Some(AccessToken::new("T1")),
        refresh_token: Some(RefreshToken::new("R1")),
        user: Some(alice()),
        access_token_ttl_secs: Some(3600),
        access_token_issued_at: Some(now),
        refresh_token_expires_at: Some(now + Duration::days(7)),
    }
}

/// Body of a successful login or refresh.
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

pub struct Harness {
    pub store: Arc<MemoryCredentialStore>,
    pub sessions: SessionManager,
    pub gateway: ApiGateway,
}

pub fn harness(config: ClientConfig, session: StoredSession) -> Harness {
    let store = Arc::new(MemoryCredentialStore::with_session(session));
    let auth = Arc::new(AuthTransport::new(&config).unwrap());
    let sessions = SessionManager::new(store.clone(), auth, config.session);
    let gateway = ApiGateway::new(&config, sessions.clone()).unwrap();
    Harness {
        store,
        sessions,
        gateway,
    }
}

/// Harness signed in as alice with `T1`/`R1` and default settings.
pub fn signed_in(server: &MockServer) -> Harness {
    harness(mock_config(server), fresh_session())
}

pub fn proactive_policy() -> SessionPolicy {
    SessionPolicy {
        proactive_refresh: true,
        ..SessionPolicy::default()
    }
}
