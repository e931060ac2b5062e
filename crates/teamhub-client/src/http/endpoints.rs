//! Credential-issuance endpoints and their request/response types.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use teamhub_core::{AccessToken, RefreshToken, TokenGrant, UserSummary};

// ============================================================================
// Endpoint Paths
// ============================================================================

pub const LOGIN: &str = "/Auth/login";
pub const REGISTER: &str = "/Auth/register";
pub const REFRESH: &str = "/Auth/refresh";
pub const FORGOT_PASSWORD: &str = "/Auth/forgot-password";
pub const RESET_PASSWORD: &str = "/Auth/reset-password";
pub const RESEND_CONFIRMATION_CODE: &str = "/Auth/resend-confirmation-code";
pub const CONFIRM_EMAIL: &str = "/Auth/confirm-email";

const AUTH_ENDPOINTS: &[&str] = &[
    LOGIN,
    REGISTER,
    REFRESH,
    FORGOT_PASSWORD,
    RESET_PASSWORD,
    RESEND_CONFIRMATION_CODE,
    CONFIRM_EMAIL,
];

/// True for credential-issuance paths, which never carry a bearer token
/// and never trigger a refresh.
pub fn is_auth_endpoint(path: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let path = path.trim_end_matches('/');
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    AUTH_ENDPOINTS
        .iter()
        .any(|endpoint| endpoint.eq_ignore_ascii_case(&path))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub email_or_username: &'a str,
    pub password: &'a str,
}

/// Request body for register.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub user_name: &'a str,
}

/// Request body for forgot-password and resend-confirmation-code.
#[derive(Debug, Serialize)]
pub struct EmailRequest<'a> {
    pub email: &'a str,
}

/// Request body for reset-password.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest<'a> {
    pub token: &'a str,
    pub id: &'a str,
    pub new_password: &'a str,
}

/// Request body for confirm-email.
#[derive(Debug, Serialize)]
pub struct ConfirmEmailRequest<'a> {
    pub id: &'a str,
    pub code: &'a str,
}

/// Request body for refresh. The access token travels as the bearer header.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Response from login and refresh.
///
/// Refresh answers may omit the user fields; they then map to an empty
/// [`UserSummary`] and the session keeps its cached user.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    pub token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token_expiry_date: Option<String>,
}

impl From<GrantResponse> for TokenGrant {
    fn from(response: GrantResponse) -> Self {
        let refresh_token_expires_at = response
            .refresh_token_expiry_date
            .as_deref()
            .and_then(parse_server_timestamp);

        TokenGrant {
            access_token: AccessToken::new(response.token),
            refresh_token: RefreshToken::new(response.refresh_token),
            expires_in: response.expires_in,
            refresh_token_expires_at,
            user: UserSummary {
                id: response.id,
                first_name: response.first_name,
                last_name: response.last_name,
                email: response.email,
            },
        }
    }
}

/// Parse a server timestamp; offset-less values are taken as UTC.
fn parse_server_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => Some(naive.and_utc()),
        Err(e) => {
            warn!(value = raw, error = %e, "Ignoring unparsable refresh token expiry");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn auth_endpoints_are_recognized() {
        assert!(is_auth_endpoint("/Auth/login"));
        assert!(is_auth_endpoint("/auth/LOGIN"));
        assert!(is_auth_endpoint("Auth/refresh"));
        assert!(is_auth_endpoint("/Auth/forgot-password?source=web"));
        assert!(!is_auth_endpoint("/Auth/me"));
        assert!(!is_auth_endpoint("/Projects"));
    }

    #[test]
    fn grant_response_maps_to_grant() {
        let response: GrantResponse = serde_json::from_value(serde_json::json!({
            "id": "u-1",
            "firstName": "Alice",
            "lastName": "Liddell",
            "email": "alice@example.com",
            "token": "T1",
            "refreshToken": "R1",
            "expiresIn": 3600,
            "refreshTokenExpiryDate": "2026-10-23T12:00:00Z"
        }))
        .unwrap();

        let grant = TokenGrant::from(response);
        assert_eq!(grant.access_token, AccessToken::new("T1"));
        assert_eq!(grant.expires_in, 3600);
        assert_eq!(grant.user.first_name, "Alice");
        assert_eq!(
            grant.refresh_token_expires_at,
            Some(Utc.with_ymd_and_hms(2026, 10, 23, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn offsetless_timestamps_are_utc() {
        assert_eq!(
            parse_server_timestamp("2026-10-23T12:00:00.1234567"),
            Some(
                Utc.with_ymd_and_hms(2026, 10, 23, 12, 0, 0).unwrap()
                    + chrono::Duration::nanoseconds(123_456_700)
            )
        );
        assert_eq!(parse_server_timestamp("soon"), None);
    }
}
