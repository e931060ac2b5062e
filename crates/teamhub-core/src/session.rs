//! Persisted session state and token-freshness arithmetic.

use chrono::{DateTime, Duration, Utc};

use crate::tokens::{AccessToken, RefreshToken};
use crate::types::UserSummary;

/// Tokens and identity returned by a successful login or refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    /// Access-token lifetime in seconds, as declared by the server.
    pub expires_in: i64,
    /// Absolute refresh-token expiry, when the server supplies one.
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
    pub user: UserSummary,
}

/// Timing rules applied to stored sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// How long before true expiry an access token counts as stale.
    pub stale_margin: Duration,
    /// Refresh-token lifetime assumed when the server does not declare one.
    pub default_refresh_lifetime: Duration,
    /// Refresh stale access tokens before sending a request.
    pub proactive_refresh: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            stale_margin: Duration::minutes(5),
            default_refresh_lifetime: Duration::days(7),
            proactive_refresh: false,
        }
    }
}

/// Everything the credential store persists.
///
/// Every field is optional: a store returns whatever subset it holds.
/// Tokens are always written and cleared together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredSession {
    pub access_token: Option<AccessToken>,
    pub refresh_token: Option<RefreshToken>,
    pub user: Option<UserSummary>,
    pub access_token_ttl_secs: Option<i64>,
    pub access_token_issued_at: Option<DateTime<Utc>>,
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
}

impl StoredSession {
    /// Build a complete session from a grant obtained at `now`.
    pub fn from_grant(grant: &TokenGrant, now: DateTime<Utc>, policy: &SessionPolicy) -> Self {
        let refresh_token_expires_at = grant
            .refresh_token_expires_at
            .unwrap_or(now + policy.default_refresh_lifetime);

        Self {
            access_token: Some(grant.access_token.clone()),
            refresh_token: Some(grant.refresh_token.clone()),
            user: Some(grant.user.clone()),
            access_token_ttl_secs: Some(grant.expires_in),
            access_token_issued_at: Some(now),
            refresh_token_expires_at: Some(refresh_token_expires_at),
        }
    }

    /// Returns a copy with only the user snapshot replaced.
    pub fn with_user(mut self, user: UserSummary) -> Self {
        self.user = Some(user);
        self
    }

    /// True iff both tokens are present.
    pub fn has_tokens(&self) -> bool {
        self.access_token.is_some() && self.refresh_token.is_some()
    }

    /// True if the refresh token is past its expiry.
    ///
    /// An unknown expiry counts as expired.
    pub fn is_refresh_token_expired(&self, now: DateTime<Utc>) -> bool {
        match self.refresh_token_expires_at {
            Some(expires_at) => now >= expires_at,
            None => true,
        }
    }

    /// True iff both tokens are present and the refresh token is still valid.
    pub fn is_authenticated(&self, now: DateTime<Utc>) -> bool {
        self.has_tokens() && !self.is_refresh_token_expired(now)
    }

    /// When the access token expires, if issue time and lifetime are known.
    ///
    /// A lifetime that overflows the calendar is treated as unknown.
    pub fn access_token_expires_at(&self) -> Option<DateTime<Utc>> {
        let issued_at = self.access_token_issued_at?;
        let ttl = Duration::try_seconds(self.access_token_ttl_secs?)?;
        issued_at.checked_add_signed(ttl)
    }

    /// True if the access token is unknown-age or within `margin` of expiry.
    pub fn is_access_token_stale(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.access_token_expires_at()
            .and_then(|expires_at| expires_at.checked_sub_signed(margin))
            .is_none_or(|stale_at| now >= stale_at)
    }
}
