//! Credential-issuance endpoints.

use async_trait::async_trait;

use crate::session::TokenGrant;
use crate::{AccessToken, Credentials, RefreshToken, Registration, Result};

/// Unauthenticated calls that issue or recover credentials.
///
/// Implementations never attach the session's bearer token on their own
/// and never enter the refresh protocol, so they stay usable before any
/// session exists.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for a token grant.
    async fn login(&self, credentials: &Credentials) -> Result<TokenGrant>;

    /// Create an account.
    async fn register(&self, registration: &Registration) -> Result<()>;

    /// Send a password-reset link to `email`.
    async fn request_password_reset(&self, email: &str) -> Result<()>;

    /// Set a new password using a reset token.
    async fn reset_password(&self, token: &str, user_id: &str, new_password: &str) -> Result<()>;

    /// Send a fresh email confirmation code.
    async fn resend_confirmation_code(&self, email: &str) -> Result<()>;

    /// Confirm an email address.
    async fn confirm_email(&self, user_id: &str, code: &str) -> Result<()>;

    /// Trade the current token pair for a new one.
    async fn exchange_refresh_token(
        &self,
        access_token: &AccessToken,
        refresh_token: &RefreshToken,
    ) -> Result<TokenGrant>;
}
