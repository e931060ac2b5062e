//! Unauthenticated credential-issuance calls.

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use teamhub_core::traits::AuthApi;
use teamhub_core::{AccessToken, Credentials, RefreshToken, Registration, Result, TokenGrant};

use crate::config::ClientConfig;
use crate::http::HttpClient;
use crate::http::endpoints::{
    self, ConfirmEmailRequest, EmailRequest, GrantResponse, LoginRequest, RefreshRequest,
    RegisterRequest, ResetPasswordRequest,
};

/// Stateless client for the `/Auth/*` endpoints.
///
/// Never reads the credential store. The only call that carries a bearer
/// token is the refresh exchange, and only because the caller hands it one.
#[derive(Debug, Clone)]
pub struct AuthTransport {
    http: HttpClient,
}

impl AuthTransport {
    /// Create a transport for the configured API.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(config)?,
        })
    }
}

#[async_trait]
impl AuthApi for AuthTransport {
    #[instrument(skip(self, credentials), fields(api = %self.http.base()))]
    async fn login(&self, credentials: &Credentials) -> Result<TokenGrant> {
        info!("Logging in");
        let request = LoginRequest {
            email_or_username: credentials.email_or_username(),
            password: credentials.password(),
        };
        let response: GrantResponse = self.http.post_json(endpoints::LOGIN, &request, None).await?;
        debug!(user_id = %response.id, "Login accepted");
        Ok(response.into())
    }

    #[instrument(skip(self, registration), fields(api = %self.http.base()))]
    async fn register(&self, registration: &Registration) -> Result<()> {
        info!("Registering account");
        let request = RegisterRequest {
            email: &registration.email,
            password: &registration.password,
            first_name: &registration.first_name,
            last_name: &registration.last_name,
            user_name: &registration.user_name,
        };
        self.http.post_no_content(endpoints::REGISTER, &request).await
    }

    #[instrument(skip(self, email))]
    async fn request_password_reset(&self, email: &str) -> Result<()> {
        self.http
            .post_no_content(endpoints::FORGOT_PASSWORD, &EmailRequest { email })
            .await
    }

    #[instrument(skip(self, token, new_password))]
    async fn reset_password(&self, token: &str, user_id: &str, new_password: &str) -> Result<()> {
        let request = ResetPasswordRequest {
            token,
            id: user_id,
            new_password,
        };
        self.http
            .post_no_content(endpoints::RESET_PASSWORD, &request)
            .await
    }

    #[instrument(skip(self, email))]
    async fn resend_confirmation_code(&self, email: &str) -> Result<()> {
        self.http
            .post_no_content(endpoints::RESEND_CONFIRMATION_CODE, &EmailRequest { email })
            .await
    }

    #[instrument(skip(self, code))]
    async fn confirm_email(&self, user_id: &str, code: &str) -> Result<()> {
        let request = ConfirmEmailRequest { id: user_id, code };
        self.http
            .post_no_content(endpoints::CONFIRM_EMAIL, &request)
            .await
    }

    #[instrument(skip_all, fields(api = %self.http.base()))]
    async fn exchange_refresh_token(
        &self,
        access_token: &AccessToken,
        refresh_token: &RefreshToken,
    ) -> Result<TokenGrant> {
        debug!("Exchanging refresh token");
        let request = RefreshRequest {
            refresh_token: refresh_token.as_str(),
        };
        let response: GrantResponse = self
            .http
            .post_json(endpoints::REFRESH, &request, Some(access_token))
            .await?;
        Ok(response.into())
    }
}
