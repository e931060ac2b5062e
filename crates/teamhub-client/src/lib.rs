//! teamhub-client - HTTP side of the teamhub API client.
//!
//! - [`AuthTransport`] calls the unauthenticated `/Auth/*` endpoints.
//! - [`SessionManager`] owns the stored session and runs at most one
//!   refresh exchange at a time.
//! - [`ApiGateway`] sends authenticated requests and recovers from 401s by
//!   refreshing once and replaying every request that was waiting.
//!
//! ```no_run
//! use std::sync::Arc;
//! use teamhub_client::{ApiGateway, AuthTransport, ClientConfig, SessionManager};
//! use teamhub_core::{ApiUrl, Credentials, CredentialStore};
//!
//! # async fn example(store: Arc<dyn CredentialStore>) -> teamhub_core::Result<()> {
//! let config = ClientConfig::new(ApiUrl::new("https://api.teamhub.example")?);
//! let auth = Arc::new(AuthTransport::new(&config)?);
//! let sessions = SessionManager::new(store, auth, config.session);
//! let gateway = ApiGateway::new(&config, sessions.clone())?;
//!
//! sessions.login(&Credentials::new("alice", "Secret123!")).await?;
//! let _projects: serde_json::Value = gateway.get("/Projects").await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
mod gateway;
mod http;
mod session;
mod transport;

pub use config::ClientConfig;
pub use gateway::{ApiGateway, ApiRequest};
pub use http::{ApiResponse, is_auth_endpoint};
pub use reqwest::Method;
pub use session::{SessionEvent, SessionManager, SignOutReason};
pub use transport::AuthTransport;
