//! Wires the store, transport, session manager and gateway together.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use directories::ProjectDirs;
use tracing::debug;

use teamhub_client::config::{ENV_API_URL, ENV_TIMEOUT_SECS};
use teamhub_client::{ApiGateway, AuthTransport, ClientConfig, SessionManager};
use teamhub_store::FileCredentialStore;

use crate::cli::Globals;

/// Overrides the session file location.
pub const ENV_SESSION_FILE: &str = "TEAMHUB_SESSION_FILE";

/// Everything a networked command needs.
pub struct Context {
    pub auth: Arc<AuthTransport>,
    pub sessions: SessionManager,
    pub gateway: ApiGateway,
}

impl Globals {
    /// Client configuration from flags, falling back to the environment.
    pub fn config(&self) -> Result<ClientConfig> {
        let config = ClientConfig::from_lookup(|key| match key {
            ENV_API_URL => self.api_url.clone(),
            ENV_TIMEOUT_SECS => self.timeout.map(|secs| secs.to_string()),
            _ => std::env::var(key).ok(),
        })
        .context("Invalid configuration (set --api-url or TEAMHUB_API_URL)")?;

        debug!(api = %config.base_url, timeout = ?config.timeout, "Configured client");
        Ok(config)
    }

    /// The on-disk session store.
    pub fn store(&self) -> Result<FileCredentialStore> {
        Ok(FileCredentialStore::new(session_path()?))
    }

    /// Build the client stack and hydrate the stored session.
    pub fn connect(&self) -> Result<Context> {
        let config = self.config()?;
        let store = Arc::new(self.store()?);
        let auth = Arc::new(AuthTransport::new(&config).context("Failed to create HTTP client")?);
        let sessions = SessionManager::new(store, auth.clone(), config.session);
        sessions.init();
        let gateway =
            ApiGateway::new(&config, sessions.clone()).context("Failed to create HTTP client")?;

        Ok(Context {
            auth,
            sessions,
            gateway,
        })
    }
}

/// Get the session file path.
fn session_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(ENV_SESSION_FILE) {
        return Ok(PathBuf::from(path));
    }

    let dirs =
        ProjectDirs::from("", "", "teamhub").context("Could not determine data directory")?;
    Ok(dirs.data_dir().join("session.json"))
}
