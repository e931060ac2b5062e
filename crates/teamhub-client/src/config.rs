//! Client configuration.

use std::time::Duration;

use teamhub_core::error::{Error, InvalidInputError};
use teamhub_core::{ApiUrl, Result, SessionPolicy};

/// Environment variable holding the API base URL.
pub const ENV_API_URL: &str = "TEAMHUB_API_URL";
/// Environment variable holding the request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "TEAMHUB_TIMEOUT_SECS";
/// Environment variable enabling proactive refresh (`true`/`false`).
pub const ENV_PROACTIVE_REFRESH: &str = "TEAMHUB_PROACTIVE_REFRESH";

/// Per-request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for the HTTP side of the client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every endpoint path is joined to.
    pub base_url: ApiUrl,
    /// Client-side timeout for each request.
    pub timeout: Duration,
    pub user_agent: String,
    /// Session timing rules.
    pub session: SessionPolicy,
}

impl ClientConfig {
    /// Configuration with defaults for everything but the base URL.
    pub fn new(base_url: ApiUrl) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("teamhub-client/", env!("CARGO_PKG_VERSION")).to_string(),
            session: SessionPolicy::default(),
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the session policy.
    pub fn with_session_policy(mut self, policy: SessionPolicy) -> Self {
        self.session = policy;
        self
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup(ENV_API_URL).ok_or_else(|| InvalidInputError::Config {
            key: ENV_API_URL.to_string(),
            value: String::new(),
            reason: "must be set".to_string(),
        })?;
        let mut config = Self::new(ApiUrl::new(&base_url)?);

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| config_error(ENV_TIMEOUT_SECS, &raw, "expected whole seconds"))?;
            if secs == 0 {
                return Err(config_error(ENV_TIMEOUT_SECS, &raw, "must be positive"));
            }
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup(ENV_PROACTIVE_REFRESH) {
            config.session.proactive_refresh = parse_bool(&raw).ok_or_else(|| {
                config_error(ENV_PROACTIVE_REFRESH, &raw, "expected true or false")
            })?;
        }

        Ok(config)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn config_error(key: &str, value: &str, reason: &str) -> Error {
    Error::InvalidInput(InvalidInputError::Config {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    })
}
