//! HTTP client implementation.

use std::time::Duration;

use reqwest::Method;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, instrument, trace};

use teamhub_core::error::{ApiError, Error, TransportError};
use teamhub_core::{AccessToken, ApiUrl, Result};

use crate::config::ClientConfig;

/// A successful (2xx) response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: u16,
    body: Vec<u8>,
}

impl ApiResponse {
    pub(crate) fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Raw response body.
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Response body as text, lossily decoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Returns true if the body is empty (e.g. 204 No Content).
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Decode the body as JSON.
    pub fn json<R: DeserializeOwned>(&self) -> Result<R> {
        serde_json::from_slice(&self.body).map_err(|e| {
            Error::Transport(TransportError::Decode {
                message: e.to_string(),
            })
        })
    }
}

/// HTTP client bound to the API base URL.
///
/// Carries no session state: callers pass the bearer token per request.
#[derive(Debug, Clone)]
pub(crate) struct HttpClient {
    client: reqwest::Client,
    base: ApiUrl,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new client for the configured API.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::Http {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base: config.base_url.clone(),
            timeout: config.timeout,
        })
    }

    /// Returns the API URL this client is configured for.
    pub fn base(&self) -> &ApiUrl {
        &self.base
    }

    /// Send a request and return the 2xx response, or the server's error.
    #[instrument(skip(self, body, bearer), fields(api = %self.base))]
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
        bearer: Option<&AccessToken>,
    ) -> Result<ApiResponse> {
        let url = self.base.endpoint(path);
        debug!(%method, %url, authenticated = bearer.is_some(), "HTTP request");

        let mut request = self.client.request(method, &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(token) = bearer {
            request = request.bearer_auth(token.as_str());
        }

        let response = request.send().await.map_err(|e| self.map_transport(e))?;
        self.handle_response(response).await
    }

    /// POST a JSON body and decode a JSON answer.
    pub async fn post_json<B, R>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&AccessToken>,
    ) -> Result<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let body = to_value(body)?;
        self.send(Method::POST, path, &[], Some(&body), bearer)
            .await?
            .json()
    }

    /// POST a JSON body to an endpoint that answers with no content.
    pub async fn post_no_content<B>(&self, path: &str, body: &B) -> Result<()>
    where
        B: Serialize,
    {
        let body = to_value(body)?;
        self.send(Method::POST, path, &[], Some(&body), None)
            .await
            .map(|_| ())
    }

    fn map_transport(&self, err: reqwest::Error) -> Error {
        let err = if err.is_timeout() {
            TransportError::Timeout {
                duration_ms: self.timeout.as_millis() as u64,
            }
        } else if err.is_connect() {
            TransportError::Connection {
                message: err.to_string(),
            }
        } else if err.is_decode() {
            TransportError::Decode {
                message: err.to_string(),
            }
        } else {
            TransportError::Http {
                message: err.to_string(),
            }
        };
        Error::Transport(err)
    }

    /// Handle a response, collecting the body or parsing the error.
    async fn handle_response(&self, response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status();
        trace!(status = %status, "HTTP response");

        let body = response.bytes().await.map_err(|e| self.map_transport(e))?;

        if status.is_success() {
            Ok(ApiResponse::new(status.as_u16(), body.to_vec()))
        } else {
            Err(Error::Api(parse_error_body(status.as_u16(), &body)))
        }
    }
}

fn to_value<B: Serialize>(body: &B) -> Result<Value> {
    serde_json::to_value(body).map_err(|e| {
        Error::Transport(TransportError::Http {
            message: format!("could not encode request body: {}", e),
        })
    })
}

/// Parse an error body; non-JSON bodies yield a bare status error.
fn parse_error_body(status: u16, body: &[u8]) -> ApiError {
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => ApiError::from_body(status, &value),
        Err(_) => ApiError::new(status),
    }
}
