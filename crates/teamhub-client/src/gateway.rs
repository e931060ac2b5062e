//! Authenticated request pipeline with 401 recovery.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use reqwest::Method;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use teamhub_core::error::{Error, InvalidInputError, SessionError};
use teamhub_core::{AccessToken, Result};

use crate::config::ClientConfig;
use crate::http::{ApiResponse, HttpClient, is_auth_endpoint};
use crate::session::{SessionManager, SignOutReason};

type SharedCycle = Shared<BoxFuture<'static, std::result::Result<AccessToken, SessionError>>>;

/// A request the gateway can send, and send again after a refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set the JSON body.
    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body).map_err(|e| InvalidInputError::Other {
            message: format!("could not encode request body: {}", e),
        })?;
        self.body = Some(value);
        Ok(self)
    }

    /// Set an already-encoded JSON body.
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// True once the request has been replayed after a refresh.
    pub fn is_retried(&self) -> bool {
        self.retried
    }
}

/// What a request that got a 401 does next.
enum Recovery {
    /// The token was rotated since the request went out.
    Replay(Option<AccessToken>),
    /// Await a refresh cycle; the leader started it.
    Await { cycle: SharedCycle, leader: bool },
}

/// Entry point for authenticated API calls.
///
/// Every request carries the current access token. A 401 triggers one
/// refresh cycle shared by every request that fails while it runs; each
/// of them is then replayed once with the new token. Credential-issuance
/// endpoints skip all of this.
#[derive(Clone)]
pub struct ApiGateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    http: HttpClient,
    sessions: SessionManager,
    cycle: Mutex<Option<SharedCycle>>,
}

impl ApiGateway {
    /// Create a gateway for the configured API.
    pub fn new(config: &ClientConfig, sessions: SessionManager) -> Result<Self> {
        Ok(Self {
            inner: Arc::new(GatewayInner {
                http: HttpClient::new(config)?,
                sessions,
                cycle: Mutex::new(None),
            }),
        })
    }

    /// The session manager this gateway refreshes through.
    pub fn sessions(&self) -> &SessionManager {
        &self.inner.sessions
    }

    /// True while a refresh cycle or exchange is running.
    pub fn is_refreshing(&self) -> bool {
        self.inner.lock_cycle().is_some() || self.inner.sessions.is_refreshing()
    }

    /// Send a request and return its 2xx response.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        if is_auth_endpoint(&request.path) {
            return self.inner.dispatch(&request, None).await;
        }

        self.refresh_if_stale().await;

        let token = self.inner.sessions.access_token();
        match self.inner.dispatch(&request, token.as_ref()).await {
            Err(err) if err.is_unauthorized() && !request.retried => {
                request.retried = true;
                self.recover(request, token, err).await
            }
            outcome => outcome,
        }
    }

    /// Send a request and decode its JSON response.
    pub async fn execute<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R> {
        self.send(request).await?.json()
    }

    /// Send a request whose response body is ignored.
    pub async fn execute_empty(&self, request: ApiRequest) -> Result<()> {
        self.send(request).await.map(|_| ())
    }

    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        self.execute(ApiRequest::get(path)).await
    }

    pub async fn post<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R> {
        self.execute(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R> {
        self.execute(ApiRequest::put(path).json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute_empty(ApiRequest::delete(path)).await
    }

    /// Refresh ahead of expiry when the policy asks for it.
    ///
    /// Failures are logged and the request goes out with the current token.
    async fn refresh_if_stale(&self) {
        let sessions = &self.inner.sessions;
        if !sessions.policy().proactive_refresh
            || !sessions.is_authenticated()
            || !sessions.is_access_token_stale()
        {
            return;
        }

        debug!("Access token is stale, refreshing before sending");
        if let Err(e) = sessions.refresh().await {
            warn!(error = %e, "Proactive refresh failed");
        }
    }

    async fn recover(
        &self,
        request: ApiRequest,
        sent_with: Option<AccessToken>,
        original: Error,
    ) -> Result<ApiResponse> {
        let recovery = {
            let mut slot = self.inner.lock_cycle();
            match slot.as_ref() {
                Some(cycle) => Recovery::Await {
                    cycle: cycle.clone(),
                    leader: false,
                },
                None => {
                    let current = self.inner.sessions.access_token();
                    if current.is_some() && current != sent_with {
                        Recovery::Replay(current)
                    } else {
                        let task =
                            tokio::spawn(GatewayInner::refresh_cycle(Arc::clone(&self.inner)));
                        let cycle = task
                            .map(|joined| joined.unwrap_or(Err(SessionError::Aborted)))
                            .boxed()
                            .shared();
                        *slot = Some(cycle.clone());
                        Recovery::Await {
                            cycle,
                            leader: true,
                        }
                    }
                }
            }
        };

        match recovery {
            Recovery::Replay(token) => {
                debug!("Access token was rotated meanwhile, replaying");
                self.inner.dispatch(&request, token.as_ref()).await
            }
            Recovery::Await { cycle, leader } => {
                if !leader {
                    debug!("Waiting for running refresh");
                }
                match cycle.await {
                    Ok(token) => {
                        debug!("Replaying with refreshed token");
                        self.inner.dispatch(&request, Some(&token)).await
                    }
                    Err(_) if leader => Err(original),
                    Err(cause) => Err(Error::Session(cause)),
                }
            }
        }
    }
}

impl fmt::Debug for ApiGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiGateway")
            .field("api", self.inner.http.base())
            .field("sessions", &self.inner.sessions)
            .finish_non_exhaustive()
    }
}

impl GatewayInner {
    fn lock_cycle(&self) -> MutexGuard<'_, Option<SharedCycle>> {
        self.cycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        bearer: Option<&AccessToken>,
    ) -> Result<ApiResponse> {
        self.http
            .send(
                request.method.clone(),
                &request.path,
                &request.query,
                request.body.as_ref(),
                bearer,
            )
            .await
    }

    /// Run one cycle, then return to idle so later 401s start a new one.
    ///
    /// Runs on its own task, so a cancelled leader never strands the slot.
    async fn refresh_cycle(self: Arc<Self>) -> std::result::Result<AccessToken, SessionError> {
        let result = self.run_cycle().await;
        self.lock_cycle().take();
        result
    }

    async fn run_cycle(&self) -> std::result::Result<AccessToken, SessionError> {
        let session = self.sessions.store().read();
        let outcome = if session.refresh_token.is_none()
            || session.is_refresh_token_expired(Utc::now())
        {
            Err(SessionError::RefreshTokenExpired)
        } else {
            self.sessions.refresh().await.map(|grant| grant.access_token)
        };

        if let Err(cause) = &outcome {
            warn!(error = %cause, "Session could not be refreshed");
            self.sessions.sign_out(SignOutReason::from(cause));
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_builder() {
        let request = ApiRequest::get("/Projects")
            .query("page", "2")
            .query("size", "20");

        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.path(), "/Projects");
        assert_eq!(request.query.len(), 2);
        assert!(!request.is_retried());
    }

    #[test]
    fn json_body_is_encoded_once() {
        let request = ApiRequest::post("/Projects")
            .json(&json!({ "name": "Apollo" }))
            .unwrap();
        assert_eq!(request.body, Some(json!({ "name": "Apollo" })));
    }
}
