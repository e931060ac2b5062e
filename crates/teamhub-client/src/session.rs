//! Session lifecycle and the single-flight refresh exchange.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use teamhub_core::error::{Error, SessionError};
use teamhub_core::traits::{AuthApi, CredentialStore};
use teamhub_core::{
    AccessToken, Credentials, Result, SessionPolicy, StoredSession, TokenGrant, UserSummary,
};

type SharedRefresh = Shared<BoxFuture<'static, std::result::Result<TokenGrant, SessionError>>>;

const EVENT_CAPACITY: usize = 16;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutReason {
    /// The user logged out.
    Logout,
    /// The refresh token was missing an expiry or past it.
    RefreshTokenExpired,
    /// The server rejected the refresh exchange, or it never completed.
    RefreshFailed,
    /// A refresh was needed but no tokens were stored.
    NoCredentials,
}

impl From<&SessionError> for SignOutReason {
    fn from(err: &SessionError) -> Self {
        match err {
            SessionError::NoCredentials => SignOutReason::NoCredentials,
            SessionError::RefreshTokenExpired => SignOutReason::RefreshTokenExpired,
            _ => SignOutReason::RefreshFailed,
        }
    }
}

/// Session state changes, for invalidating caches that depend on the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn { user_id: String },
    Refreshed,
    UserUpdated,
    SignedOut { reason: SignOutReason },
}

/// Owns the stored session and the refresh-token exchange.
///
/// At most one exchange runs at a time. Callers that ask for a refresh
/// while one is running await the same shared future and see its result,
/// success or failure. Cloning is cheap and every clone shares that state.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    store: Arc<dyn CredentialStore>,
    auth: Arc<dyn AuthApi>,
    policy: SessionPolicy,
    in_flight: Mutex<Option<SharedRefresh>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    /// Create a manager over `store`, using `auth` for logins and exchanges.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        auth: Arc<dyn AuthApi>,
        policy: SessionPolicy,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(ManagerInner {
                store,
                auth,
                policy,
                in_flight: Mutex::new(None),
                events,
            }),
        }
    }

    /// Hydrate from the store at startup.
    ///
    /// A stored session whose refresh token has expired is cleared. Returns
    /// the cached user when the remaining session is authenticated.
    #[instrument(skip(self))]
    pub fn init(&self) -> Option<UserSummary> {
        let session = self.inner.store.read();
        let now = Utc::now();

        if session.has_tokens() && session.is_refresh_token_expired(now) {
            info!("Stored refresh token has expired");
            self.sign_out(SignOutReason::RefreshTokenExpired);
            return None;
        }

        if session.is_authenticated(now) {
            debug!("Restored session");
            session.user
        } else {
            None
        }
    }

    /// Log in and store the resulting session.
    #[instrument(skip(self, credentials))]
    pub async fn login(&self, credentials: &Credentials) -> Result<UserSummary> {
        let grant = self.inner.auth.login(credentials).await?;
        let session = StoredSession::from_grant(&grant, Utc::now(), &self.inner.policy);
        self.inner.store.write(&session)?;

        info!(user_id = %grant.user.id, "Signed in");
        self.inner.emit(SessionEvent::SignedIn {
            user_id: grant.user.id.clone(),
        });
        Ok(grant.user)
    }

    /// Refresh the token pair.
    ///
    /// Joins the running exchange if there is one. The exchange runs on its
    /// own task and completes even when the caller stops waiting. The manager never clears
    /// the session when the server rejects the exchange; that is the
    /// caller's decision. An expired refresh token is cleared without a
    /// network call.
    pub async fn refresh(&self) -> std::result::Result<TokenGrant, SessionError> {
        let refresh = {
            let mut slot = self.inner.lock_in_flight();
            match slot.as_ref() {
                Some(running) => {
                    debug!("Joining in-flight refresh");
                    running.clone()
                }
                None => {
                    // Spawned so the exchange settles even if every caller is dropped
                    let task = tokio::spawn(ManagerInner::exchange(Arc::clone(&self.inner)));
                    let refresh = task
                        .map(|joined| joined.unwrap_or(Err(SessionError::Aborted)))
                        .boxed()
                        .shared();
                    *slot = Some(refresh.clone());
                    refresh
                }
            }
        };

        refresh.await
    }

    /// Replace the cached user, leaving the tokens alone.
    pub fn update_user(&self, user: UserSummary) -> Result<()> {
        let session = self.inner.store.read();
        if !session.has_tokens() {
            return Err(Error::Session(SessionError::NoCredentials));
        }
        self.inner.store.write(&session.with_user(user))?;
        self.inner.emit(SessionEvent::UserUpdated);
        Ok(())
    }

    /// Clear the session at the user's request.
    #[instrument(skip(self))]
    pub fn logout(&self) -> Result<()> {
        self.inner.store.clear()?;
        info!("Signed out");
        self.inner.emit(SessionEvent::SignedOut {
            reason: SignOutReason::Logout,
        });
        Ok(())
    }

    /// Clear the session after a terminal failure.
    ///
    /// A store that fails to clear is logged; the event is still sent.
    pub fn sign_out(&self, reason: SignOutReason) {
        if let Err(e) = self.inner.store.clear() {
            warn!(error = %e, "Failed to clear session");
        }
        info!(?reason, "Session ended");
        self.inner.emit(SessionEvent::SignedOut { reason });
    }

    /// Receive future session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// True iff both tokens are stored and the refresh token is valid.
    pub fn is_authenticated(&self) -> bool {
        self.inner.store.read().is_authenticated(Utc::now())
    }

    /// True if the access token is within the stale margin of its expiry.
    pub fn is_access_token_stale(&self) -> bool {
        self.inner
            .store
            .read()
            .is_access_token_stale(Utc::now(), self.inner.policy.stale_margin)
    }

    /// The stored access token.
    pub fn access_token(&self) -> Option<AccessToken> {
        self.inner.store.read().access_token
    }

    /// The cached user snapshot.
    pub fn current_user(&self) -> Option<UserSummary> {
        self.inner.store.read().user
    }

    /// True while a refresh exchange is running.
    pub fn is_refreshing(&self) -> bool {
        self.inner.lock_in_flight().is_some()
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.store
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.inner.policy
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("policy", &self.inner.policy)
            .field("refreshing", &self.is_refreshing())
            .finish_non_exhaustive()
    }
}

impl ManagerInner {
    fn lock_in_flight(&self) -> MutexGuard<'_, Option<SharedRefresh>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Run one exchange, then free the slot so the next caller starts afresh.
    async fn exchange(self: Arc<Self>) -> std::result::Result<TokenGrant, SessionError> {
        let result = self.run_exchange().await;
        self.lock_in_flight().take();
        result
    }

    #[instrument(skip(self))]
    async fn run_exchange(&self) -> std::result::Result<TokenGrant, SessionError> {
        let session = self.store.read();
        let (Some(access_token), Some(refresh_token)) = (&session.access_token, &session.refresh_token)
        else {
            debug!("No tokens to refresh");
            return Err(SessionError::NoCredentials);
        };

        if session.is_refresh_token_expired(Utc::now()) {
            info!("Refresh token has expired");
            if let Err(e) = self.store.clear() {
                warn!(error = %e, "Failed to clear session");
            }
            self.emit(SessionEvent::SignedOut {
                reason: SignOutReason::RefreshTokenExpired,
            });
            return Err(SessionError::RefreshTokenExpired);
        }

        info!("Refreshing session");
        let mut grant = self
            .auth
            .exchange_refresh_token(access_token, refresh_token)
            .await
            .inspect_err(|e| warn!(error = %e, "Refresh exchange failed"))?;

        if grant.user.id.is_empty() {
            if let Some(user) = session.user.clone() {
                grant.user = user;
            }
        }

        let refreshed = StoredSession::from_grant(&grant, Utc::now(), &self.policy);
        self.store.write(&refreshed)?;

        debug!("Session refreshed");
        self.emit(SessionEvent::Refreshed);
        Ok(grant)
    }
}
