//! Credential store trait.

use chrono::Utc;

use crate::Result;
use crate::session::StoredSession;

/// Durable key-value persistence of the session fields.
///
/// Implementations hold no business logic beyond read, write and clear.
/// Writers always go through the session manager, which reads, modifies
/// and writes the whole session.
pub trait CredentialStore: Send + Sync {
    /// Returns whatever subset of the session is stored.
    ///
    /// Never fails: absent or unreadable fields read as `None`.
    fn read(&self) -> StoredSession;

    /// Store every field, replacing what was there.
    fn write(&self, session: &StoredSession) -> Result<()>;

    /// Remove every field in one step.
    fn clear(&self) -> Result<()>;

    /// True iff both access and refresh token are stored.
    fn is_session_present(&self) -> bool {
        self.read().has_tokens()
    }

    /// True if the stored refresh-token expiry has passed.
    ///
    /// A missing or unparsable expiry counts as expired.
    fn is_refresh_token_expired(&self) -> bool {
        self.read().is_refresh_token_expired(Utc::now())
    }
}
