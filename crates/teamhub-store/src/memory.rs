//! In-memory credential store.

use std::sync::{Mutex, MutexGuard, PoisonError};

use teamhub_core::traits::CredentialStore;
use teamhub_core::{Result, StoredSession};

/// Credential store that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    session: Mutex<StoredSession>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `session`.
    pub fn with_session(session: StoredSession) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoredSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn read(&self) -> StoredSession {
        self.lock().clone()
    }

    fn write(&self, session: &StoredSession) -> Result<()> {
        *self.lock() = session.clone();
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.lock() = StoredSession::default();
        Ok(())
    }
}
