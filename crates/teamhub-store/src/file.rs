//! File-backed credential store.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use teamhub_core::error::{Error, StorageError};
use teamhub_core::traits::CredentialStore;
use teamhub_core::{AccessToken, RefreshToken, Result, StoredSession, UserSummary};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

const ACCESS_TOKEN: &str = "accessToken";
const REFRESH_TOKEN: &str = "refreshToken";
const USER: &str = "user";
const ACCESS_TOKEN_TTL: &str = "accessTokenTtlSeconds";
const ACCESS_TOKEN_ISSUED_AT: &str = "accessTokenIssuedAt";
const REFRESH_TOKEN_EXPIRES_AT: &str = "refreshTokenExpiresAt";

fn map_io(path: &Path) -> impl Fn(std::io::Error) -> Error + '_ {
    move |err| {
        Error::Storage(StorageError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })
    }
}

/// On-disk layout of the session document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionFile<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<&'a UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    access_token_ttl_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    access_token_issued_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token_expires_at: Option<String>,
}

impl<'a> From<&'a StoredSession> for SessionFile<'a> {
    fn from(session: &'a StoredSession) -> Self {
        Self {
            access_token: session.access_token.as_ref().map(AccessToken::as_str),
            refresh_token: session.refresh_token.as_ref().map(RefreshToken::as_str),
            user: session.user.as_ref(),
            access_token_ttl_seconds: session.access_token_ttl_secs,
            access_token_issued_at: session.access_token_issued_at.map(|t| t.to_rfc3339()),
            refresh_token_expires_at: session.refresh_token_expires_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Credential store backed by a single JSON file.
///
/// Writes go to a temporary sibling and are renamed into place, so readers
/// see either the old or the new document. On Unix the file is readable by
/// its owner only.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a store at the given file path.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create a store at `session.json` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join("session.json"))
    }

    /// Get the session file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    /// Run `f` while holding an exclusive lock on the sibling lock file.
    fn with_lock<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock_path = self.lock_path();

        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).map_err(map_io(parent))?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(map_io(&lock_path))?;

        lock_file.lock_exclusive().map_err(map_io(&lock_path))?;
        let result = f();
        FileExt::unlock(&lock_file).map_err(map_io(&lock_path))?;

        result
    }

    /// Write `json` to `temp_path`, restrict it, and move it over `path`.
    fn replace_with(temp_path: &Path, path: &Path, json: &str) -> Result<()> {
        fs::write(temp_path, json).map_err(map_io(temp_path))?;

        // Set restrictive permissions (Unix only)
        #[cfg(unix)]
        {
            let mut perms = fs::metadata(temp_path)
                .map_err(map_io(temp_path))?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(temp_path, perms).map_err(map_io(temp_path))?;
        }

        fs::rename(temp_path, path).map_err(map_io(path))
    }

    fn parse(document: &Map<String, Value>) -> StoredSession {
        let string = |key: &str| document.get(key).and_then(Value::as_str).map(str::to_string);
        let timestamp = |key: &str| {
            let raw = document.get(key).and_then(Value::as_str)?;
            match DateTime::parse_from_rfc3339(raw) {
                Ok(t) => Some(t.with_timezone(&Utc)),
                Err(e) => {
                    warn!(field = key, error = %e, "Ignoring unparsable timestamp in session file");
                    None
                }
            }
        };

        let access_token = string(ACCESS_TOKEN).map(AccessToken::new);
        let refresh_token = string(REFRESH_TOKEN).map(RefreshToken::new);

        let user = document.get(USER).and_then(|v| {
            serde_json::from_value::<UserSummary>(v.clone())
                .inspect_err(|e| warn!(error = %e, "Ignoring malformed user in session file"))
                .ok()
        });

        StoredSession {
            access_token,
            refresh_token,
            user,
            access_token_ttl_secs: document.get(ACCESS_TOKEN_TTL).and_then(Value::as_i64),
            access_token_issued_at: timestamp(ACCESS_TOKEN_ISSUED_AT),
            refresh_token_expires_at: timestamp(REFRESH_TOKEN_EXPIRES_AT),
        }
    }
}

impl CredentialStore for FileCredentialStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn read(&self) -> StoredSession {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return StoredSession::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read session file");
                return StoredSession::default();
            }
        };

        match serde_json::from_str::<Value>(&json) {
            Ok(Value::Object(document)) => Self::parse(&document),
            Ok(_) => {
                warn!("Session file is not a JSON object");
                StoredSession::default()
            }
            Err(e) => {
                warn!(error = %e, "Invalid session file");
                StoredSession::default()
            }
        }
    }

    #[instrument(skip(self, session), fields(path = %self.path.display()))]
    fn write(&self, session: &StoredSession) -> Result<()> {
        let json = serde_json::to_string_pretty(&SessionFile::from(session)).map_err(|e| {
            Error::Storage(StorageError::Serialize {
                message: e.to_string(),
            })
        })?;

        self.with_lock(|| {
            let temp_path = self
                .path
                .with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
            let written = Self::replace_with(&temp_path, &self.path, &json);
            if written.is_err() {
                // The temporary file holds both tokens
                match fs::remove_file(&temp_path) {
                    Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                        warn!(path = %temp_path.display(), error = %e, "Failed to remove temporary session file");
                    }
                    _ => {}
                }
            } else {
                debug!("Session written");
            }
            written
        })
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn clear(&self) -> Result<()> {
        self.with_lock(|| match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(map_io(&self.path)(e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn full_session() -> StoredSession {
        let now = Utc::now();
        StoredSession {
            access_token: Some(AccessToken::new("T1")),
            refresh_token: Some(RefreshToken::new("R1")),
            user: Some(UserSummary {
                id: "u-1".to_string(),
                first_name: "Alice".to_string(),
                last_name: "Liddell".to_string(),
                email: "alice@example.com".to_string(),
            }),
            access_token_ttl_secs: Some(3600),
            access_token_issued_at: Some(now),
            refresh_token_expires_at: Some(now + Duration::days(7)),
        }
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::in_dir(dir.path());
        assert_eq!(store.read(), StoredSession::default());
        assert!(!store.is_session_present());
        assert!(store.is_refresh_token_expired());
    }

    #[test]
    fn write_then_read_round_trips_every_field() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::in_dir(dir.path().join("nested"));
        let session = full_session();

        store.write(&session).unwrap();
        let read = store.read();

        assert_eq!(read.access_token, session.access_token);
        assert_eq!(read.refresh_token, session.refresh_token);
        assert_eq!(read.user, session.user);
        assert_eq!(read.access_token_ttl_secs, Some(3600));
        // RFC 3339 keeps sub-second precision
        assert_eq!(read.access_token_issued_at, session.access_token_issued_at);
        assert!(store.is_session_present());
        assert!(!store.is_refresh_token_expired());
    }

    #[test]
    fn uses_documented_keys() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::in_dir(dir.path());
        store.write(&full_session()).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        for key in [
            ACCESS_TOKEN,
            REFRESH_TOKEN,
            USER,
            ACCESS_TOKEN_TTL,
            ACCESS_TOKEN_ISSUED_AT,
            REFRESH_TOKEN_EXPIRES_AT,
        ] {
            assert!(raw.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(raw["user"]["firstName"], "Alice");
    }

    #[test]
    fn clear_removes_every_field() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::in_dir(dir.path());
        store.write(&full_session()).unwrap();

        store.clear().unwrap();

        let read = store.read();
        assert!(read.access_token.is_none());
        assert!(read.refresh_token.is_none());
        assert!(read.user.is_none());
        assert!(!store.path().exists());

        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::in_dir(dir.path());
        fs::write(store.path(), "{not json").unwrap();

        assert_eq!(store.read(), StoredSession::default());
    }

    #[test]
    fn unparsable_expiry_counts_as_expired() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::in_dir(dir.path());
        fs::write(
            store.path(),
            r#"{"accessToken":"T1","refreshToken":"R1","refreshTokenExpiresAt":"next tuesday"}"#,
        )
        .unwrap();

        let read = store.read();
        assert!(read.has_tokens());
        assert!(read.refresh_token_expires_at.is_none());
        assert!(store.is_refresh_token_expired());
    }

    #[test]
    fn malformed_user_is_dropped_but_tokens_survive() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::in_dir(dir.path());
        fs::write(
            store.path(),
            r#"{"accessToken":"T1","refreshToken":"R1","user":42}"#,
        )
        .unwrap();

        let read = store.read();
        assert!(read.user.is_none());
        assert_eq!(read.access_token, Some(AccessToken::new("T1")));
    }

    #[test]
    fn out_of_range_ttl_reads_as_stale() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::in_dir(dir.path());
        let issued_at = Utc::now().to_rfc3339();
        fs::write(
            store.path(),
            format!(
                r#"{{"accessToken":"T1","refreshToken":"R1","accessTokenTtlSeconds":{},"accessTokenIssuedAt":"{}"}}"#,
                i64::MAX,
                issued_at
            ),
        )
        .unwrap();

        let read = store.read();
        assert_eq!(read.access_token_ttl_secs, Some(i64::MAX));
        assert!(read.is_access_token_stale(Utc::now(), Duration::minutes(5)));
    }

    #[test]
    fn failed_write_leaves_no_temporary_file() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::in_dir(dir.path());
        // A non-empty directory where the session file belongs makes the rename fail
        fs::create_dir(store.path()).unwrap();
        fs::write(store.path().join("occupied"), "x").unwrap();

        assert!(store.write(&full_session()).is_err());

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "left behind {:?}", leftovers);
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_owner_only() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::in_dir(dir.path());
        store.write(&full_session()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
