//! teamhub-core - Session, token and error types for the teamhub API client.
//!
//! This crate holds no I/O. It defines the persisted session model, the
//! error taxonomy with its normalization helpers, and the two seams the
//! client is built around: [`CredentialStore`] and [`AuthApi`].

pub mod credentials;
pub mod error;
pub mod problem;
pub mod session;
pub mod tokens;
pub mod traits;
pub mod types;

pub use credentials::{Credentials, Registration};
pub use error::{ApiError, Error, SessionError};
pub use problem::{FormErrors, Problem};
pub use session::{SessionPolicy, StoredSession, TokenGrant};
pub use tokens::{AccessToken, RefreshToken};
pub use traits::{AuthApi, CredentialStore};
pub use types::{ApiUrl, UserSummary};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
