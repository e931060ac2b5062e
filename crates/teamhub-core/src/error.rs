//! Error types for the teamhub client.
//!
//! This module provides a unified error type with explicit variants for
//! transport, server, session, storage, and input validation errors.
//! Every leaf error is `Clone` so that a single refresh outcome can be
//! handed to every caller waiting on it.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// The unified error type for teamhub operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Network transport errors (connection, timeout, undecodable body).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with a non-success status.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The session is missing, expired, or could not be refreshed.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// The credential store could not be written.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input validation errors (bad URL, bad configuration value).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Returns true if this is a 401 answer from the server.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Api(err) if err.is_unauthorized())
    }

    /// Returns the underlying server error, if any.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }

    /// A sentence suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            Error::Transport(TransportError::Timeout { .. }) => {
                "The server took too long to respond. Please try again.".to_string()
            }
            Error::Transport(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            Error::Api(err) => err.display_message(),
            Error::Session(_) => "Your session has ended. Please sign in again.".to_string(),
            Error::Storage(err) => err.to_string(),
            Error::InvalidInput(err) => err.to_string(),
        }
    }
}

/// Transport-level errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },

    /// The response body could not be decoded.
    #[error("could not decode response: {message}")]
    Decode { message: String },
}

/// Session lifecycle errors.
///
/// All of these leave the caller unauthenticated; the variants stay
/// distinct so callers can log the actual cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No access or refresh token is stored.
    #[error("no stored credentials")]
    NoCredentials,

    /// The stored refresh token is past its expiry (or the expiry is unknown).
    #[error("refresh token expired")]
    RefreshTokenExpired,

    /// The server refused the refresh exchange.
    #[error("refresh rejected: {0}")]
    RefreshRejected(ApiError),

    /// The refresh exchange never got an answer.
    #[error("refresh failed: {0}")]
    RefreshTransport(TransportError),

    /// The refreshed session could not be persisted.
    #[error("could not persist session: {0}")]
    Storage(StorageError),

    /// The task driving the refresh stopped before it settled.
    #[error("refresh task aborted")]
    Aborted,
}

impl From<Error> for SessionError {
    fn from(err: Error) -> Self {
        match err {
            Error::Api(err) => SessionError::RefreshRejected(err),
            Error::Transport(err) => SessionError::RefreshTransport(err),
            Error::Session(err) => err,
            Error::Storage(err) => SessionError::Storage(err),
            Error::InvalidInput(err) => SessionError::RefreshTransport(TransportError::Http {
                message: err.to_string(),
            }),
        }
    }
}

/// Credential store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Filesystem failure.
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// The session could not be serialized.
    #[error("could not serialize session: {message}")]
    Serialize { message: String },
}

/// An error answer from the server.
///
/// Built from the status code and whatever the body carried: an error code,
/// a human message, and per-field validation messages. See the
/// [`problem`](crate::problem) module for the normalization helpers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status code.
    pub status: u16,
    /// Machine error code (if present).
    pub code: Option<String>,
    /// Error message from the server.
    pub message: Option<String>,
    /// Validation messages keyed by field name.
    pub errors: BTreeMap<String, Vec<String>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref code) = self.code {
            write!(f, " [{}]", code)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Create a new error with no body details.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            code: None,
            message: None,
            errors: BTreeMap::new(),
        }
    }

    /// Set the machine error code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the server message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Add a validation message for a field.
    pub fn with_field_error(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
        self
    }

    /// Check if this is an authentication failure.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Check if the server itself failed.
    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }
}

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// Invalid configuration value.
    #[error("invalid configuration {key}='{value}': {reason}")]
    Config {
        key: String,
        value: String,
        reason: String,
    },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
