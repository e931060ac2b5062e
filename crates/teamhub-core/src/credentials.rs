//! Login and registration input types.

use std::fmt;

/// Login credentials.
///
/// The identifier is either an email address or a username.
///
/// # Security
///
/// The password is never exposed in Debug output to prevent accidental logging.
///
/// # Example
///
/// ```
/// use teamhub_core::Credentials;
///
/// let creds = Credentials::new("alice", "Secret123!");
/// assert_eq!(creds.email_or_username(), "alice");
/// ```
#[derive(Clone)]
pub struct Credentials {
    email_or_username: String,
    password: String,
}

impl Credentials {
    /// Create new credentials.
    pub fn new(email_or_username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email_or_username: email_or_username.into(),
            password: password.into(),
        }
    }

    /// Returns the email address or username.
    pub fn email_or_username(&self) -> &str {
        &self.email_or_username
    }

    /// Returns the password.
    ///
    /// # Security
    ///
    /// Use this only when constructing authentication requests.
    /// Never log or display this value.
    pub fn password(&self) -> &str {
        &self.password
    }
}

// Intentionally hide password in Debug output
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email_or_username", &self.email_or_username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Profile submitted when creating an account.
#[derive(Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("user_name", &self.user_name)
            .finish()
    }
}
