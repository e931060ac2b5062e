//! Normalization of server error answers.
//!
//! The server reports failures in several shapes: a bare `{code, message}`
//! object, a problem-details document with a field-keyed `errors` object,
//! or a list of `{code, description}` entries. Everything here is a pure
//! function over [`ApiError`] so forms and toasts can pick what to show.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::ApiError;

/// Shown for any 5xx answer.
pub const SERVER_ERROR_MESSAGE: &str =
    "Something went wrong on our side. Please try again later.";

/// Fixed table from server error codes to the form field they belong to.
const CODE_FIELDS: &[(&str, &str)] = &[
    ("DuplicateEmail", "email"),
    ("InvalidEmail", "email"),
    ("UserNotFound", "email"),
    ("DuplicateUserName", "userName"),
    ("InvalidUserName", "userName"),
    ("InvalidCredentials", "emailOrUsername"),
    ("EmailNotConfirmed", "emailOrUsername"),
    ("AccountLocked", "emailOrUsername"),
    ("PasswordTooShort", "password"),
    ("PasswordRequiresDigit", "password"),
    ("PasswordRequiresLower", "password"),
    ("PasswordRequiresUpper", "password"),
    ("PasswordRequiresNonAlphanumeric", "password"),
    ("PasswordRequiresUniqueChars", "password"),
    ("PasswordMismatch", "password"),
    ("InvalidToken", "token"),
    ("InvalidCode", "code"),
    ("ExpiredCode", "code"),
];

/// How a failed request should be surfaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    /// 401; handled by the refresh protocol, never shown generically.
    Unauthorized,
    /// Structured validation errors, first message per field.
    Validation(BTreeMap<String, String>),
    /// 5xx; callers show [`SERVER_ERROR_MESSAGE`].
    ServerError { status: u16 },
    /// Anything else, with the best human message available.
    Message(String),
}

/// Field-level and form-level messages for a failed form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    /// Messages keyed by form field name.
    pub fields: BTreeMap<String, String>,
    /// Message for the form as a whole, when no field matched.
    pub root: Option<String>,
}

impl FormErrors {
    /// Returns true if there is nothing to show.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.root.is_none()
    }
}

/// Guess whether `s` is a machine error code rather than a sentence.
///
/// Codes carry no whitespace and are either dotted (`Auth.InvalidToken`),
/// underscored (`INVALID_TOKEN`), or PascalCase with at least two humps
/// (`DuplicateEmail`).
pub fn is_machine_code(s: &str) -> bool {
    let s = s.trim();
    if s.is_empty() || s.chars().any(char::is_whitespace) {
        return false;
    }
    if s.ends_with('.') || s.ends_with('!') || s.ends_with('?') {
        return false;
    }

    let word_chars = s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-');
    if !word_chars {
        return false;
    }

    if s.contains('.') || s.contains('_') {
        return true;
    }

    let starts_upper = s.chars().next().is_some_and(|c| c.is_ascii_uppercase());
    let uppercase = s.chars().filter(char::is_ascii_uppercase).count();
    starts_upper && uppercase >= 2
}

/// Look up the form field a server error code belongs to.
///
/// Dotted codes match on their last segment.
pub fn field_for_code(code: &str) -> Option<&'static str> {
    let code = code.rsplit('.').next().unwrap_or(code);
    CODE_FIELDS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(code))
        .map(|(_, field)| *field)
}

/// Normalize a server field key to the client's camelCase form names.
///
/// `Email` becomes `email`, `$.firstName` becomes `firstName`.
pub fn normalize_field_key(key: &str) -> String {
    let key = key.trim().trim_start_matches("$.");
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl ApiError {
    /// Build an error from a status and a parsed JSON body.
    pub fn from_body(status: u16, body: &Value) -> Self {
        let mut error = ApiError::new(status);

        match body {
            Value::Object(map) => {
                error.code = ["code", "error", "errorCode"]
                    .iter()
                    .find_map(|k| map.get(*k).and_then(Value::as_str))
                    .map(str::to_string);
                error.message = ["message", "detail", "description", "title"]
                    .iter()
                    .find_map(|k| map.get(*k).and_then(Value::as_str))
                    .map(str::to_string);
                if let Some(errors) = map.get("errors") {
                    collect_field_errors(&mut error, errors);
                }
            }
            Value::Array(_) => collect_field_errors(&mut error, body),
            Value::String(s) if !s.trim().is_empty() => {
                error.message = Some(s.trim().to_string());
            }
            _ => {}
        }

        error
    }

    /// The best human-readable message for this error.
    ///
    /// Prefers a readable sentence over a machine code; falls back to a
    /// generic message keyed on the status.
    pub fn display_message(&self) -> String {
        if self.is_server_error() {
            return SERVER_ERROR_MESSAGE.to_string();
        }

        let candidates = self
            .message
            .iter()
            .chain(self.errors.values().filter_map(|m| m.first()))
            .chain(self.code.iter());

        for candidate in candidates {
            if !candidate.trim().is_empty() && !is_machine_code(candidate) {
                return candidate.trim().to_string();
            }
        }

        format!("Request failed (HTTP {})", self.status)
    }

    /// First message per field from the structured validation errors.
    pub fn first_field_messages(&self) -> BTreeMap<String, String> {
        self.errors
            .iter()
            .filter_map(|(field, messages)| {
                messages.first().map(|m| (field.clone(), m.clone()))
            })
            .collect()
    }

    /// Classify this error for display.
    pub fn problem(&self) -> Problem {
        if self.is_unauthorized() {
            Problem::Unauthorized
        } else if !self.errors.is_empty() {
            Problem::Validation(self.first_field_messages())
        } else if self.is_server_error() {
            Problem::ServerError {
                status: self.status,
            }
        } else {
            Problem::Message(self.display_message())
        }
    }

    /// Map this error onto form fields.
    pub fn form_errors(&self) -> FormErrors {
        let mut form = FormErrors {
            fields: self.first_field_messages(),
            root: None,
        };

        if let Some(field) = self.code.as_deref().and_then(field_for_code) {
            form.fields
                .entry(field.to_string())
                .or_insert_with(|| self.display_message());
        }

        if form.fields.is_empty() {
            form.root = Some(self.display_message());
        }

        form
    }
}

fn collect_field_errors(error: &mut ApiError, errors: &Value) {
    match errors {
        Value::Object(map) => {
            for (key, value) in map {
                let messages: Vec<String> = match value {
                    Value::Array(items) => items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect(),
                    Value::String(s) => vec![s.clone()],
                    _ => Vec::new(),
                };
                if !messages.is_empty() {
                    error
                        .errors
                        .entry(normalize_field_key(key))
                        .or_default()
                        .extend(messages);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                let code = item.get("code").and_then(Value::as_str);
                let message = ["description", "message"]
                    .iter()
                    .find_map(|k| item.get(*k).and_then(Value::as_str));
                let field = item
                    .get("field")
                    .and_then(Value::as_str)
                    .map(normalize_field_key)
                    .or_else(|| code.and_then(field_for_code).map(str::to_string));

                if error.code.is_none() {
                    error.code = code.map(str::to_string);
                }

                match (field, message) {
                    (Some(field), Some(message)) => {
                        error
                            .errors
                            .entry(field)
                            .or_default()
                            .push(message.to_string());
                    }
                    (None, Some(message)) if error.message.is_none() => {
                        error.message = Some(message.to_string());
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn machine_codes() {
        assert!(is_machine_code("DuplicateEmail"));
        assert!(is_machine_code("Auth.InvalidCredentials"));
        assert!(is_machine_code("INVALID_TOKEN"));
        assert!(is_machine_code("invalid_grant"));
    }

    #[test]
    fn human_messages() {
        assert!(!is_machine_code("Email 'a@b.c' is already taken."));
        assert!(!is_machine_code("Unauthorized"));
        assert!(!is_machine_code("Invalid."));
        assert!(!is_machine_code(""));
    }

    #[test]
    fn field_lookup_handles_dotted_codes() {
        assert_eq!(field_for_code("DuplicateEmail"), Some("email"));
        assert_eq!(field_for_code("Auth.InvalidCredentials"), Some("emailOrUsername"));
        assert_eq!(field_for_code("SomethingElse"), None);
    }

    #[test]
    fn field_keys_are_camel_cased() {
        assert_eq!(normalize_field_key("Email"), "email");
        assert_eq!(normalize_field_key("$.firstName"), "firstName");
        assert_eq!(normalize_field_key("NewPassword"), "newPassword");
    }

    #[test]
    fn parses_code_and_message() {
        let err = ApiError::from_body(
            400,
            &json!({"code": "DuplicateEmail", "message": "Email is already registered."}),
        );
        assert_eq!(err.code.as_deref(), Some("DuplicateEmail"));
        assert_eq!(err.display_message(), "Email is already registered.");
    }

    #[test]
    fn prefers_readable_message_over_code() {
        let err = ApiError::from_body(400, &json!({"message": "InvalidCredentials"}));
        assert_eq!(err.display_message(), "Request failed (HTTP 400)");

        let err = ApiError::from_body(
            400,
            &json!({"code": "InvalidCredentials", "detail": "Wrong email or password."}),
        );
        assert_eq!(err.display_message(), "Wrong email or password.");
    }

    #[test]
    fn parses_problem_details_errors() {
        let err = ApiError::from_body(
            400,
            &json!({
                "title": "One or more validation errors occurred.",
                "status": 400,
                "errors": {
                    "Email": ["The Email field is required.", "Email is invalid."],
                    "Password": ["The Password field is required."]
                }
            }),
        );

        let fields = err.first_field_messages();
        assert_eq!(fields["email"], "The Email field is required.");
        assert_eq!(fields["password"], "The Password field is required.");
        assert!(matches!(err.problem(), Problem::Validation(_)));
    }

    #[test]
    fn parses_identity_error_list() {
        let err = ApiError::from_body(
            400,
            &json!([
                {"code": "DuplicateUserName", "description": "Username 'alice' is already taken."},
                {"code": "PasswordTooShort", "description": "Passwords must be at least 8 characters."}
            ]),
        );

        assert_eq!(err.code.as_deref(), Some("DuplicateUserName"));
        let form = err.form_errors();
        assert_eq!(form.fields["userName"], "Username 'alice' is already taken.");
        assert_eq!(
            form.fields["password"],
            "Passwords must be at least 8 characters."
        );
        assert!(form.root.is_none());
    }

    #[test]
    fn code_table_maps_to_form_field() {
        let err = ApiError::new(401)
            .with_code("InvalidCredentials")
            .with_message("Invalid email/username or password.");
        let form = err.form_errors();
        assert_eq!(
            form.fields["emailOrUsername"],
            "Invalid email/username or password."
        );
    }

    #[test]
    fn unmapped_error_goes_to_root() {
        let err = ApiError::new(409).with_message("Project already archived.");
        let form = err.form_errors();
        assert!(form.fields.is_empty());
        assert_eq!(form.root.as_deref(), Some("Project already archived."));
    }

    #[test]
    fn classification() {
        assert_eq!(ApiError::new(401).problem(), Problem::Unauthorized);
        assert_eq!(
            ApiError::new(503).problem(),
            Problem::ServerError { status: 503 }
        );
        assert_eq!(
            ApiError::new(404).with_message("Project not found.").problem(),
            Problem::Message("Project not found.".to_string())
        );
    }

    #[test]
    fn server_errors_hide_details() {
        let err = ApiError::new(500).with_message("NullReferenceException at ...");
        assert_eq!(err.display_message(), SERVER_ERROR_MESSAGE);
    }
}
