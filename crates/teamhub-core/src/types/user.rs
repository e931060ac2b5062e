//! Cached identity snapshot.

use serde::{Deserialize, Serialize};

/// Minimal identity kept alongside the tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

impl UserSummary {
    /// First and last name joined, or the email if both are blank.
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_camel_case() {
        let user: UserSummary = serde_json::from_str(
            r#"{"id":"u-1","firstName":"Alice","lastName":"Liddell","email":"alice@example.com"}"#,
        )
        .unwrap();
        assert_eq!(user.first_name, "Alice");
        assert_eq!(user.display_name(), "Alice Liddell");
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let user = UserSummary {
            id: "u-1".to_string(),
            first_name: String::new(),
            last_name: " ".to_string(),
            email: "alice@example.com".to_string(),
        };
        assert_eq!(user.display_name(), "alice@example.com");
    }
}
