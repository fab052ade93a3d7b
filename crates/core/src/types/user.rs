//! Storefront users (registered or guest) as returned by the Neotech API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// A user record.
///
/// Only `id` is required; the payload is otherwise checked for shape only.
/// Fields the storefront does not model are kept in `extra` so a persisted
/// user round-trips without loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub guest: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl User {
    /// Create a user with only an id.
    #[must_use]
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            name: None,
            guest: false,
            created_at: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Name to show in the UI.
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ if self.guest => "Guest".to_string(),
            _ => format!("User #{}", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_keeps_unknown_fields() {
        let json = r#"{"id":12,"name":"guest-12","guest":true,"email":null,"updated_at":"2024-01-02T00:00:00Z"}"#;
        let user: User = serde_json::from_str(json).unwrap();

        assert_eq!(user.id, UserId::new(12));
        assert!(user.guest);
        assert!(user.extra.contains_key("updated_at"));

        let back = serde_json::to_value(&user).unwrap();
        assert_eq!(back["updated_at"], "2024-01-02T00:00:00Z");
    }

    #[test]
    fn test_user_shape_check() {
        assert!(serde_json::from_str::<User>(r#"{"name":"no id"}"#).is_err());
        assert!(serde_json::from_str::<User>(r#"{"id":"12"}"#).is_err());
    }

    #[test]
    fn test_display_name() {
        let mut user = User::new(UserId::new(5));
        assert_eq!(user.display_name(), "User #5");

        user.guest = true;
        assert_eq!(user.display_name(), "Guest");

        user.name = Some("Ada".to_string());
        assert_eq!(user.display_name(), "Ada");
    }
}
