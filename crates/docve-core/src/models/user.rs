use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::deserialize_id;

/// Role assigned to self-registered accounts.
pub const DEFAULT_SIGNUP_ROLE: &str = "EndUser";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    pub fn display_name(&self) -> String {
        self.username
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| format!("User {}", self.id))
    }

    /// Creation time, when the service sent a parseable timestamp.
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Body for `POST /Users`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

/// Query parameters accepted by `GET /Users`.
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct UserQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl UserQuery {
    pub fn active() -> Self {
        Self {
            active: Some(true),
            ..Self::default()
        }
    }

    /// Newest accounts first.
    pub fn recent(limit: usize) -> Self {
        Self {
            sort: Some("createdAt".to_string()),
            order: Some("desc".to_string()),
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Body for `POST /Users/{id}/change-password`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

/// Free-form profile attached to a user.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_deserialize_and_display() {
        let user: User = serde_json::from_str(
            r#"{"id": 5, "email": "noah.s@email.com", "createdAt": "2025-01-02T03:04:05Z"}"#,
        )
        .unwrap();
        assert_eq!(user.id, "5");
        assert_eq!(user.display_name(), "noah.s@email.com");
        assert!(user.created().is_some());

        let user: User = serde_json::from_str(r#"{"id": "u1", "createdAt": "yesterday"}"#).unwrap();
        assert_eq!(user.display_name(), "User u1");
        assert!(user.created().is_none());
    }

    #[test]
    fn test_user_query_params() {
        assert!(UserQuery::default().is_empty());
        assert_eq!(
            serde_json::to_value(UserQuery::recent(5)).unwrap(),
            serde_json::json!({"sort": "createdAt", "order": "desc", "limit": 5})
        );
        assert_eq!(
            serde_json::to_value(UserQuery::active()).unwrap(),
            serde_json::json!({"active": true})
        );
    }

    #[test]
    fn test_password_change_body() {
        let body = PasswordChange {
            current_password: "old".into(),
            new_password: "new".into(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"currentPassword": "old", "newPassword": "new"})
        );
    }
}
