use std::fmt;

use serde::{Deserialize, Serialize};

use super::id::{deserialize_id, deserialize_opt_id, first_non_empty};
use crate::utils::format_date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ShelfType {
    #[default]
    Personal,
    #[serde(alias = "Team")]
    Shared,
    #[serde(other)]
    Other,
}

impl ShelfType {
    pub fn label(&self) -> &'static str {
        match self {
            ShelfType::Personal => "Personal",
            ShelfType::Shared => "Shared",
            ShelfType::Other => "Other",
        }
    }

    /// Toggle used by the create-shelf form.
    pub fn toggle(&self) -> Self {
        match self {
            ShelfType::Personal => ShelfType::Shared,
            ShelfType::Shared | ShelfType::Other => ShelfType::Personal,
        }
    }
}

impl fmt::Display for ShelfType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawShelf")]
pub struct Shelf {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub shelf_type: Option<ShelfType>,
    pub created_at: Option<String>,
    pub document_count: Option<u64>,
    pub owner_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawShelf {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<ShelfType>,
    #[serde(default)]
    shelf_type: Option<ShelfType>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    created_date: Option<String>,
    #[serde(default)]
    document_count: Option<u64>,
    #[serde(default)]
    documents_count: Option<u64>,
    #[serde(default)]
    docs: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    owner_id: Option<String>,
}

impl From<RawShelf> for Shelf {
    fn from(raw: RawShelf) -> Self {
        Self {
            id: raw.id,
            name: raw.name.unwrap_or_default(),
            description: raw.description,
            shelf_type: raw.kind.or(raw.shelf_type),
            created_at: first_non_empty([raw.created_at, raw.created_date]),
            document_count: raw.document_count.or(raw.documents_count).or(raw.docs),
            owner_id: raw.owner_id,
        }
    }
}

impl Shelf {
    pub fn type_label(&self) -> &'static str {
        self.shelf_type.unwrap_or_default().label()
    }

    pub fn is_shared(&self) -> bool {
        matches!(self.shelf_type, Some(ShelfType::Shared))
    }

    pub fn created_display(&self) -> String {
        self.created_at
            .as_deref()
            .map(format_date)
            .unwrap_or_else(|| "-".to_string())
    }

    pub fn documents_display(&self) -> String {
        self.document_count
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string())
    }

    /// Case-insensitive match on name and description.
    pub fn matches(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        self.name.to_lowercase().contains(&q)
            || self
                .description
                .as_deref()
                .map(|d| d.to_lowercase().contains(&q))
                .unwrap_or(false)
    }
}

/// Body for creating or updating a shelf.
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewShelf {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub shelf_type: ShelfType,
}

impl NewShelf {
    pub fn new(name: &str, description: &str, shelf_type: ShelfType) -> Self {
        let description = description.trim();
        Self {
            name: name.trim().to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            shelf_type,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Shelf name is required".to_string());
        }
        Ok(())
    }
}

/// A user's access entry on a shelf.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShelfAccess {
    #[serde(deserialize_with = "deserialize_id")]
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub permission: Option<String>,
    #[serde(default)]
    access_level: Option<String>,
}

impl ShelfAccess {
    /// Permission under either of the names the service uses.
    pub fn permission(&self) -> Option<&str> {
        self.permission
            .as_deref()
            .or(self.access_level.as_deref())
    }

    pub fn display_name(&self) -> String {
        self.username
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| format!("User {}", self.user_id))
    }
}

/// Body for granting a user access to a shelf.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    pub user_id: String,
    pub permission: String,
}

impl AccessGrant {
    pub const PERMISSIONS: [&'static str; 3] = ["View", "Edit Documents", "Manage Shelf"];

    pub fn new(user_id: &str, permission: &str) -> Self {
        Self {
            user_id: user_id.trim().to_string(),
            permission: permission.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shelf_deserialize_lenient() {
        let json = r#"{"id": 3, "name": "Legal Contracts", "type": "Shared",
                       "createdDate": "2023-09-15", "docs": 32, "extra": true}"#;
        let shelf: Shelf = serde_json::from_str(json).unwrap();
        assert_eq!(shelf.id, "3");
        assert!(shelf.is_shared());
        assert_eq!(shelf.document_count, Some(32));
        assert_eq!(shelf.created_display(), "2023-09-15");

        let shelf: Shelf = serde_json::from_str(r#"{"id": "a", "type": "Team"}"#).unwrap();
        assert_eq!(shelf.shelf_type, Some(ShelfType::Shared));
        assert_eq!(shelf.documents_display(), "-");

        let shelf: Shelf = serde_json::from_str(r#"{"id": "a", "type": "Archive"}"#).unwrap();
        assert_eq!(shelf.shelf_type, Some(ShelfType::Other));
    }

    #[test]
    fn test_shelf_with_both_spellings_and_nulls() {
        let json = r#"{"id": 1, "name": null, "description": null, "type": "Shared",
                       "shelfType": "Personal", "createdAt": "2024-02-01",
                       "createdDate": "2023-01-01", "documentCount": 5, "docs": 7}"#;
        let shelf: Shelf = serde_json::from_str(json).unwrap();
        assert_eq!(shelf.name, "");
        assert!(shelf.is_shared());
        assert_eq!(shelf.created_display(), "2024-02-01");
        assert_eq!(shelf.document_count, Some(5));
        assert!(!shelf.matches("x"));
    }

    #[test]
    fn test_shelf_access_permission_names() {
        let entry: ShelfAccess = serde_json::from_str(
            r#"{"userId": 4, "username": "ana", "permission": "View", "accessLevel": "Manage Shelf"}"#,
        )
        .unwrap();
        assert_eq!(entry.permission(), Some("View"));

        let entry: ShelfAccess =
            serde_json::from_str(r#"{"userId": 5, "accessLevel": "Edit Documents"}"#).unwrap();
        assert_eq!(entry.permission(), Some("Edit Documents"));
        assert_eq!(entry.display_name(), "User 5");
    }

    #[test]
    fn test_new_shelf_validation_and_body() {
        let shelf = NewShelf::new("  Q4 Reports ", "  ", ShelfType::Personal);
        assert!(shelf.validate().is_ok());
        assert_eq!(
            serde_json::to_value(&shelf).unwrap(),
            serde_json::json!({"name": "Q4 Reports", "type": "Personal"})
        );

        let blank = NewShelf::new("   ", "desc", ShelfType::Shared);
        assert_eq!(blank.validate(), Err("Shelf name is required".to_string()));
    }

    #[test]
    fn test_shelf_matches() {
        let shelf: Shelf =
            serde_json::from_str(r#"{"id": 1, "name": "Research Papers", "description": "ML"}"#)
                .unwrap();
        assert!(shelf.matches("research"));
        assert!(shelf.matches("ml"));
        assert!(!shelf.matches("legal"));
    }

    #[test]
    fn test_shelf_type_toggle() {
        assert_eq!(ShelfType::Personal.toggle(), ShelfType::Shared);
        assert_eq!(ShelfType::Shared.toggle(), ShelfType::Personal);
    }
}
