use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::id::{deserialize_id, deserialize_opt_id, first_non_empty};
use crate::utils::{format_bytes, format_date};

/// Processing state reported by the service. Indexing itself happens
/// server-side; the client only displays and flips these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DocumentStatus {
    #[default]
    #[serde(alias = "Pending", alias = "Uploaded")]
    Processing,
    Indexed,
    Failed,
    Removed,
    #[serde(other)]
    Unknown,
}

impl DocumentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DocumentStatus::Processing => "Processing",
            DocumentStatus::Indexed => "Indexed",
            DocumentStatus::Failed => "Failed",
            DocumentStatus::Removed => "Removed",
            DocumentStatus::Unknown => "Unknown",
        }
    }

    /// Path segment of the status endpoint (`/Documents/{id}/mark-...`).
    pub fn mark_endpoint(&self) -> Option<&'static str> {
        match self {
            DocumentStatus::Indexed => Some("mark-indexed"),
            DocumentStatus::Failed => Some("mark-failed"),
            DocumentStatus::Removed => Some("mark-removed"),
            DocumentStatus::Processing | DocumentStatus::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawDocument")]
pub struct Document {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub shelf_id: Option<String>,
    pub content_type: Option<String>,
    pub size: Option<u64>,
    pub status: Option<DocumentStatus>,
    pub tags: Option<String>,
    pub created_at: Option<String>,
}

/// Wire shape of a document. Deployments name several fields differently
/// and some send both spellings, so each spelling gets its own slot.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    file_name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    shelf_id: Option<String>,
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    file_type: Option<String>,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    file_size: Option<u64>,
    #[serde(default)]
    size_bytes: Option<u64>,
    #[serde(default)]
    status: Option<DocumentStatus>,
    #[serde(default)]
    tags: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    uploaded_at: Option<String>,
    #[serde(default)]
    upload_date: Option<String>,
}

impl From<RawDocument> for Document {
    fn from(raw: RawDocument) -> Self {
        Self {
            id: raw.id,
            name: first_non_empty([raw.name, raw.file_name]).unwrap_or_default(),
            description: raw.description,
            shelf_id: raw.shelf_id,
            content_type: first_non_empty([raw.content_type, raw.file_type]),
            size: raw.size.or(raw.file_size).or(raw.size_bytes),
            status: raw.status,
            tags: raw.tags,
            created_at: first_non_empty([raw.created_at, raw.uploaded_at, raw.upload_date]),
        }
    }
}

impl Document {
    pub fn status(&self) -> DocumentStatus {
        self.status.unwrap_or_default()
    }

    /// Short type label derived from the file extension, falling back to
    /// the content type.
    pub fn type_label(&self) -> String {
        if let Some((_, ext)) = self.name.rsplit_once('.') {
            if !ext.is_empty() && ext.len() <= 5 {
                return ext.to_uppercase();
            }
        }
        self.content_type
            .as_deref()
            .and_then(|ct| ct.rsplit('/').next())
            .map(str::to_uppercase)
            .unwrap_or_else(|| "FILE".to_string())
    }

    pub fn size_display(&self) -> String {
        self.size.map(format_bytes).unwrap_or_else(|| "-".to_string())
    }

    pub fn date_display(&self) -> String {
        self.created_at
            .as_deref()
            .map(format_date)
            .unwrap_or_else(|| "-".to_string())
    }
}

/// Body for `PUT /Documents/{id}`.
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

/// A file to upload into a shelf.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub path: PathBuf,
    pub shelf_id: String,
    /// Comma-separated tags
    pub tags: Option<String>,
    pub description: Option<String>,
}

impl UploadRequest {
    pub fn new(path: impl Into<PathBuf>, shelf_id: &str) -> Self {
        Self {
            path: path.into(),
            shelf_id: shelf_id.to_string(),
            tags: None,
            description: None,
        }
    }

    pub fn with_tags(mut self, tags: &str) -> Self {
        let tags = tags.trim();
        self.tags = (!tags.is_empty()).then(|| tags.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        let description = description.trim();
        self.description = (!description.is_empty()).then(|| description.to_string());
        self
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_deserialize() {
        let json = r#"{"id": 9, "fileName": "Annual Report 2024.pdf", "shelfId": 3,
                       "fileSize": 2516582, "status": "Indexed", "uploadedAt": "2025-01-15T10:00:00Z"}"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.id, "9");
        assert_eq!(doc.shelf_id.as_deref(), Some("3"));
        assert_eq!(doc.status(), DocumentStatus::Indexed);
        assert_eq!(doc.type_label(), "PDF");
        assert_eq!(doc.size_display(), "2.4 MB");
        assert_eq!(doc.date_display(), "Jan 15, 2025");
    }

    #[test]
    fn test_document_status_defaults_and_unknowns() {
        let doc: Document = serde_json::from_str(r#"{"id": "x", "name": "notes"}"#).unwrap();
        assert_eq!(doc.status(), DocumentStatus::Processing);
        assert_eq!(doc.type_label(), "FILE");

        let doc: Document =
            serde_json::from_str(r#"{"id": "x", "status": "Quarantined"}"#).unwrap();
        assert_eq!(doc.status(), DocumentStatus::Unknown);

        let doc: Document = serde_json::from_str(r#"{"id": "x", "status": "Pending"}"#).unwrap();
        assert_eq!(doc.status(), DocumentStatus::Processing);
    }

    #[test]
    fn test_type_label_from_content_type() {
        let doc: Document = serde_json::from_str(
            r#"{"id": 1, "name": "scan", "contentType": "application/pdf"}"#,
        )
        .unwrap();
        assert_eq!(doc.type_label(), "PDF");
    }

    #[test]
    fn test_document_with_both_spellings() {
        let json = r#"{"id": 1, "name": "Report", "fileName": "report.pdf",
                       "contentType": "application/pdf", "fileType": "pdf",
                       "size": 2048, "fileSize": 4096,
                       "createdAt": "2025-01-15T10:00:00Z", "uploadDate": "2025-01-16"}"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.name, "Report");
        assert_eq!(doc.content_type.as_deref(), Some("application/pdf"));
        assert_eq!(doc.size, Some(2048));
        assert_eq!(doc.date_display(), "Jan 15, 2025");
    }

    #[test]
    fn test_document_null_fields() {
        let json = r#"{"id": 4, "name": null, "fileName": "scan.png", "size": null,
                       "fileSize": 10, "status": null, "tags": null}"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.name, "scan.png");
        assert_eq!(doc.size, Some(10));
        assert_eq!(doc.status(), DocumentStatus::Processing);

        let doc: Document = serde_json::from_str(r#"{"id": 5, "name": null}"#).unwrap();
        assert_eq!(doc.name, "");
        assert_eq!(doc.type_label(), "FILE");
    }

    #[test]
    fn test_document_list_survives_mixed_records() {
        let json = r#"[{"id": 1, "name": "a.txt", "fileName": "a.txt"},
                       {"id": 2, "fileName": "b.pdf", "fileType": "application/pdf"}]"#;
        let docs: Vec<Document> = serde_json::from_str(json).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].content_type.as_deref(), Some("application/pdf"));
    }

    #[test]
    fn test_mark_endpoints() {
        assert_eq!(DocumentStatus::Indexed.mark_endpoint(), Some("mark-indexed"));
        assert_eq!(DocumentStatus::Failed.mark_endpoint(), Some("mark-failed"));
        assert_eq!(DocumentStatus::Removed.mark_endpoint(), Some("mark-removed"));
        assert_eq!(DocumentStatus::Processing.mark_endpoint(), None);
    }

    #[test]
    fn test_upload_request_builders() {
        let req = UploadRequest::new("/tmp/report.pdf", "7")
            .with_tags(" finance, q4 ")
            .with_description("   ");
        assert_eq!(req.file_name(), "report.pdf");
        assert_eq!(req.tags.as_deref(), Some("finance, q4"));
        assert_eq!(req.description, None);
    }
}
