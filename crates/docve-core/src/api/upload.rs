//! Streaming multipart upload with progress reporting.

use futures::TryStreamExt;
use reqwest::multipart::{Form, Part};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::models::{Document, UploadRequest};

use super::{ApiClient, ApiError};

/// Bytes handed to the connection so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UploadProgress {
    pub sent: u64,
    pub total: u64,
    pub percent: u8,
}

impl UploadProgress {
    pub fn new(sent: u64, total: u64) -> Self {
        let percent = if total == 0 {
            100
        } else {
            ((sent.min(total) as f64 * 100.0) / total as f64).round() as u8
        };
        Self { sent, total, percent }
    }

    pub fn is_complete(&self) -> bool {
        self.percent >= 100
    }
}

/// Counts chunks as the body stream yields them.
struct ProgressTracker {
    sent: u64,
    total: u64,
    last_percent: Option<u8>,
    tx: Option<UnboundedSender<UploadProgress>>,
}

impl ProgressTracker {
    fn advance(&mut self, bytes: usize) {
        self.sent += bytes as u64;
        let progress = UploadProgress::new(self.sent, self.total);
        // One event per percent step is enough for a progress bar
        if self.last_percent == Some(progress.percent) {
            return;
        }
        self.last_percent = Some(progress.percent);
        if let Some(tx) = &self.tx {
            let _ = tx.send(progress);
        }
    }
}

/// MIME type for the multipart file part, from the extension.
fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

impl ApiClient {
    /// `POST /Documents/upload` as multipart (`file`, `shelfId`, and `tags` /
    /// `description` when set). The file is streamed from disk; `progress`
    /// receives non-decreasing percentages ending at 100.
    ///
    /// Returns the created document when the service echoes one back.
    pub async fn upload_document(
        &self,
        upload: &UploadRequest,
        progress: Option<UnboundedSender<UploadProgress>>,
    ) -> Result<Option<Document>, ApiError> {
        let file_error = |source| ApiError::File {
            path: upload.path.display().to_string(),
            source,
        };
        let file = tokio::fs::File::open(&upload.path).await.map_err(file_error)?;
        let total = file.metadata().await.map_err(file_error)?.len();
        let file_name = upload.file_name();

        info!(file = %file_name, shelf_id = %upload.shelf_id, bytes = total, "Uploading document");

        let mut tracker = ProgressTracker {
            sent: 0,
            total,
            last_percent: None,
            tx: progress.clone(),
        };
        let stream = ReaderStream::new(file).inspect_ok(move |chunk| tracker.advance(chunk.len()));

        let part = Part::stream_with_length(reqwest::Body::wrap_stream(stream), total)
            .file_name(file_name.clone())
            .mime_str(content_type_for(&file_name))
            .map_err(ApiError::from_reqwest)?;

        let mut form = Form::new()
            .part("file", part)
            .text("shelfId", upload.shelf_id.clone());
        if let Some(tags) = &upload.tags {
            form = form.text("tags", tags.clone());
        }
        if let Some(description) = &upload.description {
            form = form.text("description", description.clone());
        }

        let builder = self
            .request(reqwest::Method::POST, "/Documents/upload")
            .multipart(form);
        let response = self.send(builder).await?;

        if total == 0 {
            if let Some(tx) = &progress {
                let _ = tx.send(UploadProgress::new(0, 0));
            }
        }

        let body = response.text().await.map_err(ApiError::from_reqwest)?;
        match serde_json::from_str::<Document>(&body) {
            Ok(doc) => Ok(Some(doc)),
            Err(e) => {
                debug!(error = %e, "Upload response carried no document");
                Ok(None)
            }
        }
    }
}
