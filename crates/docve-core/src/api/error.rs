use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - token missing or expired")]
    Unauthorized { message: Option<String> },

    #[error("Access denied{}", suffix(.0))]
    AccessDenied(Option<String>),

    #[error("Resource not found{}", suffix(.0))]
    NotFound(Option<String>),

    #[error("Bad request{}", suffix(.0))]
    BadRequest(Option<String>),

    #[error("Rate limited - please wait before trying again")]
    RateLimited,

    #[error("Server error ({status}){}", suffix(.message))]
    ServerError { status: u16, message: Option<String> },

    #[error("Unexpected status {status}{}", suffix(.message))]
    UnexpectedStatus { status: u16, message: Option<String> },

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Could not read {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Request cancelled")]
    Cancelled,
}

fn suffix(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(": {}", m),
        None => String::new(),
    }
}

/// Maximum length for error response bodies in log output
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error payload shape the service uses: `{"message": ...}` or `{"error": ...}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Pull the human-readable message out of a JSON error body, if there is one.
    pub fn server_message_from_body(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .filter(|m| !m.trim().is_empty())
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::server_message_from_body(body);
        match status.as_u16() {
            400 => ApiError::BadRequest(message),
            401 => ApiError::Unauthorized { message },
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            429 => ApiError::RateLimited,
            code @ 500..=599 => ApiError::ServerError { status: code, message },
            code => ApiError::UnexpectedStatus { status: code, message },
        }
    }

    /// Classify a transport-level failure. Body decode failures are not
    /// connectivity problems.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::InvalidResponse(err.to_string())
        } else {
            ApiError::Network(err)
        }
    }

    /// HTTP status, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::BadRequest(_) => Some(400),
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::AccessDenied(_) => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::RateLimited => Some(429),
            ApiError::ServerError { status, .. } | ApiError::UnexpectedStatus { status, .. } => {
                Some(*status)
            }
            ApiError::Network(_)
            | ApiError::InvalidResponse(_)
            | ApiError::File { .. }
            | ApiError::Cancelled => None,
        }
    }

    /// Message the server put in the error body.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { message }
            | ApiError::ServerError { message, .. }
            | ApiError::UnexpectedStatus { message, .. }
            | ApiError::AccessDenied(message)
            | ApiError::NotFound(message)
            | ApiError::BadRequest(message) => message.as_deref(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }
}
