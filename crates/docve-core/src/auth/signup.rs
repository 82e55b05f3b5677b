//! Self-service account registration.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::{NewUser, DEFAULT_SIGNUP_ROLE};

use super::gate::Route;

/// Pause on the success banner before moving to the login screen.
pub const SIGNUP_REDIRECT_DELAY: Duration = Duration::from_millis(2000);

const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";

/// Per-field messages, keyed `username`, `email`, `password`, `confirmPassword`.
pub type SignupFieldErrors = BTreeMap<String, String>;

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// `local@domain.tld` with no whitespace and no second `@`.
fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let clean = |s: &str| !s.is_empty() && !s.contains('@') && !s.chars().any(char::is_whitespace);
    if !clean(local) || !clean(domain) {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

impl SignupForm {
    pub fn validate(&self) -> Result<(), SignupFieldErrors> {
        let mut errors = SignupFieldErrors::new();
        let mut fail = |field: &str, message: &str| {
            errors.insert(field.to_string(), message.to_string());
        };

        let username_len = self.username.chars().count();
        if self.username.trim().is_empty() {
            fail("username", "Username is required");
        } else if username_len < 3 {
            fail("username", "Username must be at least 3 characters");
        } else if username_len > 50 {
            fail("username", "Username must be less than 50 characters");
        }

        if self.email.trim().is_empty() {
            fail("email", "Email is required");
        } else if !looks_like_email(&self.email) {
            fail("email", "Please enter a valid email address");
        }

        let password_len = self.password.chars().count();
        if self.password.is_empty() {
            fail("password", "Password is required");
        } else if password_len < 6 {
            fail("password", "Password must be at least 6 characters");
        } else if password_len > 100 {
            fail("password", "Password must be less than 100 characters");
        }

        if self.confirm_password.is_empty() {
            fail("confirmPassword", "Please confirm your password");
        } else if self.confirm_password != self.password {
            fail("confirmPassword", "Passwords do not match");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Request body: trimmed username, normalized email, fixed role.
    pub fn to_new_user(&self) -> NewUser {
        NewUser {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            password: self.password.clone(),
            role: DEFAULT_SIGNUP_ROLE.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SignupError {
    #[error("Please fix the highlighted fields")]
    Validation(SignupFieldErrors),

    /// The server answered with an error. `fields` carries its `errors` map.
    #[error("{message}")]
    Rejected {
        message: String,
        fields: SignupFieldErrors,
    },

    #[error("Unable to connect to server. Please check your internet connection.")]
    Unreachable,

    #[error("An unexpected error occurred. Please try again.")]
    Unexpected(String),
}

impl SignupError {
    pub fn field_errors(&self) -> Option<&SignupFieldErrors> {
        match self {
            SignupError::Validation(fields) => Some(fields),
            SignupError::Rejected { fields, .. } if !fields.is_empty() => Some(fields),
            _ => None,
        }
    }
}

/// Flatten a server `errors` object. Values may be strings or arrays of
/// strings; keys are lower-camel-cased to match the form fields.
fn field_errors_from_body(body: &str) -> SignupFieldErrors {
    let Ok(Value::Object(root)) = serde_json::from_str::<Value>(body) else {
        return SignupFieldErrors::new();
    };
    let Some(Value::Object(errors)) = root.get("errors") else {
        return SignupFieldErrors::new();
    };
    errors
        .iter()
        .filter_map(|(key, value)| {
            let message = match value {
                Value::String(s) => s.clone(),
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(" "),
                _ => return None,
            };
            let mut chars = key.chars();
            let field: String = match chars.next() {
                Some(first) => first.to_lowercase().chain(chars).collect(),
                None => return None,
            };
            (!message.is_empty()).then_some((field, message))
        })
        .collect()
}

#[derive(Clone)]
pub struct SignupFlow {
    api: ApiClient,
}

impl SignupFlow {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Validate and `POST /Users`. On success the caller shows a banner and
    /// moves to `Route::Login` after `SIGNUP_REDIRECT_DELAY`.
    pub async fn register(&self, form: &SignupForm) -> Result<Route, SignupError> {
        form.validate().map_err(SignupError::Validation)?;

        let user = form.to_new_user();
        info!(username = %user.username, "Registering account");

        let response = self
            .api
            .request(reqwest::Method::POST, "/Users")
            .json(&user)
            .send()
            .await
            .map_err(|e| match ApiError::from_reqwest(e) {
                ApiError::Network(e) => {
                    warn!(error = %e, "Registration request failed");
                    SignupError::Unreachable
                }
                other => SignupError::Unexpected(other.to_string()),
            })?;

        let status = response.status();
        if status.is_success() {
            info!(username = %user.username, "Account created");
            return Ok(Route::Login);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(
            status = status.as_u16(),
            body = %ApiError::truncate_body(&body),
            "Registration rejected"
        );
        Err(SignupError::Rejected {
            message: ApiError::server_message_from_body(&body)
                .unwrap_or_else(|| REGISTRATION_FAILED.to_string()),
            fields: field_errors_from_body(&body),
        })
    }
}
