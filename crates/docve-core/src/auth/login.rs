//! Credential login: validate locally, exchange for a token, store it.

use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};

use super::gate::Route;
use super::store::SharedSessionStore;

/// Pause on the success screen before moving to the dashboard.
pub const LOGIN_REDIRECT_DELAY: Duration = Duration::from_millis(1000);

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Local checks run before any request is made.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();

        if self.username.trim().is_empty() {
            errors.username = Some("Username is required".to_string());
        } else if self.username.chars().count() < MIN_USERNAME_LEN {
            errors.username = Some("Username must be at least 3 characters".to_string());
        }

        if self.password.is_empty() {
            errors.password = Some("Password is required".to_string());
        } else if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.password = Some("Password must be at least 6 characters".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Per-field validation messages for the login form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none()
    }

    fn summary(&self) -> String {
        [self.username.as_deref(), self.password.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Why a login attempt failed. `Display` is the message shown to the user.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("{}", .0.summary())]
    Validation(FieldErrors),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{}", message_or(.0, "Invalid request. Please check your input."))]
    BadRequest(Option<String>),

    #[error("Server error. Please try again later.")]
    ServerError,

    #[error("{}", message_or(.message, "An error occurred. Please try again."))]
    Status { status: u16, message: Option<String> },

    #[error("Unable to connect to server. Please check your internet connection.")]
    Unreachable,

    #[error("Login failed. Please check your credentials.")]
    MissingToken,

    #[error("An unexpected error occurred. Please try again.")]
    Unexpected(String),
}

fn message_or(message: &Option<String>, fallback: &str) -> String {
    message.clone().unwrap_or_else(|| fallback.to_string())
}

impl LoginError {
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            LoginError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ApiError> for LoginError {
    fn from(err: ApiError) -> Self {
        match err {
            // The server's 401 payload is never shown
            ApiError::Unauthorized { .. } => LoginError::InvalidCredentials,
            ApiError::BadRequest(message) => LoginError::BadRequest(message),
            ApiError::ServerError { status: 500, .. } => LoginError::ServerError,
            ApiError::Network(_) => LoginError::Unreachable,
            // Only a 2xx body fails to decode; without a readable token the login failed
            ApiError::InvalidResponse(_) => LoginError::MissingToken,
            e @ (ApiError::File { .. } | ApiError::Cancelled) => {
                LoginError::Unexpected(e.to_string())
            }
            other => match other.status() {
                Some(status) => LoginError::Status {
                    status,
                    message: other.server_message().map(str::to_string),
                },
                None => LoginError::Unexpected(other.to_string()),
            },
        }
    }
}

/// Outcome of a successful login: where to go, and after how long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSuccess {
    pub next: Route,
    pub redirect_after: Duration,
}

/// Exchanges credentials for a session token.
#[derive(Clone)]
pub struct LoginFlow {
    api: ApiClient,
    store: SharedSessionStore,
}

impl LoginFlow {
    /// The token is written to the same store the client reads from.
    pub fn new(api: ApiClient) -> Self {
        let store = api.store().clone();
        Self { api, store }
    }

    /// Validate, call `POST /Auth/login` once and store the returned token.
    /// Nothing is stored unless the whole exchange succeeds.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginSuccess, LoginError> {
        credentials.validate().map_err(LoginError::Validation)?;

        info!(username = %credentials.username, "Logging in");
        let response = self
            .api
            .login(&credentials.username, &credentials.password)
            .await
            .map_err(|e| {
                warn!(error = %e, "Login request failed");
                LoginError::from(e)
            })?;

        let token = response.token().ok_or_else(|| {
            warn!("Login response carried no token");
            LoginError::MissingToken
        })?;

        self.store.set(token).map_err(|e| {
            warn!(error = %e, "Failed to store session token");
            LoginError::Unexpected(e.to_string())
        })?;

        info!(username = %credentials.username, "Login successful");
        Ok(LoginSuccess {
            next: Route::Dashboard,
            redirect_after: LOGIN_REDIRECT_DELAY,
        })
    }
}
