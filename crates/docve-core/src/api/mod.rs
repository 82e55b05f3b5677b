//! REST API client module for the Docve service.
//!
//! This module provides the `ApiClient` for communicating with the
//! Docve API to manage shelves, documents and users.
//!
//! Every request except login carries the bearer token held by the
//! session store at the moment the request is dispatched.

pub mod cancel;
pub mod client;
pub mod dashboard;
pub mod error;
pub mod upload;

pub use cancel::run_cancellable;
pub use client::{ApiClient, LoginResponse};
pub use error::ApiError;
pub use upload::UploadProgress;
