//! Core library for the Docve terminal client.
//!
//! - `auth`: session store, auth gate, login/logout/signup flows
//! - `api`: REST client for the Docve service
//! - `models`: shelves, documents, users, dashboard records
//! - `chat`: simulated document chat
//! - `config`: on-disk configuration and environment overrides

pub mod api;
pub mod auth;
pub mod chat;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthGate, Navigation, Route, SessionStore, SharedSessionStore};
pub use config::Config;
