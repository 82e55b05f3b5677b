//! Authentication module: session storage, route gating and the
//! login/logout/signup flows.
//!
//! This module provides:
//! - `SessionStore`: holder of the single bearer token (file, keychain or memory)
//! - `AuthGate`: decides whether a route renders or redirects
//! - `LoginFlow` / `logout`: create and destroy the session
//! - `SignupFlow`: account registration
//!
//! The session is derived, not stored: a user is authenticated exactly when a
//! token is present. No client-side expiry check is performed.

pub mod credentials;
pub mod gate;
pub mod login;
pub mod logout;
pub mod signup;
pub mod store;

pub use credentials::KeyringSessionStore;
pub use gate::{is_authenticated, AuthGate, Navigation, Route};
pub use login::{Credentials, FieldErrors, LoginError, LoginFlow, LoginSuccess, LOGIN_REDIRECT_DELAY};
pub use logout::logout;
pub use signup::{SignupError, SignupFieldErrors, SignupFlow, SignupForm, SIGNUP_REDIRECT_DELAY};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, SharedSessionStore, TOKEN_KEY};
