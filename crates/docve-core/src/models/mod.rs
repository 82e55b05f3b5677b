//! Data models for Docve records.
//!
//! The service owns these records; the client only displays them, so every
//! field is optional and unknown fields are ignored.
//!
//! - `Shelf`, `ShelfAccess`: named document collections and who can see them
//! - `Document`, `DocumentStatus`: uploaded files and their processing state
//! - `User`: accounts, for the admin views and signup
//! - `DashboardStats`, `HealthReport`, `ActivityEntry`: admin dashboard

pub mod dashboard;
pub mod document;
pub mod id;
pub mod shelf;
pub mod user;

pub use dashboard::{ActivityEntry, DashboardStats, HealthReport};
pub use document::{Document, DocumentStatus, DocumentUpdate, UploadRequest};
pub use id::{deserialize_id, deserialize_opt_id};
pub use shelf::{AccessGrant, NewShelf, Shelf, ShelfAccess, ShelfType};
pub use user::{NewUser, PasswordChange, User, UserProfile, UserQuery, DEFAULT_SIGNUP_ROLE};
