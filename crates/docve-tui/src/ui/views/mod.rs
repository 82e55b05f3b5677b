pub mod admin;
pub mod auth;
pub mod chat;
pub mod dashboard;
pub mod documents;
pub mod shelves;
