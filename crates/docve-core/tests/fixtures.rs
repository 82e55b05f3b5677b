//! Shared helpers for the HTTP integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use docve_core::auth::{MemorySessionStore, SharedSessionStore};
use docve_core::ApiClient;
use serde_json::{json, Value};

/// A client against `base_url` backed by an in-memory store.
pub fn client(base_url: &str, token: Option<&str>) -> (ApiClient, Arc<MemorySessionStore>) {
    let store = Arc::new(match token {
        Some(t) => MemorySessionStore::with_token(t),
        None => MemorySessionStore::new(),
    });
    let shared: SharedSessionStore = store.clone();
    let api = ApiClient::new(base_url, shared).expect("build client");
    (api, store)
}

/// An address nothing listens on.
pub fn unreachable_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}/api", port)
}

pub fn users_json() -> Value {
    json!([
        {"id": 1, "username": "olivia", "email": "olivia@email.com", "createdAt": "2024-11-02T09:00:00Z"},
        {"id": 2, "username": "phoenix", "email": "phoenix@email.com", "createdAt": "2025-01-10T09:00:00Z"},
        {"id": 3, "username": "lana", "createdAt": "2024-06-15T09:00:00Z"},
        {"id": 4, "username": "demi"}
    ])
}

pub fn documents_json() -> Value {
    json!([
        {"id": 1, "fileName": "Annual Report 2024.pdf", "shelfId": 3, "status": "Indexed"},
        {"id": 2, "fileName": "Project Proposal.docx", "shelfId": 3, "status": "Processing"},
        {"id": 3, "fileName": "Meeting Notes.txt", "shelfId": 4}
    ])
}
