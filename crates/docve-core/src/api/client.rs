//! API client for the Docve REST API.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::SharedSessionStore;
use crate::models::{
    AccessGrant, Document, DocumentStatus, DocumentUpdate, HealthReport, NewShelf, NewUser,
    PasswordChange, Shelf, ShelfAccess, User, UserProfile, UserQuery,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// `POST /Auth/login` response. The token may be missing even on 2xx.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
}

impl LoginResponse {
    /// The token, if the server sent a non-empty one.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}

/// API client for Docve.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    store: SharedSessionStore,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url`. The token is read from
    /// `store` on every request, so a login or logout elsewhere takes effect
    /// immediately.
    pub fn new(base_url: &str, store: SharedSessionStore) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &SharedSessionStore {
        &self.store
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer token, if one is stored.
    pub(super) fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.store.get() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub(crate) fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.authorized(self.client.request(method, self.url(path)))
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let url = response.url().path().to_string();
            let body = response.text().await.unwrap_or_default();
            debug!(
                status = status.as_u16(),
                url = %url,
                body = %ApiError::truncate_body(&body),
                "Request failed"
            );
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Send once and check the status. No retries.
    pub(super) async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(ApiError::from_reqwest)?;
        Self::check_response(response).await
    }

    /// Decode a JSON body. Read as text first so a bad body can be logged.
    pub(super) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let url = response.url().path().to_string();
        let text = response.text().await.map_err(ApiError::from_reqwest)?;
        serde_json::from_str(&text).map_err(|e| {
            warn!(url = %url, error = %e, body = %ApiError::truncate_body(&text), "Failed to parse response");
            ApiError::InvalidResponse(e.to_string())
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.request(reqwest::Method::GET, path)).await?;
        Self::read_json(response).await
    }

    async fn get_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T, ApiError> {
        let builder = self.request(reqwest::Method::GET, path).query(query);
        let response = self.send(builder).await?;
        Self::read_json(response).await
    }

    async fn get_text(&self, path: &str) -> Result<String, ApiError> {
        let response = self.send(self.request(reqwest::Method::GET, path)).await?;
        response.text().await.map_err(ApiError::from_reqwest)
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let builder = self.request(reqwest::Method::POST, path).json(body);
        let response = self.send(builder).await?;
        Self::read_json(response).await
    }

    /// Send a request whose response body is irrelevant (may be empty).
    async fn send_empty(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        self.send(builder).await.map(|_| ())
    }

    // ===== Auth =====

    /// `POST /Auth/login`. The only request sent without a bearer token.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let builder = self
            .client
            .post(self.url("/Auth/login"))
            .json(&LoginRequest { username, password });
        let response = self.send(builder).await?;
        Self::read_json(response).await
    }

    /// `GET /Auth/validate`: succeeds while the stored token is accepted.
    pub async fn validate_token(&self) -> Result<(), ApiError> {
        self.send_empty(self.request(reqwest::Method::GET, "/Auth/validate"))
            .await
    }

    // ===== Shelves =====

    pub async fn shelves(&self, search: Option<&str>) -> Result<Vec<Shelf>, ApiError> {
        match search.map(str::trim).filter(|s| !s.is_empty()) {
            Some(term) => self.get_query("/Shelves", &[("search", term)]).await,
            None => self.get("/Shelves").await,
        }
    }

    pub async fn shelf(&self, id: &str) -> Result<Shelf, ApiError> {
        self.get(&format!("/Shelves/{}", id)).await
    }

    pub async fn create_shelf(&self, shelf: &NewShelf) -> Result<Shelf, ApiError> {
        self.post("/Shelves", shelf).await
    }

    pub async fn update_shelf(&self, id: &str, shelf: &NewShelf) -> Result<(), ApiError> {
        let builder = self
            .request(reqwest::Method::PUT, &format!("/Shelves/{}", id))
            .json(shelf);
        self.send_empty(builder).await
    }

    pub async fn delete_shelf(&self, id: &str) -> Result<(), ApiError> {
        self.send_empty(self.request(reqwest::Method::DELETE, &format!("/Shelves/{}", id)))
            .await
    }

    pub async fn shelf_access(&self, id: &str) -> Result<Vec<ShelfAccess>, ApiError> {
        self.get(&format!("/Shelves/{}/access", id)).await
    }

    pub async fn grant_shelf_access(&self, id: &str, grant: &AccessGrant) -> Result<(), ApiError> {
        let builder = self
            .request(reqwest::Method::POST, &format!("/Shelves/{}/access", id))
            .json(grant);
        self.send_empty(builder).await
    }

    pub async fn revoke_shelf_access(&self, id: &str, user_id: &str) -> Result<(), ApiError> {
        let path = format!("/Shelves/{}/access/{}", id, user_id);
        self.send_empty(self.request(reqwest::Method::DELETE, &path))
            .await
    }

    // ===== Documents =====

    pub async fn documents(&self) -> Result<Vec<Document>, ApiError> {
        self.get("/Documents").await
    }

    pub async fn document(&self, id: &str) -> Result<Document, ApiError> {
        self.get(&format!("/Documents/{}", id)).await
    }

    pub async fn shelf_documents(&self, shelf_id: &str) -> Result<Vec<Document>, ApiError> {
        self.get(&format!("/Documents/shelf/{}", shelf_id)).await
    }

    pub async fn search_documents(&self, term: &str) -> Result<Vec<Document>, ApiError> {
        self.get_query("/Documents/search", &[("searchTerm", term.trim())])
            .await
    }

    pub async fn update_document(&self, id: &str, update: &DocumentUpdate) -> Result<(), ApiError> {
        let builder = self
            .request(reqwest::Method::PUT, &format!("/Documents/{}", id))
            .json(update);
        self.send_empty(builder).await
    }

    pub async fn delete_document(&self, id: &str) -> Result<(), ApiError> {
        self.send_empty(self.request(reqwest::Method::DELETE, &format!("/Documents/{}", id)))
            .await
    }

    /// Flip a document's processing state. Only Indexed, Failed and Removed
    /// have endpoints.
    pub async fn mark_document(&self, id: &str, status: DocumentStatus) -> Result<(), ApiError> {
        let endpoint = status.mark_endpoint().ok_or_else(|| {
            ApiError::BadRequest(Some(format!("Cannot mark a document as {}", status.label())))
        })?;
        let path = format!("/Documents/{}/{}", id, endpoint);
        self.send_empty(self.request(reqwest::Method::POST, &path))
            .await
    }

    // ===== Users =====

    pub async fn users(&self, query: &UserQuery) -> Result<Vec<User>, ApiError> {
        if query.is_empty() {
            self.get("/Users").await
        } else {
            self.get_query("/Users", query).await
        }
    }

    /// `GET /Users` with parameters, returned raw: depending on the filter the
    /// service answers with an array or a bare count.
    pub(super) async fn users_raw(&self, query: &UserQuery) -> Result<Value, ApiError> {
        self.get_query("/Users", query).await
    }

    pub async fn user(&self, id: &str) -> Result<User, ApiError> {
        self.get(&format!("/Users/{}", id)).await
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<Value, ApiError> {
        let builder = self.request(reqwest::Method::POST, "/Users").json(user);
        let response = self.send(builder).await?;
        let text = response.text().await.map_err(ApiError::from_reqwest)?;
        Ok(serde_json::from_str(&text).unwrap_or(Value::Null))
    }

    pub async fn update_user(&self, id: &str, user: &Value) -> Result<(), ApiError> {
        let builder = self
            .request(reqwest::Method::PUT, &format!("/Users/{}", id))
            .json(user);
        self.send_empty(builder).await
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), ApiError> {
        self.send_empty(self.request(reqwest::Method::DELETE, &format!("/Users/{}", id)))
            .await
    }

    pub async fn change_password(&self, id: &str, change: &PasswordChange) -> Result<(), ApiError> {
        let builder = self
            .request(reqwest::Method::POST, &format!("/Users/{}/change-password", id))
            .json(change);
        self.send_empty(builder).await
    }

    /// `GET /Users/count`, as whatever JSON the service sends.
    pub async fn users_count_raw(&self) -> Result<Value, ApiError> {
        self.get("/Users/count").await
    }

    pub async fn create_user_profile(&self, id: &str, profile: &UserProfile) -> Result<(), ApiError> {
        let builder = self
            .request(reqwest::Method::POST, &format!("/Users/{}/profile", id))
            .json(profile);
        self.send_empty(builder).await
    }

    pub async fn update_user_profile(&self, id: &str, profile: &UserProfile) -> Result<(), ApiError> {
        let builder = self
            .request(reqwest::Method::PUT, &format!("/Users/{}/profile", id))
            .json(profile);
        self.send_empty(builder).await
    }

    pub async fn delete_user_profile(&self, id: &str) -> Result<(), ApiError> {
        let path = format!("/Users/{}/profile", id);
        self.send_empty(self.request(reqwest::Method::DELETE, &path))
            .await
    }

    // ===== Health =====

    pub async fn health(&self) -> Result<HealthReport, ApiError> {
        let body = self.get_text("/Health").await?;
        Ok(HealthReport::from_body(&body))
    }

    pub async fn health_live(&self) -> Result<String, ApiError> {
        self.get_text("/Health/live").await
    }

    pub async fn health_ready(&self) -> Result<String, ApiError> {
        self.get_text("/Health/ready").await
    }

    pub async fn health_version(&self) -> Result<String, ApiError> {
        self.get_text("/Health/version").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MemorySessionStore, SessionStore};
    use std::sync::Arc;

    #[test]
    fn test_base_url_trailing_slash() {
        let store = Arc::new(MemorySessionStore::new());
        let api = ApiClient::new("https://docve.example/api/", store).unwrap();
        assert_eq!(api.base_url(), "https://docve.example/api");
        assert_eq!(api.url("/Shelves"), "https://docve.example/api/Shelves");
    }

    #[test]
    fn test_login_response_token() {
        let resp: LoginResponse = serde_json::from_str(r#"{"token": "abc123"}"#).unwrap();
        assert_eq!(resp.token(), Some("abc123"));

        let resp: LoginResponse = serde_json::from_str(r#"{"token": ""}"#).unwrap();
        assert_eq!(resp.token(), None);

        let resp: LoginResponse = serde_json::from_str(r#"{"user": {"id": 1}}"#).unwrap();
        assert_eq!(resp.token(), None);
    }

    #[test]
    fn test_bearer_header_follows_store() {
        let store = Arc::new(MemorySessionStore::new());
        let api = ApiClient::new("http://localhost", store.clone()).unwrap();

        let req = api.request(reqwest::Method::GET, "/Shelves").build().unwrap();
        assert!(req.headers().get(reqwest::header::AUTHORIZATION).is_none());

        store.set("abc123").unwrap();
        let req = api.request(reqwest::Method::GET, "/Shelves").build().unwrap();
        assert_eq!(
            req.headers().get(reqwest::header::AUTHORIZATION).unwrap(),
            "Bearer abc123"
        );
    }
}
