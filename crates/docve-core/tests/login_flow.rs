//! Integration tests for the login, logout and signup flows.
//!
//! Each test runs against a wiremock server standing in for the Docve API.

mod fixtures;

use std::sync::Arc;

use docve_core::auth::{
    logout, AuthGate, Credentials, FileSessionStore, LoginError, LoginFlow, Navigation, Route,
    SessionStore, SharedSessionStore, SignupError, SignupFlow, SignupForm, LOGIN_REDIRECT_DELAY,
};
use docve_core::ApiClient;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn login_flow(server: &MockServer) -> (LoginFlow, Arc<docve_core::auth::MemorySessionStore>) {
    let (api, store) = fixtures::client(&server.uri(), None);
    (LoginFlow::new(api), store)
}

#[tokio::test]
async fn test_short_username_sends_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc123"})))
        .expect(0)
        .mount(&server)
        .await;

    let (flow, store) = login_flow(&server);
    let err = flow
        .login(&Credentials::new("ab", "secret123"))
        .await
        .unwrap_err();

    let fields = err.field_errors().expect("validation error");
    assert_eq!(
        fields.username.as_deref(),
        Some("Username must be at least 3 characters")
    );
    assert!(fields.password.is_none());
    assert!(store.get().is_none());
}

#[tokio::test]
async fn test_token_is_stored_exactly() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Auth/login"))
        .and(body_json(json!({"username": "admin", "password": "secret123"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc123"})))
        .expect(1)
        .mount(&server)
        .await;

    let (flow, store) = login_flow(&server);
    let success = flow
        .login(&Credentials::new("admin", "secret123"))
        .await
        .unwrap();

    assert_eq!(success.next, Route::Dashboard);
    assert_eq!(success.redirect_after, LOGIN_REDIRECT_DELAY);
    assert_eq!(store.get().as_deref(), Some("abc123"));
}

#[tokio::test]
async fn test_token_persists_to_file_store() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Auth/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"token": "eyJhbGciOi.payload.sig"})),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let store: SharedSessionStore = Arc::new(FileSessionStore::new(dir.path().to_path_buf()));
    let api = ApiClient::new(&server.uri(), store).unwrap();
    LoginFlow::new(api)
        .login(&Credentials::new("admin", "secret123"))
        .await
        .unwrap();

    // A fresh handle on the same directory sees the token
    let reopened = FileSessionStore::new(dir.path().to_path_buf());
    assert_eq!(reopened.get().as_deref(), Some("eyJhbGciOi.payload.sig"));
}

#[tokio::test]
async fn test_unauthorized_stores_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "User admin locked"})),
        )
        .mount(&server)
        .await;

    let (flow, store) = login_flow(&server);
    let err = flow
        .login(&Credentials::new("admin", "wrongpass"))
        .await
        .unwrap_err();

    assert!(matches!(err, LoginError::InvalidCredentials));
    assert_eq!(err.to_string(), "Invalid username or password");
    assert!(store.get().is_none());
}

#[tokio::test]
async fn test_bad_request_shows_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Auth/login"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "Account is disabled"})),
        )
        .mount(&server)
        .await;

    let (flow, _) = login_flow(&server);
    let err = flow
        .login(&Credentials::new("admin", "secret123"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Account is disabled");
}

#[tokio::test]
async fn test_server_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Auth/login"))
        .respond_with(ResponseTemplate::new(500).set_body_string("NullReferenceException"))
        .mount(&server)
        .await;

    let (flow, store) = login_flow(&server);
    let err = flow
        .login(&Credentials::new("admin", "secret123"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Server error. Please try again later.");
    assert!(store.get().is_none());
}

#[tokio::test]
async fn test_missing_token_is_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": {"id": 1}})))
        .mount(&server)
        .await;

    let (flow, store) = login_flow(&server);
    let err = flow
        .login(&Credentials::new("admin", "secret123"))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Login failed. Please check your credentials."
    );
    assert!(store.get().is_none());
}

#[tokio::test]
async fn test_unparsable_body_is_login_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let (flow, store) = login_flow(&server);
    let err = flow
        .login(&Credentials::new("admin", "secret123"))
        .await
        .unwrap_err();
    assert!(matches!(err, LoginError::MissingToken));
    assert_eq!(
        err.to_string(),
        "Login failed. Please check your credentials."
    );
    assert!(store.get().is_none());
}

#[tokio::test]
async fn test_empty_body_is_login_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Auth/login"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (flow, store) = login_flow(&server);
    let err = flow
        .login(&Credentials::new("admin", "secret123"))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Login failed. Please check your credentials."
    );
    assert!(store.get().is_none());
}

#[tokio::test]
async fn test_unreachable_server() {
    let (api, store) = fixtures::client(&fixtures::unreachable_base_url(), None);
    let err = LoginFlow::new(api)
        .login(&Credentials::new("admin", "secret123"))
        .await
        .unwrap_err();

    assert!(matches!(err, LoginError::Unreachable));
    assert_eq!(
        err.to_string(),
        "Unable to connect to server. Please check your internet connection."
    );
    assert!(store.get().is_none());
}

#[tokio::test]
async fn test_login_request_carries_no_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "fresh"})))
        .mount(&server)
        .await;

    let (api, store) = fixtures::client(&server.uri(), Some("stale"));
    LoginFlow::new(api)
        .login(&Credentials::new("admin", "secret123"))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
    assert_eq!(store.get().as_deref(), Some("fresh"));
}

#[tokio::test]
async fn test_login_then_logout_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc123"})))
        .mount(&server)
        .await;

    let (api, store) = fixtures::client(&server.uri(), None);
    let shared: SharedSessionStore = store.clone();
    let gate = AuthGate::new(shared.clone());
    assert_eq!(gate.resolve("/dashboard"), Navigation::Redirect(Route::Login));

    LoginFlow::new(api)
        .login(&Credentials::new("admin", "secret123"))
        .await
        .unwrap();
    assert_eq!(gate.resolve("/dashboard"), Navigation::Render(Route::Dashboard));
    assert_eq!(gate.resolve("/login"), Navigation::Redirect(Route::Dashboard));

    assert_eq!(logout(shared.as_ref()).unwrap(), Route::Login);
    assert!(store.get().is_none());
    assert_eq!(gate.resolve("/dashboard"), Navigation::Redirect(Route::Login));
}

fn signup_form() -> SignupForm {
    SignupForm {
        username: " newuser ".into(),
        email: "New.User@Email.com".into(),
        password: "secret123".into(),
        confirm_password: "secret123".into(),
    }
}

#[tokio::test]
async fn test_signup_posts_end_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Users"))
        .and(body_partial_json(json!({
            "username": "newuser",
            "email": "new.user@email.com",
            "role": "EndUser"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 9})))
        .expect(1)
        .mount(&server)
        .await;

    let (api, _) = fixtures::client(&server.uri(), None);
    let next = SignupFlow::new(api).register(&signup_form()).await.unwrap();
    assert_eq!(next, Route::Login);
}

#[tokio::test]
async fn test_signup_surfaces_server_field_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Users"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": {"Email": ["Email is already registered"]}
        })))
        .mount(&server)
        .await;

    let (api, _) = fixtures::client(&server.uri(), None);
    let err = SignupFlow::new(api)
        .register(&signup_form())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Registration failed. Please try again.");
    let fields = err.field_errors().expect("field errors");
    assert_eq!(fields["email"], "Email is already registered");
}

#[tokio::test]
async fn test_signup_mismatch_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Users"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let mut form = signup_form();
    form.confirm_password = "different".into();
    let (api, _) = fixtures::client(&server.uri(), None);
    let err = SignupFlow::new(api).register(&form).await.unwrap_err();
    assert!(matches!(err, SignupError::Validation(_)));
}
