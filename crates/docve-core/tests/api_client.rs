//! Integration tests for the REST client against a mock Docve API.

mod fixtures;

use std::io::Write;
use std::time::Duration;

use docve_core::api::{run_cancellable, ApiError, UploadProgress};
use docve_core::models::{DocumentStatus, NewShelf, ShelfType, UploadRequest};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_counts(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/Users/count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(12)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Users"))
        .and(query_param("active", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}, {"id": 2}])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_protected_calls_carry_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Shelves"))
        .and(header("authorization", "Bearer abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Q4 Financial Reports", "type": "Personal", "docs": 15}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (api, _) = fixtures::client(&server.uri(), Some("abc123"));
    let shelves = api.shelves(None).await.unwrap();
    assert_eq!(shelves.len(), 1);
    assert_eq!(shelves[0].name, "Q4 Financial Reports");
    assert_eq!(shelves[0].document_count, Some(15));
}

#[tokio::test]
async fn test_shelf_search_and_create() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Shelves"))
        .and(query_param("search", "legal"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "7", "name": "Legal Contracts", "type": "Shared"}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/Shelves"))
        .and(body_json(json!({"name": "Research Papers", "type": "Shared"})))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"id": 8, "name": "Research Papers", "type": "Shared"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (api, _) = fixtures::client(&server.uri(), Some("abc123"));
    let found = api.shelves(Some(" legal ")).await.unwrap();
    assert!(found[0].is_shared());

    let created = api
        .create_shelf(&NewShelf::new("Research Papers", "", ShelfType::Shared))
        .await
        .unwrap();
    assert_eq!(created.id, "8");
}

#[tokio::test]
async fn test_unauthorized_is_flagged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Documents/shelf/3"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (api, _) = fixtures::client(&server.uri(), Some("expired"));
    let err = api.shelf_documents("3").await.unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_mark_and_delete_accept_empty_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Documents/9/mark-indexed"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/Documents/9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (api, _) = fixtures::client(&server.uri(), Some("abc123"));
    api.mark_document("9", DocumentStatus::Indexed).await.unwrap();
    api.delete_document("9").await.unwrap();

    let err = api
        .mark_document("9", DocumentStatus::Processing)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));
}

#[tokio::test]
async fn test_document_search_term() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Documents/search"))
        .and(query_param("searchTerm", "annual report"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::documents_json()))
        .expect(1)
        .mount(&server)
        .await;

    let (api, _) = fixtures::client(&server.uri(), Some("abc123"));
    let docs = api.search_documents("annual report").await.unwrap();
    assert_eq!(docs.len(), 3);
    assert_eq!(docs[0].status(), DocumentStatus::Indexed);
}

#[tokio::test]
async fn test_dashboard_stats_combines_counts() {
    let server = MockServer::start().await;
    mount_counts(&server).await;
    Mock::given(method("GET"))
        .and(path("/Documents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::documents_json()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Health"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "Healthy", "storage": "1.2 TB"})),
        )
        .mount(&server)
        .await;

    let (api, _) = fixtures::client(&server.uri(), Some("abc123"));
    let stats = api.dashboard_stats().await.unwrap();
    assert_eq!(stats.total_users, 12);
    assert_eq!(stats.active_users, 2);
    assert_eq!(stats.documents_processed, 3);
    assert_eq!(stats.storage_used, "1.2 TB");
    assert!(stats.health.unwrap().is_healthy());
}

#[tokio::test]
async fn test_dashboard_stats_tolerates_health_failure() {
    let server = MockServer::start().await;
    mount_counts(&server).await;
    Mock::given(method("GET"))
        .and(path("/Documents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Health"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Unhealthy"))
        .mount(&server)
        .await;

    let (api, _) = fixtures::client(&server.uri(), Some("abc123"));
    let stats = api.dashboard_stats().await.unwrap();
    assert_eq!(stats.documents_processed, 0);
    assert!(stats.health.is_none());
    assert_eq!(stats.storage_used, "N/A");
}

#[tokio::test]
async fn test_dashboard_stats_fails_when_a_count_fails() {
    let server = MockServer::start().await;
    mount_counts(&server).await;
    Mock::given(method("GET"))
        .and(path("/Documents"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Healthy"))
        .mount(&server)
        .await;

    let (api, _) = fixtures::client(&server.uri(), Some("abc123"));
    let err = api.dashboard_stats().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_active_users_falls_back_to_total() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Users"))
        .and(query_param("active", "true"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Users/count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 40})))
        .mount(&server)
        .await;

    let (api, _) = fixtures::client(&server.uri(), Some("abc123"));
    assert_eq!(api.active_users_count().await.unwrap(), 40);
}

#[tokio::test]
async fn test_recent_activity_falls_back_to_new_users() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Activity/recent"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Users"))
        .and(query_param("sort", "createdAt"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::users_json()))
        .mount(&server)
        .await;

    let (api, _) = fixtures::client(&server.uri(), Some("abc123"));
    let activity = api.recent_activity().await.unwrap();
    let actions: Vec<&str> = activity.iter().map(|a| a.action.as_str()).collect();
    assert_eq!(
        actions,
        vec![
            "Created new user: phoenix@email.com",
            "Created new user: olivia@email.com",
            "Created new user: lana",
        ]
    );
    assert!(activity.iter().all(|a| a.admin == "System"));
}

#[tokio::test]
async fn test_health_plain_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Healthy"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Health/version"))
        .respond_with(ResponseTemplate::new(200).set_body_string("1.4.2"))
        .mount(&server)
        .await;

    let (api, _) = fixtures::client(&server.uri(), None);
    assert!(api.health().await.unwrap().is_healthy());
    assert_eq!(api.health_version().await.unwrap(), "1.4.2");
}

#[tokio::test]
async fn test_cancelled_request_yields_cancelled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Shelves"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let (api, _) = fixtures::client(&server.uri(), Some("abc123"));
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let result = run_cancellable(&token, api.shelves(None)).await;
    assert!(matches!(result, Err(ApiError::Cancelled)));
}

#[tokio::test]
async fn test_upload_reports_progress_to_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Documents/upload"))
        .and(header("authorization", "Bearer abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 31, "fileName": "report.pdf", "shelfId": 3, "status": "Processing"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let file_path = dir.path().join("report.pdf");
    let mut file = std::fs::File::create(&file_path).unwrap();
    file.write_all(&vec![b'x'; 256 * 1024]).unwrap();
    drop(file);

    let (api, _) = fixtures::client(&server.uri(), Some("abc123"));
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<UploadProgress>();
    let request = UploadRequest::new(&file_path, "3").with_tags("finance");
    let doc = api.upload_document(&request, Some(tx)).await.unwrap();
    assert_eq!(doc.unwrap().id, "31");

    let mut percents = Vec::new();
    while let Ok(p) = rx.try_recv() {
        percents.push(p.percent);
    }
    assert!(!percents.is_empty());
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(percents.last(), Some(&100));

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"shelfId\""));
    assert!(body.contains("name=\"tags\""));
    assert!(body.contains("filename=\"report.pdf\""));
    assert!(!body.contains("name=\"description\""));
}

#[tokio::test]
async fn test_upload_missing_file() {
    let (api, _) = fixtures::client("http://127.0.0.1:9", Some("abc123"));
    let err = api
        .upload_document(&UploadRequest::new("/nonexistent/file.pdf", "3"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::File { .. }));
}
