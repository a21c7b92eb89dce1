//! Integration tests for authentication and the public endpoints.

use axum::http::StatusCode;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::new().await;

    for path in ["/api/folders", "/api/files", "/api/storage", "/api/search?query=ab"] {
        let response = app.request("GET", path, None, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{path}");
        assert_eq!(response.error_code(), "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn test_bad_token_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app
        .request("GET", "/api/folders", None, Some("not-a-jwt"))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "ok");
    assert_eq!(response.data()["store"]["backend"], "memory");
    assert_eq!(response.data()["blobs"]["backend"], "local");
}

#[tokio::test]
async fn test_unsigned_blob_request_is_rejected() {
    let app = TestApp::new().await;

    let (status, _) = app
        .get_raw("/api/blobs/cloudio/alice/abc?expires=0&signature=00")
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
