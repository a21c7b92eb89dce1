//! Integration tests for file upload, download, and file operations.

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::{MAX_UPLOAD, PUBLIC_URL, TestApp};

#[tokio::test]
async fn test_upload_then_download_round_trip() {
    let app = TestApp::new().await;
    let token = app.token("alice");
    let docs = app.create_folder(&token, "Docs", None).await;

    let upload = app
        .upload(&token, "report.pdf", b"%PDF-1.7 body", Some(&docs))
        .await;
    assert_eq!(upload.status, StatusCode::CREATED, "{:?}", upload.body);
    assert_eq!(upload.data()["name"], "report.pdf");
    assert_eq!(upload.data()["size"], 13);
    assert_eq!(upload.data()["content_type"], "pdf");
    assert_eq!(upload.data()["parent_id"], docs.as_str());
    let file_id = upload.id();

    let link = app
        .request(
            "GET",
            &format!("/api/files/{file_id}/download"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(link.status, StatusCode::OK);
    assert_eq!(link.data()["file_name"], "report.pdf");
    let url = link.data()["url"].as_str().unwrap();
    let path = url.strip_prefix(PUBLIC_URL).expect("URL on the public host");

    let (status, body) = app.get_raw(path).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"%PDF-1.7 body");

    let tampered = path.replace("signature=", "signature=00");
    let (status, _) = app.get_raw(&tampered).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_upload_limits() {
    let app = TestApp::new().await;
    let token = app.token("alice");

    let empty = app.upload(&token, "empty.txt", b"", None).await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty.error_code(), "VALIDATION");

    let too_big = vec![0u8; MAX_UPLOAD as usize + 1];
    let response = app.upload(&token, "big.bin", &too_big, None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let bad_name = app.upload(&token, "a|b.txt", b"x", None).await;
    assert_eq!(bad_name.error_code(), "INVALID_NAME");

    app.upload(&token, "notes.txt", b"x", None).await;
    let duplicate = app.upload(&token, "notes.txt", b"y", None).await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_file_and_folder_may_share_a_name() {
    let app = TestApp::new().await;
    let token = app.token("alice");
    app.create_folder(&token, "notes", None).await;

    let upload = app.upload(&token, "notes", b"x", None).await;
    assert_eq!(upload.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_rename_move_copy_delete_file() {
    let app = TestApp::new().await;
    let token = app.token("alice");
    let target = app.create_folder(&token, "Target", None).await;
    let file_id = app.upload(&token, "draft.txt", b"hello", None).await.id();

    let same = app
        .request(
            "PATCH",
            &format!("/api/files/{file_id}"),
            Some(json!({ "name": "draft.txt" })),
            Some(&token),
        )
        .await;
    assert_eq!(same.status, StatusCode::OK);

    let renamed = app
        .request(
            "PATCH",
            &format!("/api/files/{file_id}"),
            Some(json!({ "name": "final.txt" })),
            Some(&token),
        )
        .await;
    assert_eq!(renamed.data()["name"], "final.txt");

    let moved = app
        .request(
            "POST",
            &format!("/api/files/{file_id}/move"),
            Some(json!({ "target_folder_id": target })),
            Some(&token),
        )
        .await;
    assert_eq!(moved.status, StatusCode::OK);
    assert_eq!(moved.data()["parent_id"], target.as_str());

    let copy = app
        .request(
            "POST",
            &format!("/api/files/{file_id}/copy"),
            Some(json!({ "target_folder_id": target })),
            Some(&token),
        )
        .await;
    assert_eq!(copy.status, StatusCode::CREATED);
    assert_eq!(copy.data()["name"], "final.txt (copy)");
    let copy_id = copy.id();

    // Deleting the original keeps the shared blob for the copy.
    let deleted = app
        .request("DELETE", &format!("/api/files/{file_id}"), None, Some(&token))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let link = app
        .request(
            "GET",
            &format!("/api/files/{copy_id}/download"),
            None,
            Some(&token),
        )
        .await;
    let url = link.data()["url"].as_str().unwrap().to_string();
    let (status, body) = app.get_raw(url.strip_prefix(PUBLIC_URL).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"hello");

    app.request("DELETE", &format!("/api/files/{copy_id}"), None, Some(&token))
        .await;
    let (status, _) = app.get_raw(url.strip_prefix(PUBLIC_URL).unwrap()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_and_storage_usage() {
    let app = TestApp::new().await;
    let token = app.token("alice");
    let reports = app.create_folder(&token, "Reports", None).await;
    app.upload(&token, "q1-report.pdf", &[1u8; 300], Some(&reports))
        .await;
    app.upload(&token, "photo.png", &[2u8; 100], None).await;

    let short = app
        .request("GET", "/api/search?query=%20a%20", None, Some(&token))
        .await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);

    let hits = app
        .request("GET", "/api/search?query=REPORT", None, Some(&token))
        .await;
    assert_eq!(hits.status, StatusCode::OK);
    assert_eq!(hits.data()["folders"].as_array().unwrap().len(), 1);
    assert_eq!(hits.data()["files"][0]["name"], "q1-report.pdf");

    let usage = app.request("GET", "/api/storage", None, Some(&token)).await;
    assert_eq!(usage.status, StatusCode::OK);
    assert_eq!(usage.data()["storage_used"], 400);
    assert_eq!(usage.data()["file_count"], 2);
    assert_eq!(usage.data()["folder_count"], 1);
    assert_eq!(usage.data()["type_distribution"][0]["content_type"], "pdf");
    assert_eq!(usage.data()["type_distribution"][0]["percentage"], 75);
}
