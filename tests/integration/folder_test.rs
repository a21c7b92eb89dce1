//! Integration tests for folder operations.

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_create_and_list_folders() {
    let app = TestApp::new().await;
    let token = app.token("alice");

    let docs = app.create_folder(&token, "Docs", None).await;
    app.create_folder(&token, "Archive", None).await;
    app.create_folder(&token, "Invoices", Some(&docs)).await;

    let top = app.request("GET", "/api/folders", None, Some(&token)).await;
    assert_eq!(top.status, StatusCode::OK);
    assert_eq!(top.names(), vec!["Archive", "Docs"]);

    let nested = app
        .request(
            "GET",
            &format!("/api/folders?parent_id={docs}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(nested.names(), vec!["Invoices"]);
}

#[tokio::test]
async fn test_duplicate_folder_conflicts() {
    let app = TestApp::new().await;
    let token = app.token("alice");
    app.create_folder(&token, "Docs", None).await;

    let response = app
        .request(
            "POST",
            "/api/folders",
            Some(json!({ "name": "Docs" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.error_code(), "CONFLICT");

    // Another user has an independent namespace.
    let bob = app.token("bob");
    app.create_folder(&bob, "Docs", None).await;
}

#[tokio::test]
async fn test_invalid_folder_name() {
    let app = TestApp::new().await;
    let token = app.token("alice");

    for name in ["", "a/b", "CON", "what?"] {
        let response = app
            .request(
                "POST",
                "/api/folders",
                Some(json!({ "name": name })),
                Some(&token),
            )
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{name:?}");
        assert_eq!(response.error_code(), "INVALID_NAME");
    }
}

#[tokio::test]
async fn test_rename_folder() {
    let app = TestApp::new().await;
    let token = app.token("alice");
    let docs = app.create_folder(&token, "Docs", None).await;
    app.create_folder(&token, "Taken", None).await;

    let renamed = app
        .request(
            "PATCH",
            &format!("/api/folders/{docs}"),
            Some(json!({ "name": "Documents" })),
            Some(&token),
        )
        .await;
    assert_eq!(renamed.status, StatusCode::OK);
    assert_eq!(renamed.data()["name"], "Documents");

    let clash = app
        .request(
            "PATCH",
            &format!("/api/folders/{docs}"),
            Some(json!({ "name": "Taken" })),
            Some(&token),
        )
        .await;
    assert_eq!(clash.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_move_folder_into_descendant_is_rejected() {
    let app = TestApp::new().await;
    let token = app.token("alice");
    let parent = app.create_folder(&token, "Parent", None).await;
    let child = app.create_folder(&token, "Child", Some(&parent)).await;

    for target in [&parent, &child] {
        let response = app
            .request(
                "POST",
                &format!("/api/folders/{parent}/move"),
                Some(json!({ "target_folder_id": target })),
                Some(&token),
            )
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error_code(), "INVALID_OPERATION");
    }

    let to_root = app
        .request(
            "POST",
            &format!("/api/folders/{child}/move"),
            Some(json!({ "targetFolderId": null })),
            Some(&token),
        )
        .await;
    assert_eq!(to_root.status, StatusCode::OK);
    assert!(to_root.data()["parent_id"].is_null());
}

#[tokio::test]
async fn test_copy_folder_recursively() {
    let app = TestApp::new().await;
    let token = app.token("alice");
    let source = app.create_folder(&token, "Project", None).await;
    let sub = app.create_folder(&token, "Specs", Some(&source)).await;
    let upload = app
        .upload(&token, "design.md", b"# Design", Some(&sub))
        .await;
    assert_eq!(upload.status, StatusCode::CREATED);

    let copy = app
        .request(
            "POST",
            &format!("/api/folders/{source}/copy"),
            Some(json!({ "target_folder_id": null })),
            Some(&token),
        )
        .await;
    assert_eq!(copy.status, StatusCode::CREATED);
    assert_eq!(copy.data()["name"], "Project (copy)");
    let copy_id = copy.id();
    assert_ne!(copy_id, source);

    let sub_copies = app
        .request(
            "GET",
            &format!("/api/folders?parent_id={copy_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(sub_copies.names(), vec!["Specs"]);
    let sub_copy_id = sub_copies.data()[0]["id"].as_str().unwrap().to_string();
    assert_ne!(sub_copy_id, sub);

    let files = app
        .request(
            "GET",
            &format!("/api/files?folder_id={sub_copy_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(files.names(), vec!["design.md"]);
    assert_eq!(
        files.data()[0]["blob_key"],
        upload.data()["blob_key"],
        "copies share the source blob"
    );

    let second = app
        .request(
            "POST",
            &format!("/api/folders/{source}/copy"),
            Some(json!({})),
            Some(&token),
        )
        .await;
    assert_eq!(second.data()["name"], "Project (copy 2)");
}

#[tokio::test]
async fn test_delete_folder_cascades() {
    let app = TestApp::new().await;
    let token = app.token("alice");
    let top = app.create_folder(&token, "Top", None).await;
    let mid = app.create_folder(&token, "Mid", Some(&top)).await;
    app.upload(&token, "a.txt", b"a", Some(&mid)).await;
    let keep = app.create_folder(&token, "Keep", None).await;

    let response = app
        .request("DELETE", &format!("/api/folders/{top}"), None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    for id in [&top, &mid] {
        let gone = app
            .request("GET", &format!("/api/folders/{id}"), None, Some(&token))
            .await;
        assert_eq!(gone.status, StatusCode::NOT_FOUND);
    }
    let kept = app
        .request("GET", &format!("/api/folders/{keep}"), None, Some(&token))
        .await;
    assert_eq!(kept.status, StatusCode::OK);

    let search = app
        .request("GET", "/api/search?query=a.txt", None, Some(&token))
        .await;
    assert_eq!(search.data()["files"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_breadcrumbs() {
    let app = TestApp::new().await;
    let token = app.token("alice");
    let a = app.create_folder(&token, "A", None).await;
    let b = app.create_folder(&token, "B", Some(&a)).await;
    let c = app.create_folder(&token, "C", Some(&b)).await;

    let response = app
        .request(
            "GET",
            &format!("/api/folders/{c}/breadcrumbs"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.names(), vec!["A", "B", "C"]);
}

#[tokio::test]
async fn test_foreign_folder_is_not_found() {
    let app = TestApp::new().await;
    let alice = app.token("alice");
    let mallory = app.token("mallory");
    let docs = app.create_folder(&alice, "Docs", None).await;

    let get = app
        .request("GET", &format!("/api/folders/{docs}"), None, Some(&mallory))
        .await;
    assert_eq!(get.status, StatusCode::NOT_FOUND);

    let delete = app
        .request("DELETE", &format!("/api/folders/{docs}"), None, Some(&mallory))
        .await;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);

    let create_inside = app
        .request(
            "POST",
            "/api/folders",
            Some(json!({ "name": "Sneaky", "parent_id": docs })),
            Some(&mallory),
        )
        .await;
    assert_eq!(create_inside.status, StatusCode::NOT_FOUND);

    let still_there = app
        .request("GET", &format!("/api/folders/{docs}"), None, Some(&alice))
        .await;
    assert_eq!(still_there.status, StatusCode::OK);
}
