//! Shared test helpers for integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use cloudio_api::{AppState, build_router};
use cloudio_auth::JwtDecoder;
use cloudio_core::config::AppConfig;
use cloudio_database::MemoryEntityStore;
use cloudio_storage::{BlobBackend, LocalBlobStore};

/// Secret the test tokens are signed with.
pub const JWT_SECRET: &str = "integration-jwt-secret";
/// Public URL the test server believes it is reachable at.
pub const PUBLIC_URL: &str = "http://cloudio.test";
/// Upload limit used by the test configuration.
pub const MAX_UPLOAD: u64 = 64 * 1024;

const BOUNDARY: &str = "cloudio-test-boundary";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Keeps the blob directory alive for the duration of the test
    _blob_dir: TempDir,
}

impl TestApp {
    /// Create a new test application
    pub async fn new() -> Self {
        let blob_dir = tempfile::tempdir().expect("Failed to create blob dir");

        let mut config = AppConfig::default();
        config.server.public_url = PUBLIC_URL.to_string();
        config.auth.jwt_secret = JWT_SECRET.to_string();
        config.storage.max_upload_size_bytes = MAX_UPLOAD;
        config.storage.local.root_path = blob_dir.path().to_string_lossy().into_owned();
        config.storage.local.signing_secret = "integration-signing-secret".to_string();

        let local = LocalBlobStore::new(
            &config.storage.local.root_path,
            PUBLIC_URL,
            &config.storage.local.signing_secret,
        )
        .await
        .expect("Failed to init blob store");
        let jwt_decoder = JwtDecoder::new(&config.auth).expect("Failed to init decoder");

        let state = AppState::new(
            config,
            Arc::new(MemoryEntityStore::new()),
            BlobBackend::from_local(local),
            jwt_decoder,
        );

        Self {
            router: build_router(state),
            _blob_dir: blob_dir,
        }
    }

    /// Issue a bearer token for `subject`, as the identity provider would
    pub fn token(&self, subject: &str) -> String {
        let claims = json!({
            "sub": subject,
            "exp": chrono::Utc::now().timestamp() + 3600,
        });
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
        )
        .expect("Failed to sign token")
    }

    /// Make a JSON request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        self.send(req).await
    }

    /// Upload `data` as `file_name` through the multipart endpoint
    pub async fn upload(
        &self,
        token: &str,
        file_name: &str,
        data: &[u8],
        folder_id: Option<&str>,
    ) -> TestResponse {
        let mut body = Vec::new();
        if let Some(folder_id) = folder_id {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"folder_id\"\r\n\r\n{folder_id}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let req = Request::builder()
            .method("POST")
            .uri("/api/files")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::from(body))
            .expect("Failed to build request");

        self.send(req).await
    }

    /// GET a path without credentials and return the raw body
    pub async fn get_raw(&self, path: &str) -> (StatusCode, Bytes) {
        let req = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .expect("Failed to build request");
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");
        (status, bytes)
    }

    /// Create a folder and return its id
    pub async fn create_folder(&self, token: &str, name: &str, parent_id: Option<&str>) -> String {
        let response = self
            .request(
                "POST",
                "/api/folders",
                Some(json!({ "name": name, "parent_id": parent_id })),
                Some(token),
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Create folder failed: {:?}",
            response.body
        );
        response.id()
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// The `data` payload of a success response
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// The `data.id` of a success response
    pub fn id(&self) -> String {
        self.data()["id"]
            .as_str()
            .expect("No id in response")
            .to_string()
    }

    /// The `error` code of a failure response
    pub fn error_code(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }

    /// Names of the items in a listing response
    pub fn names(&self) -> Vec<String> {
        self.data()
            .as_array()
            .expect("Expected a list")
            .iter()
            .filter_map(|item| item["name"].as_str().map(str::to_string))
            .collect()
    }
}
