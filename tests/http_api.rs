//! HTTP API tests
//!
//! Drive the full router (body limit, auth extractor, handlers) with
//! `oneshot` against a temp-dir store and an on-disk SQLite database.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use hashvault::auth::crypto::PasswordPolicy;
use hashvault::auth::{Credentials, PasswordAuthenticator, SqliteUserRepository};
use hashvault::config::StoreConfig;
use hashvault::database::Database;
use hashvault::file_storage::{FileService, LocalBackend, SqliteLedger};
use hashvault::http_server::{HttpServer, StorageState};

const HELLO_DIGEST: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
const BOUNDARY: &str = "hashvault-test-boundary";

struct TestApp {
    _temp: TempDir,
    config: StoreConfig,
    router: Router,
    alice: Credentials,
    bob: Credentials,
}

fn setup_with_limit(max_upload_bytes: usize) -> TestApp {
    let temp = TempDir::new().unwrap();
    let config = StoreConfig {
        data_dir: temp.path().to_path_buf(),
        max_upload_bytes,
        ..StoreConfig::default()
    };

    let db = Arc::new(Database::open(&config.database_path()).unwrap());
    let authenticator =
        PasswordAuthenticator::new(SqliteUserRepository::new(db.clone()), PasswordPolicy::default());
    authenticator.register("alice", "password123").unwrap();
    authenticator.register("bob", "password456").unwrap();

    let backend = LocalBackend::open(config.storage_dir()).unwrap();
    let state = Arc::new(StorageState::new(
        FileService::new(backend, SqliteLedger::new(db)),
        Arc::new(authenticator),
    ));
    let router = HttpServer::with_state(config.clone(), state).router();

    TestApp {
        _temp: temp,
        config,
        router,
        alice: Credentials::new("alice", "password123"),
        bob: Credentials::new("bob", "password456"),
    }
}

fn setup() -> TestApp {
    setup_with_limit(StoreConfig::default().max_upload_bytes)
}

fn multipart_body(field: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"upload.bin\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(credentials: Option<&Credentials>, field: &str, data: &[u8]) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(credentials) = credentials {
        builder = builder.header(header::AUTHORIZATION, credentials.to_basic_header());
    }
    builder.body(Body::from(multipart_body(field, data))).unwrap()
}

fn delete_request(credentials: &Credentials, digest: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(format!("/delete/{digest}"))
        .header(header::AUTHORIZATION, credentials.to_basic_header())
        .body(Body::empty())
        .unwrap()
}

fn download_request(digest: &str) -> Request<Body> {
    Request::builder()
        .uri(format!("/download/{digest}"))
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

fn json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = setup();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["status"], "ok");
}

#[tokio::test]
async fn upload_returns_digest_and_stores_sharded() {
    let app = setup();

    let (status, body) = send(&app, upload_request(Some(&app.alice), "file", b"hello")).await;
    assert_eq!(status, StatusCode::CREATED);

    let body = json(&body);
    assert_eq!(body["hash"], HELLO_DIGEST);
    assert_eq!(body["message"], "File added successfully");

    let path = app.config.storage_dir().join("2c").join(HELLO_DIGEST);
    assert_eq!(std::fs::read(path).unwrap(), b"hello");
}

#[tokio::test]
async fn download_needs_no_credentials() {
    let app = setup();
    send(&app, upload_request(Some(&app.alice), "file", b"hello")).await;

    let response = app
        .router
        .clone()
        .oneshot(download_request(HELLO_DIGEST))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/octet-stream"
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"hello");
}

#[tokio::test]
async fn download_unknown_and_malformed_is_not_found() {
    let app = setup();

    let (status, body) = send(&app, download_request(&"0".repeat(64))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["error"], "File not found");

    let (status, _) = send(&app, download_request("not-a-digest")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_without_credentials_is_challenged() {
    let app = setup();

    let response = app
        .router
        .clone()
        .oneshot(upload_request(None, "file", b"hello"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));

    // nothing was written
    assert!(!app.config.storage_dir().join("2c").join(HELLO_DIGEST).exists());
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = setup();
    let imposter = Credentials::new("alice", "wrong-password1");

    let (status, _) = send(&app, upload_request(Some(&imposter), "file", b"hello")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn upload_without_file_part_is_bad_request() {
    let app = setup();

    let (status, body) = send(&app, upload_request(Some(&app.alice), "attachment", b"hello")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().contains("No file part"));
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let app = setup_with_limit(1024);

    let (status, _) = send(&app, upload_request(Some(&app.alice), "file", &[7u8; 4096])).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn shared_object_survives_until_last_owner_deletes() {
    let app = setup();
    send(&app, upload_request(Some(&app.alice), "file", b"hello")).await;
    send(&app, upload_request(Some(&app.bob), "file", b"hello")).await;

    let (status, body) = send(&app, delete_request(&app.alice, HELLO_DIGEST)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["message"], "File deleted");

    let (status, _) = send(&app, download_request(HELLO_DIGEST)).await;
    assert_eq!(status, StatusCode::OK);

    // alice no longer owns it
    let (status, _) = send(&app, delete_request(&app.alice, HELLO_DIGEST)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, delete_request(&app.bob, HELLO_DIGEST)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, download_request(HELLO_DIGEST)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_owner_delete_looks_like_missing() {
    let app = setup();
    send(&app, upload_request(Some(&app.alice), "file", b"hello")).await;

    let (status, body) = send(&app, delete_request(&app.bob, HELLO_DIGEST)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["error"], "File not found");

    let (status, _) = send(&app, download_request(HELLO_DIGEST)).await;
    assert_eq!(status, StatusCode::OK);
}
