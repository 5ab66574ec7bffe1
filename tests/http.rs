#![cfg(feature = "server")]

pub mod helpers;
use self::helpers::{FlakyDocumentStore, FlakyObjectStore, TRACER, TestStores, score_form};

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use score_upload::http::{self, AppState};
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt as _;

fn app(stores: &TestStores) -> Router {
    http::router(AppState::new(stores.orchestrator()))
}

async fn json_body(res: Response) -> Value {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn assert_cors(res: &Response) {
    let headers = res.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
        "Content-Type, Authorization"
    );
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_METHODS],
        "GET, POST, PUT, DELETE, OPTIONS"
    );
}

fn submit(uri: &str, content_type: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(body.into())
        .unwrap()
}

#[tokio::test]
async fn complete_submission_returns_the_record_id() {
    let _ = &*TRACER;

    let stores = TestStores::new();
    let form = score_form();
    let req = submit("/api/scores", &form.content_type(), form.build());
    let res = app(&stores).oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_cors(&res);
    let body = json_body(res).await;
    assert_eq!(body["success"], true);
    let record_id = body["data"].as_str().unwrap();
    assert!(!record_id.is_empty());

    let docs = stores.stored_documents().documents();
    assert_eq!(docs.len(), 1);
    assert_eq!(&*docs[0].id, record_id);
    assert!(docs[0].document["pdf"].is_string());
    assert!(docs[0].document["audio"].is_string());
}

#[tokio::test]
async fn legacy_path_and_base64_transport() {
    let _ = &*TRACER;

    let stores = TestStores::new();
    let form = score_form();
    let content_type = form.content_type();
    let encoded = STANDARD.encode(form.build());

    let req = Request::builder()
        .method(Method::POST)
        .uri("/add-library-score")
        .header(header::CONTENT_TYPE, content_type)
        .header("x-body-encoding", "base64")
        .body(Body::from(encoded))
        .unwrap();
    let res = app(&stores).oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(stores.stored_documents().count("sheet_music"), 1);
}

#[tokio::test]
async fn failed_upload_is_a_500_with_the_cause() {
    let _ = &*TRACER;

    let objects = FlakyObjectStore::default()
        .fail_on("clair-de-lune.mp3")
        .delay("clair-de-lune.mp3", Duration::from_millis(20));
    let stores = TestStores::from_stores(objects, FlakyDocumentStore::default());
    let form = score_form();
    let req = submit("/api/scores", &form.content_type(), form.build());
    let res = app(&stores).oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(&res);
    let body = json_body(res).await;
    assert_eq!(body["success"], false);
    assert!(body.get("data").is_none());
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("bucket rejected clair-de-lune.mp3"), "{message}");

    assert_eq!(stores.objects.delete_attempts().len(), 1);
    assert_eq!(stores.documents.inserts(), 0);
}

#[tokio::test]
async fn content_type_without_boundary_is_a_400() {
    let _ = &*TRACER;

    let stores = TestStores::new();
    let req = submit("/api/scores", "multipart/form-data", score_form().build());
    let res = app(&stores).oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_cors(&res);
    let body = json_body(res).await;
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("boundary"));
    assert_eq!(stores.objects.creates(), 0);
}

#[tokio::test]
async fn preflight_is_an_empty_200() {
    let _ = &*TRACER;

    let stores = TestStores::new();
    for uri in [
        "/api/scores",
        "/add-library-score",
        "/api/files",
        "/files",
        "/upload",
        "/delete",
    ] {
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri(uri)
            .header(header::CONTENT_TYPE, "multipart/form-data")
            .body(Body::from("not a multipart body"))
            .unwrap();
        let res = app(&stores).oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK, "{uri}");
        assert_cors(&res);
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty(), "{uri}");
    }
    assert_eq!(stores.objects.creates(), 0);
}

#[tokio::test]
async fn other_methods_are_a_json_405() {
    let _ = &*TRACER;

    let stores = TestStores::new();
    for (method, uri) in [
        (Method::GET, "/api/scores"),
        (Method::PUT, "/add-library-score"),
        (Method::GET, "/upload"),
        (Method::POST, "/delete"),
        (Method::POST, "/files"),
    ] {
        let req = Request::builder()
            .method(method.clone())
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let res = app(&stores).oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
        assert_cors(&res);
        let body = json_body(res).await;
        assert_eq!(body, json!({"success": false, "message": "Method not allowed"}));
    }
}

#[tokio::test]
async fn single_file_upload_then_delete() {
    let _ = &*TRACER;

    let stores = TestStores::new();
    let upload = json!({
        "fileName": "cover.png",
        "mimeType": "image/png",
        "base64": STANDARD.encode(b"\x89PNG\r\n\x1a\n"),
    });
    let req = submit("/upload", "application/json", upload.to_string());
    let res = app(&stores).oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["data"]["filename"], "cover.png");
    assert_eq!(body["data"]["mediaType"], "image/png");
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(stores.stored_objects().len(), 1);
    assert_eq!(stores.documents.inserts(), 0);

    let req = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/api/files?fileId={id}"))
        .body(Body::empty())
        .unwrap();
    let res = app(&stores).oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_cors(&res);
    assert!(stores.stored_objects().is_empty());
}

#[tokio::test]
async fn stored_files_are_listed() {
    let _ = &*TRACER;

    let stores = TestStores::new();
    for name in ["first.pdf", "second.mp3"] {
        let upload = json!({
            "fileName": name,
            "mimeType": "application/octet-stream",
            "base64": STANDARD.encode(name),
        });
        let req = submit("/api/files", "application/json", upload.to_string());
        let res = app(&stores).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let req = Request::builder().uri("/api/files").body(Body::empty()).unwrap();
    let res = app(&stores).oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_cors(&res);
    let body = json_body(res).await;
    assert_eq!(body["success"], true);
    let files = body["files"].as_array().unwrap();
    let names: Vec<&str> = files.iter().map(|f| f["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["first.pdf", "second.mp3"]);
    for file in files {
        let id = score_upload::types::AssetId::from(file["id"].as_str().unwrap());
        assert!(stores.stored_objects().get(&id).is_some());
    }

    let req = Request::builder().uri("/files?limit=1").body(Body::empty()).unwrap();
    let res = app(&stores).oneshot(req).await.unwrap();
    let body = json_body(res).await;
    assert_eq!(body["files"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn file_content_without_a_filename_is_a_400() {
    let _ = &*TRACER;

    let stores = TestStores::new();
    let form = score_form().file("fileAudio", "", "audio/mpeg", b"ID3");
    let req = submit("/api/scores", &form.content_type(), form.build());
    let res = app(&stores).oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert!(body["message"].as_str().unwrap().contains("filename"));
    assert_eq!(stores.objects.creates(), 0);
}

#[tokio::test]
async fn single_file_upload_requires_data() {
    let _ = &*TRACER;

    let stores = TestStores::new();
    let req = submit("/api/files", "application/json", json!({"fileName": "a.pdf"}).to_string());
    let res = app(&stores).oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert_eq!(body["message"], "Missing file data");
}

#[tokio::test]
async fn delete_requires_file_id() {
    let _ = &*TRACER;

    let stores = TestStores::new();
    let req = Request::builder()
        .method(Method::DELETE)
        .uri("/delete")
        .body(Body::empty())
        .unwrap();
    let res = app(&stores).oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert_eq!(body["message"], "fileId is required");
}

#[tokio::test]
async fn health_reports_the_version() {
    let _ = &*TRACER;

    let stores = TestStores::new();
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let res = app(&stores).oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let _ = &*TRACER;

    let stores = TestStores::new();
    let app = http::router(AppState::new(stores.orchestrator()).with_body_limit(1024));
    let form = score_form().file("filePDF", "big.pdf", "application/pdf", &[b'x'; 4096]);
    let req = submit("/api/scores", &form.content_type(), form.build());
    let res = app.oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_cors(&res);
    assert_eq!(stores.objects.creates(), 0);
}

#[tokio::test]
async fn configured_origin_is_sent() {
    let _ = &*TRACER;

    let stores = TestStores::new();
    let state = AppState::new(stores.orchestrator())
        .with_allow_origin("https://scores.example.org")
        .unwrap();
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let res = http::router(state).oneshot(req).await.unwrap();

    assert_eq!(
        res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://scores.example.org"
    );
}
