/// End-to-end upload and download tests
/// Drives the full router over an on-disk SQLite database and blob directory
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use earl_box::{config::ServerConfig, context::AppContext, server::build_router};
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tower::util::ServiceExt;

async fn create_app() -> (Router, AppContext, TempDir) {
    let dir = tempdir().unwrap();
    let config = ServerConfig::with_data_directory(dir.path().to_path_buf());
    let ctx = AppContext::new(config).await.unwrap();
    (build_router(ctx.clone()), ctx, dir)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

async fn upload(app: &Router, name: &str, mime: &str, data: &[u8]) -> Value {
    let body = json!({
        "original_name": name,
        "mime_type": mime,
        "file_size": data.len(),
        "file_data": STANDARD.encode(data),
    });
    let request = Request::builder()
        .method("POST")
        .uri("/rpc/uploadFile")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let (status, _, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice(&body).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_upload_then_download() {
    let (app, _ctx, _dir) = create_app().await;

    let receipt = upload(&app, "test.txt", "text/plain", b"test file content").await;
    assert_eq!(receipt["success"], true);

    let id = receipt["id"].as_str().unwrap();
    assert_eq!(receipt["filename"], format!("{}.txt", id));
    assert_eq!(receipt["download_url"], format!("/file/{}", id));

    let (status, headers, body) = send(&app, get(&format!("/file/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"test file content");
    assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
    assert_eq!(headers[header::CONTENT_LENGTH], "17");
    assert_eq!(headers[header::ETAG], format!("\"{}\"", id));
    assert_eq!(
        headers[header::CACHE_CONTROL],
        "public, max-age=31536000"
    );
}

#[tokio::test]
async fn test_conditional_download() {
    let (app, _ctx, _dir) = create_app().await;

    let receipt = upload(&app, "photo.png", "image/png", &[0x89, b'P', b'N', b'G']).await;
    let id = receipt["id"].as_str().unwrap();

    let request = Request::builder()
        .uri(format!("/file/{}", id))
        .header(header::IF_NONE_MATCH, format!("\"{}\"", id))
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::NOT_MODIFIED);
    assert!(body.is_empty());
    assert_eq!(headers[header::ETAG], format!("\"{}\"", id));

    let request = Request::builder()
        .uri(format!("/file/{}", id))
        .header(header::IF_NONE_MATCH, "\"some-other-id\"")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, vec![0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn test_metadata_and_stats_follow_uploads() {
    let (app, _ctx, _dir) = create_app().await;

    let (_, _, body) = send(&app, get("/rpc/getFileStats")).await;
    let stats: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(stats, json!({ "total_files": 0, "total_size": 0 }));

    let receipt = upload(&app, "Makefile", "", b"all:\n").await;
    let id = receipt["id"].as_str().unwrap();
    assert_eq!(receipt["filename"], id);

    let (status, _, body) = send(&app, get(&format!("/rpc/getFileMetadata?id={}", id))).await;
    assert_eq!(status, StatusCode::OK);
    let metadata: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(metadata["original_name"], "Makefile");
    assert_eq!(metadata["file_size"], 5);

    let (_, headers, _) = send(&app, get(&format!("/file/{}", id))).await;
    assert_eq!(headers[header::CONTENT_TYPE], "application/octet-stream");

    let (_, _, body) = send(&app, get("/rpc/getFileStats")).await;
    let stats: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(stats, json!({ "total_files": 1, "total_size": 5 }));
}

#[tokio::test]
async fn test_unknown_file_is_404() {
    let (app, _ctx, _dir) = create_app().await;

    let (status, _, _) = send(&app, get("/file/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, body) = send(&app, get("/rpc/getFileMetadata?id=does-not-exist")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), Value::Null);
}

#[tokio::test]
async fn test_missing_blob_is_404() {
    let (app, ctx, _dir) = create_app().await;

    let receipt = upload(&app, "gone.txt", "text/plain", b"soon deleted").await;
    let id = receipt["id"].as_str().unwrap();
    let filename = receipt["filename"].as_str().unwrap();

    ctx.blob_store.delete(filename).await.unwrap();

    let (status, _, _) = send(&app, get(&format!("/file/{}", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
