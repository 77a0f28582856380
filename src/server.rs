/// HTTP server setup and routing
use crate::{
    context::AppContext,
    error::{AppError, AppResult},
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method, StatusCode},
    response::Json,
    Router,
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Build the main application router
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::IF_NONE_MATCH])
        .expose_headers([header::ETAG]);

    // Base64 inflates the payload by a third; the default 2 MiB limit would
    // reject most uploads
    let body_limit = ctx.config.upload.max_request_body;

    Router::new()
        .merge(crate::api::routes())
        .with_state(ctx)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .fallback(not_found)
}

/// 404 handler
async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "NotFound",
            "message": "Endpoint not found"
        })),
    )
}

/// Start the HTTP server
pub async fn serve(ctx: AppContext) -> AppResult<()> {
    let addr = format!("{}:{}", ctx.config.service.hostname, ctx.config.service.port);

    info!("Earl Box listening on {}", addr);
    info!("   Service URL: {}", ctx.service_url());
    info!("   Blob storage: {:?}", ctx.config.storage.blob_location);

    let app = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        blob_store::{BlobBackend, DiskBlobBackend},
        config::ServerConfig,
        db::create_memory_pool,
    };
    use axum::{body::Body, http::Request};
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use std::sync::Arc;
    use tempfile::tempdir;
    use tower::util::ServiceExt;

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let dir = tempdir().unwrap();
        let config = ServerConfig::with_data_directory(dir.path().to_path_buf());
        let backend: Arc<dyn BlobBackend> =
            Arc::new(DiskBlobBackend::new(config.storage.blob_location.clone()));
        let ctx = AppContext::from_parts(config, create_memory_pool().await.unwrap(), backend);

        let response = build_router(ctx)
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_body_limit_admits_large_upload() {
        let dir = tempdir().unwrap();
        let config = ServerConfig::with_data_directory(dir.path().to_path_buf());
        let backend: Arc<dyn BlobBackend> =
            Arc::new(DiskBlobBackend::new(config.storage.blob_location.clone()));
        let ctx = AppContext::from_parts(config, create_memory_pool().await.unwrap(), backend);

        // 3 MiB decoded is 4 MiB encoded, above axum's default limit
        let data = vec![42u8; 3 * 1024 * 1024];
        let body = json!({
            "original_name": "big.bin",
            "mime_type": "application/octet-stream",
            "file_size": data.len(),
            "file_data": STANDARD.encode(&data),
        });
        let request = Request::builder()
            .method("POST")
            .uri("/rpc/uploadFile")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = build_router(ctx).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
