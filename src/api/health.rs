/// Health check endpoints for liveness and readiness probes
///
/// - Liveness: Is the process alive and responding?
/// - Readiness: Can it serve traffic? (metadata store reachable, storage root present)

use crate::{context::AppContext, error::AppResult, metrics};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::json;

/// Build health and metrics routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health_basic))
        .route("/health/live", get(liveness_probe))
        .route("/health/ready", get(readiness_probe))
        .route("/metrics", get(metrics_export))
}

/// Basic health check
pub async fn health_basic() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Liveness probe - if we can respond, we're alive
pub async fn liveness_probe() -> Json<serde_json::Value> {
    Json(json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness probe
///
/// Returns 200 if ready, 503 if the metadata store or storage root is unavailable.
pub async fn readiness_probe(
    State(ctx): State<AppContext>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    if let Err(e) = check_database(&ctx).await {
        tracing::warn!(error = %e, "readiness_probe_failed: database check failed");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    if let Err(e) = check_blob_storage(&ctx).await {
        tracing::warn!(error = %e, "readiness_probe_failed: blob storage check failed");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(Json(json!({
        "status": "ready",
        "version": env!("CARGO_PKG_VERSION")
    })))
}

/// Prometheus text exposition
async fn metrics_export() -> AppResult<impl IntoResponse> {
    let body = metrics::render_metrics()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

/// Check database connectivity
pub async fn check_database(ctx: &AppContext) -> AppResult<()> {
    sqlx::query("SELECT 1").fetch_one(&ctx.db).await?;
    Ok(())
}

/// Check the storage root is a directory
async fn check_blob_storage(ctx: &AppContext) -> AppResult<()> {
    let metadata = tokio::fs::metadata(&ctx.config.storage.blob_location).await?;
    if !metadata.is_dir() {
        return Err(crate::error::AppError::BlobStorage(format!(
            "{:?} is not a directory",
            ctx.config.storage.blob_location
        )));
    }
    Ok(())
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
    use std::sync::Arc;
    use tempfile::tempdir;
    use tower::util::ServiceExt;

    async fn context_at(data_directory: std::path::PathBuf) -> AppContext {
        let config = ServerConfig::with_data_directory(data_directory);
        let backend: Arc<dyn BlobBackend> =
            Arc::new(DiskBlobBackend::new(config.storage.blob_location.clone()));
        AppContext::from_parts(config, create_memory_pool().await.unwrap(), backend)
    }

    async fn status_of(ctx: &AppContext, uri: &str) -> StatusCode {
        routes()
            .with_state(ctx.clone())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_ready_when_storage_exists() {
        let dir = tempdir().unwrap();
        let ctx = context_at(dir.path().to_path_buf()).await;
        tokio::fs::create_dir_all(&ctx.config.storage.blob_location)
            .await
            .unwrap();

        assert_eq!(status_of(&ctx, "/health/ready").await, StatusCode::OK);
        assert_eq!(status_of(&ctx, "/health/live").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_not_ready_without_storage_root() {
        let dir = tempdir().unwrap();
        let ctx = context_at(dir.path().join("missing")).await;

        assert_eq!(
            status_of(&ctx, "/health/ready").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let dir = tempdir().unwrap();
        let ctx = context_at(dir.path().to_path_buf()).await;
        metrics::record_file_response(200);

        assert_eq!(status_of(&ctx, "/metrics").await, StatusCode::OK);
    }
}
