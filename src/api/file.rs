/// File serving endpoint
///
/// `GET /file/:id` resolves the metadata row, confirms the blob is on disk,
/// answers conditional requests with 304, and otherwise streams the blob in
/// chunks without buffering it.
use crate::{
    context::AppContext,
    db::FileRecord,
    error::{AppError, AppResult},
    metrics,
};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures::TryStreamExt;
use tracing::{debug, error, warn};

/// Build file serving routes
pub fn routes() -> Router<AppContext> {
    Router::new().route("/file/:id", get(get_file))
}

/// Strong validator for a file: its quoted id
pub fn etag_for(id: &str) -> String {
    format!("\"{}\"", id)
}

/// Whether an `If-None-Match` header matches `etag`
///
/// Uses weak comparison over a comma-separated list, with `*` matching any
/// current representation.
pub fn if_none_match_matches(header: &HeaderValue, etag: &str) -> bool {
    let Ok(value) = header.to_str() else {
        return false;
    };

    value
        .split(',')
        .map(str::trim)
        .any(|tag| tag == "*" || tag.strip_prefix("W/").unwrap_or(tag) == etag)
}

async fn get_file(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let response = match serve_file(&ctx, &id, &headers).await {
        Ok(response) => response,
        Err(e) => {
            if !matches!(e, AppError::NotFound(_)) {
                error!(file_id = %id, error = %e, "File serving failed");
            }
            e.into_response()
        }
    };

    metrics::record_file_response(response.status().as_u16());
    response
}

async fn serve_file(ctx: &AppContext, id: &str, headers: &HeaderMap) -> AppResult<Response> {
    // RESOLVE
    let record = ctx
        .files
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("File not found: {}", id)))?;

    // EXISTENCE_CHECK
    if !ctx.blob_store.exists(&record.file_path).await? {
        warn!(
            file_id = %record.id,
            file_path = %record.file_path,
            "File metadata exists but blob is missing"
        );
        return Err(AppError::NotFound(format!("File not found on server: {}", id)));
    }

    let etag = etag_for(&record.id);
    let cache_control = format!("public, max-age={}", ctx.config.service.cache_max_age);

    // CONDITIONAL_CHECK
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH) {
        if if_none_match_matches(if_none_match, &etag) {
            debug!(file_id = %record.id, "Conditional request matched");
            return Response::builder()
                .status(StatusCode::NOT_MODIFIED)
                .header(header::ETAG, etag)
                .header(header::CACHE_CONTROL, cache_control)
                .body(Body::empty())
                .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)));
        }
    }

    // STREAM
    let stream = ctx.blob_store.open_read_stream(&record.file_path).await?;
    let file_id = record.id.clone();
    let body = Body::from_stream(stream.inspect_err(move |e| {
        // Headers are already sent; the response can only be truncated
        error!(file_id = %file_id, error = %e, "Blob stream interrupted");
    }));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type(&record))
        .header(header::CONTENT_LENGTH, record.file_size.to_string())
        .header(header::CACHE_CONTROL, cache_control)
        .header(header::ETAG, etag)
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))
}

fn content_type(record: &FileRecord) -> HeaderValue {
    match record.mime_type.trim() {
        "" => HeaderValue::from_static("application/octet-stream"),
        mime => HeaderValue::from_str(mime)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    }
}
