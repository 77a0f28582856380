/// RPC procedures: uploadFile, getFileStats, getFileMetadata
///
/// Thin JSON adapter over the upload coordinator, stats aggregator and
/// metadata repository.
use crate::{
    api::extract::ApiJson,
    context::AppContext,
    db::FileRecord,
    error::{AppError, AppResult},
    upload::{FileStatsResponse, UploadFileRequest, UploadFileResponse},
};
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::warn;

/// Build RPC routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/rpc/uploadFile", post(upload_file))
        .route("/rpc/getFileStats", get(get_file_stats))
        .route("/rpc/getFileMetadata", get(get_file_metadata))
}

#[derive(Debug, Deserialize)]
pub struct GetFileMetadataParams {
    pub id: String,
}

/// Upload a file
///
/// Validation failures, including unreadable request bodies, are returned as
/// errors. Every other failure maps to the uniform `success: false` shape
/// with empty fields.
async fn upload_file(
    State(ctx): State<AppContext>,
    ApiJson(request): ApiJson<UploadFileRequest>,
) -> AppResult<Json<UploadFileResponse>> {
    match ctx.uploads.upload(request).await {
        Ok(receipt) => Ok(Json(receipt.into())),
        Err(AppError::Validation(message)) => Err(AppError::Validation(message)),
        Err(e) => {
            warn!(error = %e, "Upload failed");
            Ok(Json(UploadFileResponse::failed()))
        }
    }
}

/// Total file count and size
async fn get_file_stats(State(ctx): State<AppContext>) -> AppResult<Json<FileStatsResponse>> {
    Ok(Json(ctx.stats.snapshot().await?))
}

/// Metadata for one file, or `null`
async fn get_file_metadata(
    State(ctx): State<AppContext>,
    Query(params): Query<GetFileMetadataParams>,
) -> AppResult<Json<Option<FileRecord>>> {
    Ok(Json(ctx.files.find_by_id(&params.id).await?))
}
