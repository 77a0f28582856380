/// Background task implementations
use crate::{context::AppContext, error::AppResult};
use chrono::Utc;
use std::time::Duration;

/// Delete blobs that have no metadata row and are older than `grace_period`
///
/// Covers uploads whose compensating delete failed, crashes between the blob
/// write and the metadata insert, and interrupted partial writes. Safe to run
/// repeatedly. A metadata lookup failure aborts the sweep rather than risk
/// deleting committed blobs.
pub async fn sweep_orphan_blobs(ctx: &AppContext, grace_period: Duration) -> AppResult<u64> {
    let grace = chrono::Duration::from_std(grace_period)
        .unwrap_or_else(|_| chrono::Duration::days(365));
    let cutoff = Utc::now() - grace;

    let mut removed = 0;
    for blob in ctx.blob_store.list().await? {
        if blob.modified > cutoff {
            continue;
        }

        if ctx.files.exists_by_filename(&blob.filename).await? {
            continue;
        }

        match ctx.blob_store.delete(&blob.filename).await {
            Ok(()) => {
                tracing::info!(
                    filename = %blob.filename,
                    size = blob.size,
                    "Removed orphan blob"
                );
                removed += 1;
            }
            Err(e) => {
                tracing::warn!(filename = %blob.filename, error = %e, "Failed to remove orphan blob");
            }
        }
    }

    Ok(removed)
}

/// Health check - verify the metadata store is reachable
pub async fn health_check(ctx: &AppContext) -> AppResult<()> {
    crate::api::health::check_database(ctx).await
}
