/// Aggregate statistics over committed uploads
use crate::{
    db::FileRepository,
    error::{AppError, AppResult},
    upload::FileStatsResponse,
};
use std::sync::Arc;

/// Computes file count and total bytes
///
/// An empty store yields zeros; an unreachable store is an error, never a
/// zero snapshot.
pub struct StatsAggregator {
    files: Arc<FileRepository>,
}

impl StatsAggregator {
    pub fn new(files: Arc<FileRepository>) -> Self {
        Self { files }
    }

    pub async fn snapshot(&self) -> AppResult<FileStatsResponse> {
        let aggregate = self.files.aggregate().await?;

        let total_files = u64::try_from(aggregate.count)
            .map_err(|_| AppError::Internal(format!("Negative file count: {}", aggregate.count)))?;
        let total_size = u64::try_from(aggregate.total_bytes).map_err(|_| {
            AppError::Internal(format!("Negative total size: {}", aggregate.total_bytes))
        })?;

        Ok(FileStatsResponse {
            total_files,
            total_size,
        })
    }
}
