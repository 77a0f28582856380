/// Application context and dependency injection
use crate::{
    blob_store::{BlobBackend, DiskBlobBackend},
    config::ServerConfig,
    db::{self, FileRepository},
    error::{AppError, AppResult},
    stats::StatsAggregator,
    upload::UploadCoordinator,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
///
/// Built once at startup and cloned into every handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub files: Arc<FileRepository>,
    pub blob_store: Arc<dyn BlobBackend>,
    pub uploads: Arc<UploadCoordinator>,
    pub stats: Arc<StatsAggregator>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> AppResult<Self> {
        // Validate configuration
        config.validate()?;

        // An unwritable storage root is fatal at startup
        Self::ensure_directories(&config).await?;

        let db = db::create_pool(&config.storage.database, db::DatabaseOptions::default()).await?;
        db::run_migrations(&db).await?;
        db::test_connection(&db).await?;

        let blob_store: Arc<dyn BlobBackend> =
            Arc::new(DiskBlobBackend::new(config.storage.blob_location.clone()));

        Ok(Self::from_parts(config, db, blob_store))
    }

    /// Wire services over an existing pool and blob backend
    pub fn from_parts(
        config: ServerConfig,
        db: SqlitePool,
        blob_store: Arc<dyn BlobBackend>,
    ) -> Self {
        let files = Arc::new(FileRepository::new(db.clone()));
        let uploads = Arc::new(UploadCoordinator::new(
            Arc::clone(&blob_store),
            Arc::clone(&files),
            config.upload.max_file_size,
        ));
        let stats = Arc::new(StatsAggregator::new(Arc::clone(&files)));

        Self {
            config: Arc::new(config),
            db,
            files,
            blob_store,
            uploads,
            stats,
        }
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &ServerConfig) -> AppResult<()> {
        let dirs = [
            &config.storage.data_directory,
            &config.storage.blob_location,
        ];

        for dir in dirs {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                AppError::Internal(format!("Failed to create directory {:?}: {}", dir, e))
            })?;
        }

        Ok(())
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
