/// Disk-based blob storage backend
use crate::{
    blob_store::{validate_blob_name, BlobBackend, BlobStream, StoredBlob, READ_CHUNK_SIZE},
    error::{AppError, AppResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::{stream, StreamExt};
use std::path::{Path, PathBuf};
use tokio::{
    fs,
    io::{AsyncReadExt, AsyncWriteExt},
};

/// Disk storage backend
///
/// Stores each blob as `{base}/{filename}`. Writes land in a hidden temporary
/// file next to the target and are renamed into place once synced, so a blob
/// is either absent or complete.
#[derive(Clone)]
pub struct DiskBlobBackend {
    base_path: PathBuf,
}

impl DiskBlobBackend {
    /// Create a new disk storage backend
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn get_blob_path(&self, filename: &str) -> AppResult<PathBuf> {
        validate_blob_name(filename)?;
        Ok(self.base_path.join(filename))
    }

    /// Fixed-length temp name, independent of the target filename
    fn get_temp_path(&self) -> PathBuf {
        self.base_path
            .join(format!(".{}.partial", uuid::Uuid::new_v4().simple()))
    }

    async fn write_synced(&self, temp_path: &Path, data: &[u8]) -> std::io::Result<()> {
        let mut file = fs::File::create(temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        Ok(())
    }
}

#[async_trait]
impl BlobBackend for DiskBlobBackend {
    async fn put(&self, filename: &str, data: &[u8]) -> AppResult<()> {
        let blob_path = self.get_blob_path(filename)?;

        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            AppError::BlobStorage(format!("Failed to create blob directory: {}", e))
        })?;

        let temp_path = self.get_temp_path();
        let written = match self.write_synced(&temp_path, data).await {
            Ok(()) => fs::rename(&temp_path, &blob_path).await,
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(AppError::BlobStorage(format!(
                "Failed to write blob {}: {}",
                filename, e
            )));
        }

        Ok(())
    }

    async fn open_read_stream(&self, filename: &str) -> AppResult<BlobStream> {
        let blob_path = self.get_blob_path(filename)?;

        let file = match fs::File::open(&blob_path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::NotFound(format!("Blob not found: {}", filename)));
            }
            Err(e) => {
                return Err(AppError::BlobStorage(format!(
                    "Failed to open blob {}: {}",
                    filename, e
                )));
            }
        };

        let chunks = stream::try_unfold(file, |mut file| async move {
            let mut buf = vec![0u8; READ_CHUNK_SIZE];
            let n = file.read(&mut buf).await?;
            if n == 0 {
                return Ok(None);
            }
            buf.truncate(n);
            Ok::<_, std::io::Error>(Some((buf, file)))
        });

        Ok(chunks.boxed())
    }

    async fn exists(&self, filename: &str) -> AppResult<bool> {
        let blob_path = self.get_blob_path(filename)?;

        match fs::metadata(&blob_path).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::BlobStorage(format!(
                "Failed to stat blob {}: {}",
                filename, e
            ))),
        }
    }

    async fn delete(&self, filename: &str) -> AppResult<()> {
        let blob_path = self.get_blob_path(filename)?;

        match fs::remove_file(&blob_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::BlobStorage(format!(
                "Failed to delete blob {}: {}",
                filename, e
            ))),
        }
    }

    async fn list(&self) -> AppResult<Vec<StoredBlob>> {
        let mut entries = match fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::BlobStorage(format!(
                    "Failed to list blob directory: {}",
                    e
                )));
            }
        };

        let mut blobs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }

            // Non UTF-8 names were never written by this server
            let Ok(filename) = entry.file_name().into_string() else {
                continue;
            };

            blobs.push(StoredBlob {
                filename,
                size: metadata.len(),
                modified: DateTime::<Utc>::from(metadata.modified()?),
            });
        }

        Ok(blobs)
    }
}
