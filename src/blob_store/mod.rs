/// Blob Storage System
///
/// Persists raw upload bytes under their server filename, independent of the
/// metadata row that describes them.

pub mod disk;
pub mod models;

pub use disk::DiskBlobBackend;
pub use models::*;

use crate::error::AppResult;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Lazy, finite, non-restartable sequence of blob chunks
pub type BlobStream = BoxStream<'static, std::io::Result<Vec<u8>>>;

/// Blob storage backend trait
///
/// Filenames are unique by construction, so `put` never expects to overwrite
/// an existing blob but does not reject it either.
#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// Persist a blob, creating the storage root if needed
    async fn put(&self, filename: &str, data: &[u8]) -> AppResult<()>;

    /// Open a chunked read stream over a blob; reopen to restart
    async fn open_read_stream(&self, filename: &str) -> AppResult<BlobStream>;

    /// Check if a blob exists
    async fn exists(&self, filename: &str) -> AppResult<bool>;

    /// Delete a blob; deleting a missing blob succeeds
    async fn delete(&self, filename: &str) -> AppResult<()>;

    /// Enumerate every stored blob
    async fn list(&self) -> AppResult<Vec<StoredBlob>>;
}
