/// File metadata records and the repository over the `files` table
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

/// Metadata row describing one committed blob
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    /// Server-assigned name: id plus the original extension, if any
    pub filename: String,
    /// Name supplied by the uploader; untrusted
    pub original_name: String,
    pub mime_type: String,
    /// Decoded byte length of the stored blob
    pub file_size: i64,
    /// Blob locator relative to the storage root
    pub file_path: String,
    pub created_at: DateTime<Utc>,
}

/// Totals over every committed record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromRow)]
pub struct FileAggregate {
    pub count: i64,
    pub total_bytes: i64,
}

/// Metadata repository
pub struct FileRepository {
    db: SqlitePool,
}

impl FileRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Insert exactly one row keyed by `record.id`
    ///
    /// A duplicate id or filename is reported as [`AppError::Conflict`].
    pub async fn insert(&self, record: &FileRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO files (id, filename, original_name, mime_type, file_size, file_path, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&record.id)
        .bind(&record.filename)
        .bind(&record.original_name)
        .bind(&record.mime_type)
        .bind(record.file_size)
        .bind(&record.file_path)
        .bind(record.created_at)
        .execute(&self.db)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(format!("File {} already exists", record.id))
            }
            _ => AppError::Database(e),
        })?;

        Ok(())
    }

    /// Look up a record by id
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<FileRecord>> {
        let record = sqlx::query_as::<_, FileRecord>(
            r#"
            SELECT id, filename, original_name, mime_type, file_size, file_path, created_at
            FROM files
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(record)
    }

    /// Whether any record owns the given server filename
    pub async fn exists_by_filename(&self, filename: &str) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE filename = ?1")
            .bind(filename)
            .fetch_one(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Count and byte total; the total is 0 (never NULL) on an empty table
    pub async fn aggregate(&self) -> AppResult<FileAggregate> {
        let aggregate = sqlx::query_as::<_, FileAggregate>(
            "SELECT COUNT(*) AS count, COALESCE(SUM(file_size), 0) AS total_bytes FROM files",
        )
        .fetch_one(&self.db)
        .await?;

        Ok(aggregate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;

    fn record(id: &str, filename: &str, size: i64) -> FileRecord {
        FileRecord {
            id: id.to_string(),
            filename: filename.to_string(),
            original_name: format!("original-{}", filename),
            mime_type: "text/plain".to_string(),
            file_size: size,
            file_path: filename.to_string(),
            created_at: Utc::now(),
        }
    }

    async fn create_test_repository() -> FileRepository {
        FileRepository::new(create_memory_pool().await.unwrap())
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = create_test_repository().await;
        let rec = record("test-file-123", "test-file-123.txt", 1024);

        repo.insert(&rec).await.unwrap();

        let found = repo.find_by_id("test-file-123").await.unwrap().unwrap();
        assert_eq!(found.filename, "test-file-123.txt");
        assert_eq!(found.original_name, "original-test-file-123.txt");
        assert_eq!(found.file_size, 1024);
        assert_eq!(
            found.created_at.timestamp_millis(),
            rec.created_at.timestamp_millis()
        );
    }

    #[tokio::test]
    async fn test_find_missing_returns_none() {
        let repo = create_test_repository().await;
        repo.insert(&record("a", "a.txt", 1)).await.unwrap();

        assert!(repo.find_by_id("non-existent-file-id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_picks_correct_row() {
        let repo = create_test_repository().await;
        repo.insert(&record("test-file-123", "server_file_name.txt", 1024))
            .await
            .unwrap();
        repo.insert(&record("other-file-456", "other_file.jpg", 2048))
            .await
            .unwrap();

        let found = repo.find_by_id("other-file-456").await.unwrap().unwrap();
        assert_eq!(found.filename, "other_file.jpg");
        assert_eq!(found.file_size, 2048);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_conflict() {
        let repo = create_test_repository().await;
        repo.insert(&record("dup", "dup.txt", 1)).await.unwrap();

        let result = repo.insert(&record("dup", "dup-2.txt", 1)).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_aggregate_empty_is_zero() {
        let repo = create_test_repository().await;

        let aggregate = repo.aggregate().await.unwrap();
        assert_eq!(aggregate, FileAggregate { count: 0, total_bytes: 0 });
    }

    #[tokio::test]
    async fn test_aggregate_sums_sizes() {
        let repo = create_test_repository().await;
        repo.insert(&record("1", "file1.txt", 500)).await.unwrap();
        repo.insert(&record("2", "file2.jpg", 2048)).await.unwrap();
        repo.insert(&record("3", "file3.pdf", 1536)).await.unwrap();

        let aggregate = repo.aggregate().await.unwrap();
        assert_eq!(aggregate.count, 3);
        assert_eq!(aggregate.total_bytes, 4084);
    }

    #[tokio::test]
    async fn test_aggregate_large_sizes() {
        let repo = create_test_repository().await;
        let size = 200 * 1024 * 1024 - 1;
        repo.insert(&record("big", "large-file.zip", size)).await.unwrap();
        repo.insert(&record("big2", "large-file-2.zip", size)).await.unwrap();

        let aggregate = repo.aggregate().await.unwrap();
        assert_eq!(aggregate.total_bytes, 2 * size);
    }

    #[tokio::test]
    async fn test_exists_by_filename() {
        let repo = create_test_repository().await;
        repo.insert(&record("x", "x.bin", 3)).await.unwrap();

        assert!(repo.exists_by_filename("x.bin").await.unwrap());
        assert!(!repo.exists_by_filename("y.bin").await.unwrap());
    }
}
