/// Blob storage data models
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Read streams yield chunks of at most this many bytes
pub const READ_CHUNK_SIZE: usize = 64 * 1024;

/// A blob found in storage, as reported by [`super::BlobBackend::list`]
#[derive(Debug, Clone, Serialize)]
pub struct StoredBlob {
    pub filename: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// Reject names that could escape the storage root
pub fn validate_blob_name(filename: &str) -> AppResult<()> {
    if filename.is_empty() || filename == "." || filename == ".." {
        return Err(AppError::Validation(format!(
            "Invalid blob name: {:?}",
            filename
        )));
    }

    if filename.contains(['/', '\\', '\0']) {
        return Err(AppError::Validation(format!(
            "Blob name must not contain path separators: {:?}",
            filename
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_blob_name() {
        assert!(validate_blob_name("0b6e6a4e-3c0e-4d4f-9a43-4c4f1d3b7a10.txt").is_ok());
        assert!(validate_blob_name("README").is_ok());

        assert!(validate_blob_name("").is_err());
        assert!(validate_blob_name("..").is_err());
        assert!(validate_blob_name("../etc/passwd").is_err());
        assert!(validate_blob_name("a\\b").is_err());
    }
}
