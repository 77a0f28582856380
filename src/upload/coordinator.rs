/// Upload coordinator
///
/// Commits an upload as a two-step saga: the blob is written first, then the
/// metadata row is inserted. If the insert fails the blob is deleted again as
/// a compensating action. A metadata row is therefore never visible before
/// its blob; the only tolerated inconsistency is an orphan blob, which the
/// orphan sweep job removes later.
use crate::{
    allocator::Allocator,
    blob_store::BlobBackend,
    db::{FileRecord, FileRepository},
    error::{AppError, AppResult},
    metrics,
    upload::{UploadFileRequest, UploadReceipt},
};
use base64::{
    alphabet,
    engine::{
        general_purpose::{GeneralPurpose, GeneralPurposeConfig},
        DecodePaddingMode,
    },
    Engine as _,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Standard alphabet, padding optional
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Exact decoded length of a base64 payload, computed without decoding it
pub fn decoded_len(encoded: &str) -> AppResult<usize> {
    let unpadded = encoded.trim_end_matches('=');
    let padding = encoded.len() - unpadded.len();

    if padding > 2 || (padding > 0 && encoded.len() % 4 != 0) {
        return Err(AppError::Validation(
            "Malformed file data: invalid padding".to_string(),
        ));
    }

    let full_groups = unpadded.len() / 4 * 3;
    match unpadded.len() % 4 {
        0 => Ok(full_groups),
        2 => Ok(full_groups + 1),
        3 => Ok(full_groups + 2),
        _ => Err(AppError::Validation(
            "Malformed file data: truncated payload".to_string(),
        )),
    }
}

pub struct UploadCoordinator {
    allocator: Allocator,
    blob_store: Arc<dyn BlobBackend>,
    files: Arc<FileRepository>,
    max_file_size: usize,
}

impl UploadCoordinator {
    pub fn new(
        blob_store: Arc<dyn BlobBackend>,
        files: Arc<FileRepository>,
        max_file_size: usize,
    ) -> Self {
        Self {
            allocator: Allocator::new(),
            blob_store,
            files,
            max_file_size,
        }
    }

    /// Decode, store and register one upload
    ///
    /// Oversized or malformed payloads fail with [`AppError::Validation`]
    /// before anything is written.
    pub async fn upload(&self, request: UploadFileRequest) -> AppResult<UploadReceipt> {
        let result = self.commit(request).await;

        match &result {
            Ok(receipt) => metrics::record_upload("success", receipt.file_size),
            Err(AppError::Validation(_)) => metrics::record_upload("rejected", 0),
            Err(_) => metrics::record_upload("failed", 0),
        }

        result
    }

    async fn commit(&self, request: UploadFileRequest) -> AppResult<UploadReceipt> {
        let UploadFileRequest {
            original_name,
            mime_type,
            file_size: declared_size,
            file_data,
        } = request;

        self.check_size(decoded_len(&file_data)?)?;

        let id = self.allocator.allocate()?;
        let filename = Allocator::derive_filename(&id, &original_name);

        let bytes = PAYLOAD_ENGINE
            .decode(file_data.as_bytes())
            .map_err(|e| AppError::Validation(format!("Malformed file data: {}", e)))?;
        drop(file_data);
        self.check_size(bytes.len())?;

        let file_size = i64::try_from(bytes.len())
            .map_err(|_| AppError::Internal("File size overflows i64".to_string()))?;
        if declared_size != file_size {
            debug!(
                file_id = %id,
                declared_size,
                file_size,
                "Declared size differs from decoded length; using decoded length"
            );
        }

        if let Err(e) = self.blob_store.put(&filename, &bytes).await {
            error!(file_id = %id, filename = %filename, error = %e, "Failed to write blob");
            return Err(e);
        }
        drop(bytes);

        let record = FileRecord {
            id: id.clone(),
            filename: filename.clone(),
            original_name,
            mime_type,
            file_size,
            file_path: filename.clone(),
            created_at: Utc::now(),
        };

        if let Err(e) = self.files.insert(&record).await {
            error!(file_id = %id, filename = %filename, error = %e, "Failed to insert file metadata");
            self.discard_blob(&filename).await;
            return Err(e);
        }

        info!(file_id = %id, filename = %filename, file_size, "Upload committed");

        Ok(UploadReceipt {
            id,
            filename,
            file_size: file_size as u64,
        })
    }

    fn check_size(&self, len: usize) -> AppResult<()> {
        if len > self.max_file_size {
            return Err(AppError::Validation(format!(
                "File size {} exceeds maximum of {} bytes",
                len, self.max_file_size
            )));
        }
        Ok(())
    }

    /// Compensating delete; failure leaves an orphan blob for the sweep
    async fn discard_blob(&self, filename: &str) {
        match self.blob_store.delete(filename).await {
            Ok(()) => {
                warn!(filename = %filename, "Removed blob of uncommitted upload");
                metrics::record_compensating_delete(true);
            }
            Err(e) => {
                error!(
                    filename = %filename,
                    error = %e,
                    "Failed to remove blob of uncommitted upload; leaving orphan"
                );
                metrics::record_compensating_delete(false);
            }
        }
    }
}
