/// Upload request and response shapes
use serde::{Deserialize, Serialize};

/// URL path a committed file is served from
pub fn download_url(id: &str) -> String {
    format!("/file/{}", id)
}

/// `uploadFile` input
#[derive(Debug, Clone, Deserialize)]
pub struct UploadFileRequest {
    pub original_name: String,
    pub mime_type: String,
    /// Size claimed by the caller; informational only
    pub file_size: i64,
    /// Standard base64 payload
    pub file_data: String,
}

/// Handle returned for a committed upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub id: String,
    pub filename: String,
    /// Decoded byte length, as stored in the metadata row
    pub file_size: u64,
}

impl UploadReceipt {
    pub fn download_url(&self) -> String {
        download_url(&self.id)
    }
}

/// `uploadFile` wire response
///
/// A failed upload never carries partial data: every field is empty and
/// `success` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFileResponse {
    pub id: String,
    pub filename: String,
    pub download_url: String,
    pub success: bool,
}

impl UploadFileResponse {
    pub fn failed() -> Self {
        Self {
            id: String::new(),
            filename: String::new(),
            download_url: String::new(),
            success: false,
        }
    }
}

impl From<UploadReceipt> for UploadFileResponse {
    fn from(receipt: UploadReceipt) -> Self {
        Self {
            download_url: receipt.download_url(),
            id: receipt.id,
            filename: receipt.filename,
            success: true,
        }
    }
}

/// `getFileStats` wire response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStatsResponse {
    pub total_files: u64,
    pub total_size: u64,
}
