/// File id allocation and server filename derivation
use crate::error::{AppError, AppResult};
use rand::{rngs::OsRng, RngCore};

/// Longest server filename, in bytes, that common filesystems accept
pub const MAX_FILENAME_BYTES: usize = 255;

/// Hands out opaque, never-reused file ids
#[derive(Debug, Default, Clone, Copy)]
pub struct Allocator;

impl Allocator {
    pub fn new() -> Self {
        Self
    }

    /// Allocate a fresh random (v4) UUID
    ///
    /// Fails only when the OS entropy source is unavailable.
    pub fn allocate(&self) -> AppResult<String> {
        let mut bytes = [0u8; 16];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| AppError::Internal(format!("Entropy source unavailable: {}", e)))?;

        Ok(uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .hyphenated()
            .to_string())
    }

    /// Server filename for `id`: the id plus the original extension, if any
    ///
    /// An extension that would push the name past [`MAX_FILENAME_BYTES`] is
    /// dropped.
    pub fn derive_filename(id: &str, original_name: &str) -> String {
        match file_extension(original_name) {
            Some(ext) if id.len() + ext.len() <= MAX_FILENAME_BYTES => {
                format!("{}{}", id, ext)
            }
            _ => id.to_string(),
        }
    }
}

/// Extension of an untrusted filename, including the leading dot
///
/// Only the last path component counts (either separator style). Dotfiles
/// such as `.bashrc` and names ending in a bare dot have no extension, nor
/// does an extension containing control characters.
pub fn file_extension(original_name: &str) -> Option<&str> {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_name);

    let dot = base.rfind('.')?;
    if dot == 0 || dot + 1 == base.len() {
        return None;
    }

    let ext = &base[dot..];
    if ext.chars().any(char::is_control) {
        return None;
    }

    Some(ext)
}
