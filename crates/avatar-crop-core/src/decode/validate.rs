//! Upload checks performed by the caller before a file reaches the cropper.
//!
//! The cropper itself assumes a pre-validated file; these helpers exist so
//! that every caller applies the same rules.

use thiserror::Error;

use super::{ImageFile, ImageMime};

/// Largest accepted upload, in bytes (3 MB).
pub const MAX_UPLOAD_BYTES: usize = 3 * 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unsupported file type '{0}': expected PNG, JPEG or WebP")]
    UnsupportedType(String),

    #[error("File is {size} bytes, larger than the {max} byte limit")]
    TooLarge { size: usize, max: usize },

    #[error("File is empty")]
    Empty,
}

/// Check a MIME type and payload size against the upload rules.
pub fn validate_upload(
    mime: &str,
    size: usize,
    max_bytes: usize,
) -> Result<ImageMime, ValidationError> {
    let parsed =
        ImageMime::parse(mime).ok_or_else(|| ValidationError::UnsupportedType(mime.to_string()))?;
    if size == 0 {
        return Err(ValidationError::Empty);
    }
    if size > max_bytes {
        return Err(ValidationError::TooLarge {
            size,
            max: max_bytes,
        });
    }
    Ok(parsed)
}

/// Validate raw bytes and wrap them as an [`ImageFile`].
pub fn validated_file(
    mime: &str,
    bytes: Vec<u8>,
    max_bytes: usize,
) -> Result<ImageFile, ValidationError> {
    let parsed = validate_upload(mime, bytes.len(), max_bytes)?;
    Ok(ImageFile::new(parsed, bytes))
}
