//! Image loading for the cropper.
//!
//! This module provides functionality for:
//! - Validating uploads (type and size) on the caller side
//! - Decoding PNG, JPEG and WebP files into RGBA pixels
//! - Applying EXIF orientation so dimensions match what the user sees
//!
//! Decoding is synchronous here; the session layer decides whether it runs
//! inline or is deferred behind a [`DecodeTicket`](crate::session::DecodeTicket).

mod loader;
mod types;
mod validate;

pub use loader::decode_image;
pub use types::{DecodeError, ImageFile, ImageMime, Orientation, SourceImage};
pub use validate::{validate_upload, validated_file, ValidationError, MAX_UPLOAD_BYTES};
