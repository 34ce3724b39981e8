//! Upload checks run before a file reaches the cropper.

use avatar_crop_core::decode::{self, MAX_UPLOAD_BYTES};
use wasm_bindgen::prelude::*;

use crate::types::to_js_error;

/// Check an upload's type and size.
///
/// `max_bytes` defaults to 3 MB; pass `session.max_upload_bytes` when the
/// session was created with a custom limit. Returns the normalized MIME type
/// (`image/png`, `image/jpeg` or `image/webp`) or throws a message suitable
/// for display.
///
/// # Example
///
/// ```typescript
/// try {
///   validate_upload(file.size, file.type, session.max_upload_bytes);
/// } catch (message) {
///   showError(message);
/// }
/// ```
#[wasm_bindgen]
pub fn validate_upload(
    byte_length: usize,
    mime: &str,
    max_bytes: Option<usize>,
) -> Result<String, JsValue> {
    decode::validate_upload(mime, byte_length, max_bytes.unwrap_or(MAX_UPLOAD_BYTES))
        .map(|mime| mime.as_str().to_string())
        .map_err(to_js_error)
}
