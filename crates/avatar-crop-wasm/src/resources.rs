//! Preview images as browser object URLs.

use avatar_crop_core::{DecodeError, ImageFile, PreviewResources};
use wasm_bindgen::prelude::*;
use web_sys::{console, Blob, BlobPropertyBag, Url};

/// Creates one `blob:` URL per selected file and revokes it on release.
#[derive(Debug, Default)]
pub struct ObjectUrlResources;

impl PreviewResources for ObjectUrlResources {
    type Handle = String;

    fn acquire(&mut self, file: &ImageFile) -> Result<String, DecodeError> {
        let parts = js_sys::Array::new();
        parts.push(&js_sys::Uint8Array::from(file.bytes.as_slice()));

        let options = BlobPropertyBag::new();
        options.set_type(file.mime.as_str());

        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)
            .map_err(|e| DecodeError::Resource(format!("{:?}", e)))?;
        Url::create_object_url_with_blob(&blob)
            .map_err(|e| DecodeError::Resource(format!("{:?}", e)))
    }

    fn release(&mut self, handle: String) {
        if let Err(e) = Url::revoke_object_url(&handle) {
            console::warn_2(&JsValue::from_str("Failed to revoke preview URL"), &e);
        }
    }
}
