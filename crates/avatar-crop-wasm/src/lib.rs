//! Avatar Crop WASM - WebAssembly bindings for the avatar cropper
//!
//! This crate exposes the avatar-crop-core session to JavaScript/TypeScript.
//!
//! # Module Structure
//!
//! - `session` - `JsCropSession`, one crop interaction driven from the page
//! - `logging` - Forwards core `tracing` events to the browser console
//! - `resources` - Preview images as browser object URLs
//! - `upload` - Upload checks run before a file reaches the cropper
//! - `types` - Conversions between JavaScript values and core types
//!
//! # Usage
//!
//! ```typescript
//! import init, { init_logging, validate_upload, JsCropSession } from '@avatar-crop/wasm';
//!
//! await init();
//! init_logging("warn");
//!
//! const session = new JsCropSession(undefined, onComplete, onCancel);
//! validate_upload(file.size, file.type, session.max_upload_bytes);
//! const ticket = session.select_file(new Uint8Array(await file.arrayBuffer()), file.type);
//! session.decode(ticket);
//! ```

use wasm_bindgen::prelude::*;

mod logging;
mod resources;
mod session;
mod types;
mod upload;

pub use logging::{init_logging, ConsoleLayer};
pub use resources::ObjectUrlResources;
pub use session::JsCropSession;
pub use upload::validate_upload;

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
