//! Output encoding for the cropped avatar.
//!
//! This module provides functionality for:
//! - Encoding RGB pixels to JPEG with configurable quality
//! - Encoding RGBA pixels to PNG
//! - Flattening the circular mask onto a background for alpha-less formats

mod format;
mod jpeg;
mod png;

pub use format::{encode_rgba, flatten_onto, EncodeError, OutputFormat};
pub use jpeg::encode_jpeg;
pub use png::encode_png;
