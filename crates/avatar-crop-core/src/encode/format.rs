//! Output formats and the RGBA-to-bytes dispatcher.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{encode_jpeg, encode_png};

/// Errors that can occur while encoding the output image.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes, got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The underlying encoder failed
    #[error("{format} encoding failed: {message}")]
    EncodingFailed {
        format: &'static str,
        message: String,
    },
}

/// Encoding used for the finished avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossy JPEG (1-100). Masked pixels are flattened onto the background.
    Jpeg { quality: u8 },
    /// Lossless PNG with the circular mask kept as alpha.
    Png,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Jpeg { quality: 90 }
    }
}

impl OutputFormat {
    pub fn mime(self) -> &'static str {
        match self {
            OutputFormat::Jpeg { .. } => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }

    /// Whether masked-out pixels survive as transparency.
    pub fn has_alpha(self) -> bool {
        matches!(self, OutputFormat::Png)
    }
}

/// Encode straight-alpha RGBA pixels in the requested format.
///
/// For formats without alpha each pixel is composited over `background`
/// first, which is what a browser canvas does when exporting JPEG.
pub fn encode_rgba(
    pixels: &[u8],
    width: u32,
    height: u32,
    format: OutputFormat,
    background: [u8; 3],
) -> Result<Vec<u8>, EncodeError> {
    match format {
        OutputFormat::Png => encode_png(pixels, width, height),
        OutputFormat::Jpeg { quality } => {
            let expected = (width as usize) * (height as usize) * 4;
            if width != 0 && height != 0 && pixels.len() != expected {
                return Err(EncodeError::InvalidPixelData {
                    expected,
                    actual: pixels.len(),
                });
            }
            let rgb = flatten_onto(pixels, background);
            encode_jpeg(&rgb, width, height, quality)
        }
    }
}

/// Composite RGBA over an opaque background, producing RGB.
pub fn flatten_onto(pixels: &[u8], background: [u8; 3]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(pixels.len() / 4 * 3);
    for px in pixels.chunks_exact(4) {
        let alpha = px[3] as u32;
        for c in 0..3 {
            let v = (px[c] as u32 * alpha + background[c] as u32 * (255 - alpha) + 127) / 255;
            rgb.push(v as u8);
        }
    }
    rgb
}
