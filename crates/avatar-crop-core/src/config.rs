//! Cropper configuration.
//!
//! Every field has a default matching the avatar upload flow, and the whole
//! struct deserializes with `#[serde(default)]` so callers may pass a partial
//! object (or nothing at all).

use serde::{Deserialize, Serialize};

use crate::decode::MAX_UPLOAD_BYTES;
use crate::encode::OutputFormat;

/// Edge length of the square avatar produced by the rasterizer.
pub const DEFAULT_OUTPUT_SIZE: u32 = 256;

/// Bounds applied to the interactive selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionLimits {
    /// Smallest selection diameter, percent of the display area.
    pub min_size: f64,
    /// Largest selection diameter, percent of the display area.
    pub max_size: f64,
    /// Smallest zoom factor.
    pub min_zoom: f64,
    /// Largest zoom factor.
    pub max_zoom: f64,
}

impl Default for SelectionLimits {
    fn default() -> Self {
        Self {
            min_size: 20.0,
            max_size: 90.0,
            min_zoom: 0.5,
            max_zoom: 3.0,
        }
    }
}

impl SelectionLimits {
    /// Repair limits coming from untrusted configuration.
    ///
    /// Guarantees `0 < min_size <= max_size <= 100` and
    /// `0 < min_zoom <= max_zoom`. Non-finite values fall back to defaults.
    pub fn normalized(self) -> Self {
        let defaults = Self::default();
        let pick = |v: f64, fallback: f64| if v.is_finite() && v > 0.0 { v } else { fallback };

        let max_size = pick(self.max_size, defaults.max_size).min(100.0);
        let min_size = pick(self.min_size, defaults.min_size).min(max_size);
        let min_zoom = pick(self.min_zoom, defaults.min_zoom);
        let max_zoom = pick(self.max_zoom, defaults.max_zoom).max(min_zoom);

        Self {
            min_size,
            max_size,
            min_zoom,
            max_zoom,
        }
    }
}

/// Top-level cropper configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropperConfig {
    /// Edge length of the output square in pixels.
    pub output_size: u32,
    /// Encoding of the output image.
    pub output_format: OutputFormat,
    /// RGB color that masked-out pixels become when the output format has no
    /// alpha channel.
    pub background: [u8; 3],
    /// Fold the zoom factor into the crop rectangle instead of treating it
    /// as a preview-only transform.
    pub zoom_affects_crop: bool,
    /// Upload size limit enforced by [`validate_upload`](crate::decode::validate_upload).
    pub max_upload_bytes: usize,
    pub limits: SelectionLimits,
}

impl Default for CropperConfig {
    fn default() -> Self {
        Self {
            output_size: DEFAULT_OUTPUT_SIZE,
            output_format: OutputFormat::default(),
            background: [0, 0, 0],
            zoom_affects_crop: false,
            max_upload_bytes: MAX_UPLOAD_BYTES,
            limits: SelectionLimits::default(),
        }
    }
}

impl CropperConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy with selection limits repaired.
    pub fn normalized(mut self) -> Self {
        self.limits = self.limits.normalized();
        self
    }
}
