//! Mapping a percent-space selection onto source pixels.

use serde::{Deserialize, Serialize};

use crate::selection::CropSelection;

/// Crop rectangle in source-pixel space.
///
/// Values are fractional; the rasterizer samples between pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SourceRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when every component is finite and the area is positive.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// Compute the source rectangle covered by the selection.
///
/// Zoom is ignored: the selection's percentages are applied directly to the
/// source dimensions, so a 1000x500 image with the default selection
/// (center 50/50, size 80) yields `(100, 50, 800, 400)`.
pub fn source_rect(selection: &CropSelection, source_width: u32, source_height: u32) -> SourceRect {
    rect_for_size(selection, selection.size, source_width, source_height)
}

/// Compute the source rectangle with the zoom factor folded in.
///
/// The effective diameter is `size / scale`, capped by the room around the
/// center so the rectangle never leaves the image.
pub fn zoomed_source_rect(
    selection: &CropSelection,
    source_width: u32,
    source_height: u32,
) -> SourceRect {
    let scale = if selection.scale > 0.0 {
        selection.scale
    } else {
        1.0
    };
    let effective = (selection.size / scale)
        .min(selection.max_size_at_center())
        .min(100.0);
    rect_for_size(selection, effective, source_width, source_height)
}

fn rect_for_size(
    selection: &CropSelection,
    size: f64,
    source_width: u32,
    source_height: u32,
) -> SourceRect {
    let (w, h) = (source_width as f64, source_height as f64);
    let crop_fraction = size / 100.0;
    let half = size / 2.0;

    SourceRect {
        x: (selection.center_x - half) / 100.0 * w,
        y: (selection.center_y - half) / 100.0 * h,
        width: crop_fraction * w,
        height: crop_fraction * h,
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
