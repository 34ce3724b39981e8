//! Selection value types.

use serde::{Deserialize, Serialize};

use crate::config::SelectionLimits;

/// Tolerance for floating-point rounding in bounds checks.
pub const BOUNDS_EPSILON: f64 = 1e-9;

/// Circular region of interest, in percent of the displayed image.
///
/// The circle `(center_x, center_y, size / 2)` always lies inside the
/// `[0, 100] x [0, 100]` display area when produced by a
/// [`CropController`](super::CropController).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropSelection {
    /// Center X coordinate (0 to 100)
    pub center_x: f64,
    /// Center Y coordinate (0 to 100)
    pub center_y: f64,
    /// Diameter of the circle (percent of the display area)
    pub size: f64,
    /// Preview zoom factor
    pub scale: f64,
}

impl Default for CropSelection {
    fn default() -> Self {
        Self {
            center_x: 50.0,
            center_y: 50.0,
            size: 80.0,
            scale: 1.0,
        }
    }
}

impl CropSelection {
    /// Default selection adjusted into the given limits.
    pub fn initial(limits: &SelectionLimits) -> Self {
        let defaults = Self::default();
        Self {
            size: defaults.size.max(limits.min_size).min(limits.max_size),
            scale: defaults.scale.max(limits.min_zoom).min(limits.max_zoom),
            ..defaults
        }
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.size / 2.0
    }

    /// Check that the circle lies fully inside the display area.
    pub fn is_within_bounds(&self) -> bool {
        let r = self.radius();
        self.center_x - r >= -BOUNDS_EPSILON
            && self.center_x + r <= 100.0 + BOUNDS_EPSILON
            && self.center_y - r >= -BOUNDS_EPSILON
            && self.center_y + r <= 100.0 + BOUNDS_EPSILON
    }

    /// Largest diameter the circle may have without moving its center.
    pub fn max_size_at_center(&self) -> f64 {
        (self.center_x * 2.0)
            .min((100.0 - self.center_x) * 2.0)
            .min(self.center_y * 2.0)
            .min((100.0 - self.center_y) * 2.0)
    }

    /// Check if a point (percent coordinates) is inside the circle.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let dx = x - self.center_x;
        let dy = y - self.center_y;
        (dx * dx + dy * dy).sqrt() <= self.radius()
    }
}

/// Pointer location in percent of the displayed image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Convert a pointer offset within the preview box (pixels from its
    /// top-left corner) into percent coordinates.
    ///
    /// Returns `None` when the preview box has no area.
    pub fn from_display(x: f64, y: f64, display_width: f64, display_height: f64) -> Option<Self> {
        if !(display_width > 0.0 && display_height > 0.0) {
            return None;
        }
        Some(Self {
            x: x / display_width * 100.0,
            y: y / display_height * 100.0,
        })
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}
