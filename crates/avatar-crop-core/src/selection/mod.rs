//! Crop-region selection.
//!
//! # Coordinate System
//!
//! - All values are percentages of the displayed image (0 to 100)
//! - (0, 0) = top-left corner, (100, 100) = bottom-right corner
//! - `size` is the circle's diameter; the circle must stay inside the
//!   display area at all times
//!
//! Zoom (`scale`) is stored alongside the geometry but does not take part
//! in the bounds math.

mod controller;
mod types;

pub use controller::{CropController, DragState};
pub use types::{CropSelection, PointerPosition, BOUNDS_EPSILON};
