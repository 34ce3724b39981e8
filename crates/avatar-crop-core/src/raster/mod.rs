//! Rasterizer: turns a selection into the finished circular avatar.
//!
//! # Pipeline
//!
//! 1. Map the percent-space selection onto a source-pixel [`SourceRect`]
//! 2. Allocate an `output_size` square [`Canvas`]
//! 3. Clip to the inscribed circle ([`CircleClip`])
//! 4. Draw the source rectangle scaled to fill the surface
//! 5. Encode as JPEG or PNG
//!
//! Drawing goes through the [`Canvas`] trait so the pipeline can be checked
//! against a recording double; [`PixelCanvas`] is the software surface used
//! everywhere else.

mod canvas;
mod mask;
mod rasterize;
mod rect;

pub use canvas::{Canvas, PixelCanvas, MAX_SURFACE_SIZE};
pub use mask::CircleClip;
pub use rasterize::{
    apply, apply_with, crop_rect, rasterize, rasterize_onto, CropOutput, RasterizeError,
};
pub use rect::{source_rect, zoomed_source_rect, SourceRect};
