//! Selection to finished avatar.

use tracing::debug;

use super::{source_rect, zoomed_source_rect, Canvas, CircleClip, PixelCanvas, SourceRect};
use crate::config::CropperConfig;
use crate::decode::SourceImage;
use crate::encode::{EncodeError, OutputFormat};
use crate::selection::CropSelection;

/// Error type for rasterization.
#[derive(Debug, thiserror::Error)]
pub enum RasterizeError {
    /// The output surface could not be created
    #[error("Failed to allocate {size}x{size} output surface")]
    SurfaceAllocation { size: u32 },

    /// The source image has no pixels
    #[error("Source image is empty")]
    EmptySource,

    /// The pixel buffer does not match the source dimensions
    #[error("Source pixel buffer holds {actual} bytes, expected {expected}")]
    MalformedSource { expected: usize, actual: usize },

    /// The selection mapped to a degenerate source rectangle
    #[error("Crop rectangle is empty or not finite")]
    InvalidRect,

    #[error("Encoding failed: {0}")]
    Encode(#[from] EncodeError),
}

/// The finished avatar.
#[derive(Debug, Clone, PartialEq)]
pub struct CropOutput {
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
}

impl CropOutput {
    pub fn mime(&self) -> &'static str {
        self.format.mime()
    }
}

/// Pick the source rectangle for a selection according to `config`.
pub fn crop_rect(
    selection: &CropSelection,
    source: &SourceImage,
    config: &CropperConfig,
) -> SourceRect {
    if config.zoom_affects_crop {
        zoomed_source_rect(selection, source.width, source.height)
    } else {
        source_rect(selection, source.width, source.height)
    }
}

/// Clip `canvas` to its inscribed circle and draw `rect` of `source` into it.
///
/// # Errors
///
/// Returns `EmptySource` for a zero-sized source, `MalformedSource` when the
/// pixel buffer does not match the dimensions and `InvalidRect` when the
/// rectangle has no area.
pub fn rasterize_onto<C: Canvas>(
    canvas: &mut C,
    source: &SourceImage,
    rect: &SourceRect,
) -> Result<(), RasterizeError> {
    if source.is_empty() {
        return Err(RasterizeError::EmptySource);
    }
    if source.pixels.len() != source.expected_len() {
        return Err(RasterizeError::MalformedSource {
            expected: source.expected_len(),
            actual: source.pixels.len(),
        });
    }
    if !rect.is_valid() {
        return Err(RasterizeError::InvalidRect);
    }

    canvas.clip_circle(CircleClip::inscribed(canvas.size()));
    canvas.draw_region(source, rect);
    Ok(())
}

/// Rasterize into a fresh software canvas of `output_size` pixels.
pub fn rasterize(
    source: &SourceImage,
    rect: &SourceRect,
    output_size: u32,
) -> Result<PixelCanvas, RasterizeError> {
    let mut canvas = PixelCanvas::new(output_size)?;
    rasterize_onto(&mut canvas, source, rect)?;
    Ok(canvas)
}

/// Run the full crop against a caller-provided canvas and encode the result.
pub fn apply_with<C: Canvas>(
    canvas: &mut C,
    source: &SourceImage,
    selection: &CropSelection,
    config: &CropperConfig,
) -> Result<CropOutput, RasterizeError> {
    let rect = crop_rect(selection, source, config);
    rasterize_onto(canvas, source, &rect)?;
    let bytes = canvas.encode(config.output_format, config.background)?;

    let size = canvas.size();
    debug!(
        x = rect.x,
        y = rect.y,
        width = rect.width,
        height = rect.height,
        output = size,
        "cropped avatar"
    );

    Ok(CropOutput {
        bytes,
        width: size,
        height: size,
        format: config.output_format,
    })
}

/// Crop `source` to the circular `selection` and encode it.
///
/// # Errors
///
/// Surface allocation, an empty source, or an encoder failure.
pub fn apply(
    source: &SourceImage,
    selection: &CropSelection,
    config: &CropperConfig,
) -> Result<CropOutput, RasterizeError> {
    let mut canvas = PixelCanvas::new(config.output_size)?;
    apply_with(&mut canvas, source, selection, config)
}
