//! Drawing surface abstraction and its software implementation.
//!
//! The rasterizer only talks to a [`Canvas`], the same three calls a browser
//! 2D context would receive: set a circular clip, draw a scaled source
//! region, export. [`PixelCanvas`] implements them on an RGBA buffer.

use tracing::debug;

use super::{CircleClip, RasterizeError, SourceRect};
use crate::decode::SourceImage;
use crate::encode::{encode_rgba, OutputFormat};

/// Largest output surface the software canvas will allocate.
pub const MAX_SURFACE_SIZE: u32 = 4096;

/// A square drawing surface.
pub trait Canvas {
    /// Edge length in pixels.
    fn size(&self) -> u32;

    /// Restrict subsequent drawing to a circle.
    fn clip_circle(&mut self, clip: CircleClip);

    /// Draw `src` (source-pixel rectangle) scaled to fill the whole surface.
    fn draw_region(&mut self, source: &SourceImage, src: &SourceRect);

    /// Export the surface contents.
    fn encode(&self, format: OutputFormat, background: [u8; 3])
        -> Result<Vec<u8>, RasterizeError>;
}

/// Software canvas backed by a straight-alpha RGBA buffer.
///
/// Starts fully transparent.
#[derive(Debug, Clone)]
pub struct PixelCanvas {
    size: u32,
    pixels: Vec<u8>,
    clip: Option<CircleClip>,
}

impl PixelCanvas {
    /// Allocate a transparent `size` x `size` surface.
    ///
    /// # Errors
    ///
    /// Returns `RasterizeError::SurfaceAllocation` for a zero size, a size
    /// above [`MAX_SURFACE_SIZE`], or if the buffer cannot be reserved.
    pub fn new(size: u32) -> Result<Self, RasterizeError> {
        if size == 0 || size > MAX_SURFACE_SIZE {
            return Err(RasterizeError::SurfaceAllocation { size });
        }

        let len = size as usize * size as usize * 4;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| RasterizeError::SurfaceAllocation { size })?;
        pixels.resize(len, 0);

        Ok(Self {
            size,
            pixels,
            clip: None,
        })
    }

    /// RGBA pixel data in row-major order.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.size as usize + x as usize) * 4;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }
}

impl Canvas for PixelCanvas {
    fn size(&self) -> u32 {
        self.size
    }

    fn clip_circle(&mut self, clip: CircleClip) {
        self.clip = Some(clip);
    }

    fn draw_region(&mut self, source: &SourceImage, src: &SourceRect) {
        if source.is_empty() || source.pixels.len() != source.expected_len() || !src.is_valid() {
            return;
        }

        let size = self.size as f64;
        let step_x = src.width / size;
        let step_y = src.height / size;

        for dst_y in 0..self.size {
            // Map the destination pixel center back into the source
            let src_y = src.y + (dst_y as f64 + 0.5) * step_y - 0.5;

            for dst_x in 0..self.size {
                let coverage = match &self.clip {
                    Some(clip) => clip.coverage(dst_x, dst_y),
                    None => 1.0,
                };
                if coverage <= 0.0 {
                    continue;
                }

                let src_x = src.x + (dst_x as f64 + 0.5) * step_x - 0.5;
                let mut rgba = sample_bilinear(source, src_x, src_y);
                rgba[3] = (rgba[3] as f64 * coverage).round() as u8;

                let idx = ((dst_y * self.size + dst_x) * 4) as usize;
                self.pixels[idx..idx + 4].copy_from_slice(&rgba);
            }
        }
    }

    fn encode(
        &self,
        format: OutputFormat,
        background: [u8; 3],
    ) -> Result<Vec<u8>, RasterizeError> {
        let bytes = encode_rgba(&self.pixels, self.size, self.size, format, background)?;
        debug!(size = self.size, format = format.mime(), len = bytes.len(), "encoded avatar");
        Ok(bytes)
    }
}

#[inline]
fn get_pixel_f64(image: &SourceImage, px: usize, py: usize) -> [f64; 4] {
    let idx = (py * image.width as usize + px) * 4;
    [
        image.pixels[idx] as f64,
        image.pixels[idx + 1] as f64,
        image.pixels[idx + 2] as f64,
        image.pixels[idx + 3] as f64,
    ]
}

/// Sample a pixel using bilinear interpolation, clamping to the image edge.
///
/// Color is interpolated premultiplied by alpha, so transparent neighbours
/// do not bleed their RGB into the result.
fn sample_bilinear(image: &SourceImage, x: f64, y: f64) -> [u8; 4] {
    let max_x = (image.width - 1) as f64;
    let max_y = (image.height - 1) as f64;
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);

    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(image.width as usize - 1);
    let y1 = (y0 + 1).min(image.height as usize - 1);

    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = get_pixel_f64(image, x0, y0);
    let p10 = get_pixel_f64(image, x1, y0);
    let p01 = get_pixel_f64(image, x0, y1);
    let p11 = get_pixel_f64(image, x1, y1);

    let taps = [
        (p00, (1.0 - fx) * (1.0 - fy)),
        (p10, fx * (1.0 - fy)),
        (p01, (1.0 - fx) * fy),
        (p11, fx * fy),
    ];

    let alpha: f64 = taps.iter().map(|(p, w)| p[3] * w).sum();
    if alpha <= 0.0 {
        return [0, 0, 0, 0];
    }

    let mut result = [0u8; 4];
    for (i, channel) in result.iter_mut().take(3).enumerate() {
        let premultiplied: f64 = taps.iter().map(|(p, w)| p[i] * p[3] * w).sum();
        *channel = (premultiplied / alpha).clamp(0.0, 255.0).round() as u8;
    }
    result[3] = alpha.clamp(0.0, 255.0).round() as u8;

    result
}
