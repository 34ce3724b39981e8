//! Image decoding with EXIF orientation handling.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageError, ImageReader};
use tracing::{debug, warn};

use super::{DecodeError, ImageFile, Orientation, SourceImage};

/// Decode an image file into RGBA pixels, applying EXIF orientation.
///
/// The container format is sniffed from the bytes; the declared MIME type
/// is only used when sniffing finds nothing.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the data is in a format the
/// cropper does not decode, `DecodeError::CorruptedFile` if decoding fails,
/// and `DecodeError::EmptyImage` if the result has a zero dimension.
pub fn decode_image(file: &ImageFile) -> Result<SourceImage, DecodeError> {
    let orientation = extract_orientation(&file.bytes);

    let mut reader = ImageReader::new(Cursor::new(file.bytes.as_slice()))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        reader.set_format(file.mime.to_image_format());
    }

    let img = reader.decode().map_err(|e| {
        warn!(mime = file.mime.as_str(), error = %e, "image decode failed");
        match e {
            ImageError::Unsupported(_) => DecodeError::InvalidFormat,
            other => DecodeError::CorruptedFile(other.to_string()),
        }
    })?;

    let oriented = apply_orientation(img, orientation);
    let rgba = oriented.into_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(DecodeError::EmptyImage { width, height });
    }

    debug!(width, height, ?orientation, "decoded source image");
    Ok(SourceImage::from_rgba_image(rgba))
}

/// Extract EXIF orientation from the file bytes.
///
/// Returns `Orientation::Normal` if no EXIF data is found or orientation
/// cannot be determined.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);

    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}
