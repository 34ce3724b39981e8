//! Avatar Crop Core - circular avatar cropping
//!
//! This crate provides the platform-independent parts of the avatar cropper:
//! image loading, the interactive crop-region controller, rasterizing the
//! circular avatar, and the session that ties them together.

pub mod config;
pub mod decode;
pub mod encode;
pub mod raster;
pub mod selection;
pub mod session;

pub use config::{CropperConfig, SelectionLimits, DEFAULT_OUTPUT_SIZE};
pub use decode::{decode_image, DecodeError, ImageFile, ImageMime, SourceImage};
pub use encode::OutputFormat;
pub use raster::{apply, CropOutput, RasterizeError, SourceRect};
pub use selection::{CropController, CropSelection, DragState, PointerPosition};
pub use session::{
    ApplyJob, CropSession, DecodeTicket, LoadOutcome, NoPreview, PreviewResources, SessionError,
    SessionState,
};
