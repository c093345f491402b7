//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two steps every backend must
//! support: `decode` (bytes → pixels) and `render` (pixels → cropped, resized,
//! encoded payload). Keeping them separate lets the pipeline tell a corrupt
//! file apart from a failure later in the crop/encode chain.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::{CropRect, Dimensions, RenderParams};
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("cannot decode image: {0}")]
    Decode(String),
    #[error("crop detection failed: {0}")]
    Crop(String),
    #[error("encoding failed: {0}")]
    Encode(String),
}

/// Output of a successful render.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    /// Source rectangle that was drawn onto the canvas.
    pub crop: CropRect,
    /// Canvas size; always equal to the requested target.
    pub dimensions: Dimensions,
    /// Encoded bytes. May be empty if the encoder produced nothing.
    pub payload: Vec<u8>,
}

/// Trait for image processing backends.
///
/// Implementations must be `Sync`: the batch orchestrator calls them from
/// rayon worker threads.
pub trait ImageBackend: Sync {
    /// Decode raw file bytes into pixels.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError>;

    /// Detect the crop region, draw it onto the target canvas and encode it.
    fn render(&self, image: &DynamicImage, params: &RenderParams)
    -> Result<Rendered, BackendError>;
}
