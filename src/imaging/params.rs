//! Parameter types for image operations.
//!
//! These structs describe *what* to produce, not *how*. They sit between the
//! high-level [`operations`](super::operations) module and the
//! [`backend`](super::backend) that does the pixel work, so the pipeline can be
//! exercised against a mock backend.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 80). Clamped on construction.
//! - [`Dimensions`]: Width and height in pixels.
//! - [`CropRect`]: A source-space rectangle chosen by the crop detector.
//! - [`RenderParams`]: Everything needed to turn a decoded image into the final payload.

use super::smartcrop::CropOptions;

/// Quality setting for lossy image encoding (1-100).
///
/// 80 matches a canvas `toBlob(..., 0.8)` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Quality as the `0.0..=100.0` float libwebp expects.
    pub fn as_webp_factor(self) -> f32 {
        self.0 as f32
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Width and height of an image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Rectangle in source-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Parameters for the crop → resize → encode step.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    /// Exact output canvas size.
    pub target: Dimensions,
    pub quality: Quality,
    pub detector: CropOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_80() {
        assert_eq!(Quality::default().value(), 80);
        assert_eq!(Quality::default().as_webp_factor(), 80.0);
    }
}
