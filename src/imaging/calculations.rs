//! Pure calculation functions for crop geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{CropRect, Dimensions};

/// Side length the crop analysis works at, on the image's shorter prescaled edge.
pub const ANALYSIS_EDGE: f64 = 256.0;

/// Largest rectangle with the target's aspect ratio that fits inside `source`.
///
/// Both sides are floored, and never drop below one pixel.
///
/// # Examples
/// ```
/// # use rioyi_crop::imaging::calculations::max_crop_size;
/// # use rioyi_crop::imaging::Dimensions;
/// // 1300x434 landscape → the crop is limited by height
/// assert_eq!(
///     max_crop_size(Dimensions::new(1300, 434), Dimensions::new(650, 434)),
///     (650, 434)
/// );
/// ```
pub fn max_crop_size(source: Dimensions, target: Dimensions) -> (u32, u32) {
    // Integer cross-multiplication keeps the limiting side exact.
    let (sw, sh) = (source.width as u64, source.height as u64);
    let (tw, th) = (target.width.max(1) as u64, target.height.max(1) as u64);
    let (w, h) = if sw * th <= sh * tw {
        (sw, sw * th / tw)
    } else {
        (sh * tw / th, sh)
    };
    (
        (w as u32).clamp(1, source.width.max(1)),
        (h as u32).clamp(1, source.height.max(1)),
    )
}

/// Downscale factor applied before analysis.
///
/// Chosen so that the shorter side lands at [`ANALYSIS_EDGE`] pixels. Never
/// upscales: images already smaller than that are analysed as-is.
pub fn prescale_factor(source: Dimensions) -> f64 {
    (ANALYSIS_EDGE / source.width as f64)
        .max(ANALYSIS_EDGE / source.height as f64)
        .min(1.0)
}

/// Apply a scale factor to a pixel length, truncating like an integer canvas size.
pub fn scale_length(length: u32, factor: f64) -> u32 {
    ((length as f64 * factor).floor() as u32).max(1)
}

/// Map a crop found on the prescaled analysis image back to source pixels.
///
/// The result is clamped so it always lies inside the source image.
pub fn scale_crop_to_source(crop: CropRect, prescale: f64, source: Dimensions) -> CropRect {
    let back = |v: u32| (v as f64 / prescale).floor() as u32;
    clamp_to_bounds(
        CropRect {
            x: back(crop.x),
            y: back(crop.y),
            width: back(crop.width),
            height: back(crop.height),
        },
        source,
    )
}

/// Shrink and shift a rectangle until it fits inside `bounds`.
pub fn clamp_to_bounds(rect: CropRect, bounds: Dimensions) -> CropRect {
    let width = rect.width.clamp(1, bounds.width.max(1));
    let height = rect.height.clamp(1, bounds.height.max(1));
    CropRect {
        x: rect.x.min(bounds.width.saturating_sub(width)),
        y: rect.y.min(bounds.height.saturating_sub(height)),
        width,
        height,
    }
}

/// Offsets at which a window of `window` pixels fits inside `extent`, every `step` pixels.
///
/// Always yields at least offset 0.
pub fn sliding_offsets(extent: u32, window: u32, step: u32) -> impl Iterator<Item = u32> {
    let last = extent.saturating_sub(window);
    (0..=last).step_by(step.max(1) as usize)
}
