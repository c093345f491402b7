//! Pure Rust decode and crop pipeline, with libwebp for the final encode.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image` crate, format sniffed from content |
//! | Orientation | `ImageDecoder::orientation` + `DynamicImage::apply_orientation` |
//! | Crop detection | [`smartcrop::find_best_crop`](super::smartcrop::find_best_crop) |
//! | Crop + resize | `DynamicImage::crop_imm` + `resize_exact` with `Lanczos3` |
//! | Encode → WebP (lossy) | `webp::Encoder` |

use super::backend::{BackendError, ImageBackend, Rendered};
use super::calculations::clamp_to_bounds;
use super::params::{CropRect, Dimensions, Quality, RenderParams};
use super::smartcrop::find_best_crop;
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::io::Cursor;
use std::sync::LazyLock;
use tracing::debug;

/// Extensions the scanner treats as images when walking directories.
///
/// Only a hint: files named explicitly are always attempted, and the decoder
/// sniffs the real format from the content.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
    ("gif", ImageFormat::Gif),
    ("bmp", ImageFormat::Bmp),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_error(e: impl std::fmt::Display) -> BackendError {
    BackendError::Decode(e.to_string())
}

/// Largest canvas side libwebp can encode.
pub const MAX_WEBP_DIMENSION: u32 = 16383;

/// Encode pixels as lossy WebP, keeping the alpha channel when there is one.
fn encode_webp(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let (w, h) = (img.width(), img.height());
    let encoded = if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        webp::Encoder::from_rgba(rgba.as_raw(), w, h)
            .encode_simple(false, quality.as_webp_factor())
    } else {
        let rgb = img.to_rgb8();
        webp::Encoder::from_rgb(rgb.as_raw(), w, h).encode_simple(false, quality.as_webp_factor())
    };
    encoded
        .map(|memory| memory.to_vec())
        .map_err(|e| BackendError::Encode(format!("libwebp rejected {w}x{h} canvas: {e:?}")))
}

/// Draw `crop` of `img` scaled to fill exactly `target`.
fn draw_crop(img: &DynamicImage, crop: CropRect, target: Dimensions) -> DynamicImage {
    let bounds = Dimensions::new(img.width(), img.height());
    let crop = clamp_to_bounds(crop, bounds);
    img.crop_imm(crop.x, crop.y, crop.width, crop.height).resize_exact(
        target.width,
        target.height,
        FilterType::Lanczos3,
    )
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        let mut decoder = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(decode_error)?
            .into_decoder()
            .map_err(decode_error)?;
        let orientation = decoder.orientation().map_err(decode_error)?;
        let mut img = DynamicImage::from_decoder(decoder).map_err(decode_error)?;
        img.apply_orientation(orientation);
        Ok(img)
    }

    fn render(
        &self,
        image: &DynamicImage,
        params: &RenderParams,
    ) -> Result<Rendered, BackendError> {
        if params.target.width == 0 || params.target.height == 0 {
            return Err(BackendError::Encode("target canvas has no pixels".into()));
        }
        let best = find_best_crop(image, params.target, &params.detector)
            .ok_or_else(|| BackendError::Crop("image has no pixels".into()))?;
        debug!(
            crop = ?best.crop,
            total = best.score.total,
            detail = best.score.detail,
            skin = best.score.skin,
            saturation = best.score.saturation,
            "crop selected"
        );

        let canvas = draw_crop(image, best.crop, params.target);
        let payload = encode_webp(&canvas, params.quality)?;

        Ok(Rendered {
            crop: best.crop,
            dimensions: Dimensions::new(canvas.width(), canvas.height()),
            payload,
        })
    }
}
