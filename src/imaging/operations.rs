//! High-level image operations.
//!
//! These functions combine configuration with backend execution: they decide
//! the render parameters, call the backend, and enforce the output contract.

use super::backend::{BackendError, ImageBackend, Rendered};
use super::params::{Dimensions, Quality, RenderParams};
use super::smartcrop::CropOptions;
use image::DynamicImage;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Configuration for the fixed-size output canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasConfig {
    pub size: Dimensions,
    pub quality: Quality,
    pub detector: CropOptions,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            size: Dimensions::new(650, 434),
            quality: Quality::default(),
            detector: CropOptions::default(),
        }
    }
}

/// Plan a render without executing it.
pub fn plan_render(config: &CanvasConfig) -> RenderParams {
    RenderParams {
        target: config.size,
        quality: config.quality,
        detector: config.detector.clone(),
    }
}

/// Decode file bytes using the backend.
pub fn decode_image(backend: &impl ImageBackend, bytes: &[u8]) -> Result<DynamicImage> {
    backend.decode(bytes)
}

/// Crop, resize and encode a decoded image onto the configured canvas.
///
/// An empty payload from the encoder is reported as an encoding error.
pub fn render_canvas(
    backend: &impl ImageBackend,
    image: &DynamicImage,
    config: &CanvasConfig,
) -> Result<Rendered> {
    let rendered = backend.render(image, &plan_render(config))?;
    if rendered.payload.is_empty() {
        return Err(BackendError::Encode("encoder produced no data".into()));
    }
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    #[test]
    fn plan_render_uses_canvas_defaults() {
        let params = plan_render(&CanvasConfig::default());
        assert_eq!(params.target, Dimensions::new(650, 434));
        assert_eq!(params.quality.value(), 80);
    }

    #[test]
    fn render_canvas_passes_config_to_backend() {
        let backend = MockBackend::new();
        let img = decode_image(&backend, b"1000x800").unwrap();
        let config = CanvasConfig {
            size: Dimensions::new(300, 200),
            quality: Quality::new(65),
            ..CanvasConfig::default()
        };

        let rendered = render_canvas(&backend, &img, &config).unwrap();
        assert_eq!(rendered.dimensions, Dimensions::new(300, 200));

        let ops = backend.get_operations();
        assert!(matches!(
            &ops[1],
            RecordedOp::Render {
                source: (1000, 800),
                width: 300,
                height: 200,
                quality: 65,
            }
        ));
    }

    #[test]
    fn render_canvas_rejects_empty_payload() {
        let backend = MockBackend::with_empty_payload();
        let img = DynamicImage::new_rgb8(10, 10);
        let result = render_canvas(&backend, &img, &CanvasConfig::default());
        assert!(matches!(result, Err(BackendError::Encode(_))));
    }

    #[test]
    fn render_canvas_propagates_crop_failure() {
        let backend = MockBackend::failing_render();
        let img = DynamicImage::new_rgb8(10, 10);
        let result = render_canvas(&backend, &img, &CanvasConfig::default());
        assert!(matches!(result, Err(BackendError::Crop(_))));
    }
}
