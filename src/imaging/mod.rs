//! Image processing: decode, content-aware crop, resize, encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image` crate, format sniffed from content |
//! | **Crop detection** | [`smartcrop`] (edge / skin / saturation scoring) |
//! | **Resize** | Lanczos3 onto a fixed canvas |
//! | **Encode** | lossy WebP via `webp` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop geometry (unit testable)
//! - **Smart crop**: The content-aware window search
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining configuration + backend

pub mod backend;
pub mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;
pub mod smartcrop;

pub use backend::{BackendError, ImageBackend, Rendered};
pub use operations::{CanvasConfig, decode_image, render_canvas};
pub use params::{CropRect, Dimensions, Quality, RenderParams};
pub use rust_backend::{MAX_WEBP_DIMENSION, RustBackend, supported_input_extensions};
pub use smartcrop::CropOptions;
