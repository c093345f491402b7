//! Shared test utilities for the rioyi-crop test suite.
//!
//! Two kinds of source files are used:
//! - **mock sources**: text such as `"800x600"` that
//!   [`MockBackend`](crate::imaging::backend::tests::MockBackend) decodes into a
//!   blank canvas of that size. Anything else fails to decode.
//! - **real sources**: small JPEG/PNG files written with the `image` crate, for
//!   tests that run the real backend.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let paths = write_mock_sources(tmp.path(), &[("a.jpg", "800x600"), ("bad.jpg", "nope")]);
//! let inputs: Vec<_> = paths.iter().map(|p| mock_input(&tracker, p)).collect();
//! ```

use crate::lifecycle::RefTracker;
use crate::types::InputImage;
use image::{ImageFormat, Rgb, RgbImage};
use std::path::{Path, PathBuf};

// =========================================================================
// Fixture setup
// =========================================================================

/// Write each `(file name, contents)` pair into `dir` and return the paths
/// in the same order.
pub fn write_mock_sources(dir: &Path, files: &[(&str, &str)]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|(name, contents)| {
            let path = dir.join(name);
            std::fs::write(&path, contents).unwrap();
            path
        })
        .collect()
}

/// Register `path` as a selected input.
pub fn mock_input(tracker: &RefTracker, path: &Path) -> InputImage {
    InputImage::register(tracker, path)
}

/// A gradient with a bright block, so the crop detector has something to find.
fn test_pattern(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        if x > width / 2 && y < height / 2 {
            Rgb([230, 40, 40])
        } else {
            Rgb([(x % 256) as u8, (y % 256) as u8, 96])
        }
    })
}

/// Write a real JPEG of the given size.
pub fn write_jpeg(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    test_pattern(width, height)
        .save_with_format(&path, ImageFormat::Jpeg)
        .unwrap();
    path
}

/// Write a real PNG of the given size.
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    test_pattern(width, height)
        .save_with_format(&path, ImageFormat::Png)
        .unwrap();
    path
}

/// Write a file with an image extension that no decoder accepts.
pub fn write_corrupt(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"\xFF\xD8\xFF\xE0 truncated").unwrap();
    path
}

// =========================================================================
// Output assertions
// =========================================================================

/// Assert that `filename` has the `<brand>-<date>-<14 digits>-<index>-<stem>.webp` shape.
pub fn assert_output_name(filename: &str, brand: &str, date: &str, index: usize, stem: &str) {
    let prefix = format!("{brand}-{date}-");
    let rest = filename
        .strip_prefix(&prefix)
        .unwrap_or_else(|| panic!("'{filename}' does not start with '{prefix}'"));
    let (timestamp, tail) = rest.split_at(14);
    assert!(
        timestamp.chars().all(|c| c.is_ascii_digit()),
        "'{filename}' has no 14-digit timestamp"
    );
    assert_eq!(tail, format!("-{index}-{stem}.webp"), "filename tail mismatch");
}
