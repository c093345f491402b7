//! Output filename generation.
//!
//! Every processed image is named after the brand, the batch date, the moment
//! it was encoded, its position in the selection, and the original name:
//!
//! ```text
//! rioyi-dev-2024-06-15-20240615123045-2-beach.webp
//! └─brand─┘ └─batch──┘ └──timestamp──┘ │ └stem┘
//!                                      index
//! ```
//!
//! The batch date is computed once per batch so all items share it; the
//! timestamp is read per item at encode time. Both come from a [`Clock`] so
//! tests can pin them.

use chrono::{Local, NaiveDateTime};

/// Extension of every generated file.
pub const OUTPUT_EXTENSION: &str = "webp";

/// Source of local wall-clock time.
pub trait Clock: Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The real local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// `YYYY-MM-DD`, shared by every file of a batch.
pub fn batch_date_label(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%d").to_string()
}

/// `YYYYMMDDHHmmss`, taken per file.
pub fn timestamp_label(at: NaiveDateTime) -> String {
    at.format("%Y%m%d%H%M%S").to_string()
}

/// Strip the last extension from a file name.
///
/// Removes a trailing `.` plus one or more characters that are neither `.`
/// nor `/`. Names without such a suffix are returned unchanged:
/// - `"beach.jpg"` → `"beach"`
/// - `"archive.tar.gz"` → `"archive.tar"`
/// - `".hidden"` → `""`
/// - `"trailing."` → `"trailing."`
/// - `"noext"` → `"noext"`
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) => {
            let ext = &name[dot + 1..];
            if ext.is_empty() || ext.contains('/') {
                name
            } else {
                &name[..dot]
            }
        }
        None => name,
    }
}

/// Build the download filename for one processed image.
pub fn output_filename(
    brand: &str,
    batch_date: &str,
    timestamp: &str,
    index: usize,
    original_name: &str,
) -> String {
    format!(
        "{brand}-{batch_date}-{timestamp}-{index}-{}.{OUTPUT_EXTENSION}",
        strip_extension(original_name)
    )
}
