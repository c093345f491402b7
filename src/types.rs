//! Shared types used across the session, the batch orchestrator and the
//! presentation layer.

use crate::imaging::{CropRect, Dimensions};
use crate::lifecycle::{Payload, RefKind, RefTracker, TransientRef};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Whether a batch is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingState {
    #[default]
    Idle,
    Processing,
}

/// A selected file, with a live preview reference.
#[derive(Debug)]
pub struct InputImage {
    pub path: PathBuf,
    /// File name as shown to the user and used for the output stem.
    pub name: String,
    pub preview: TransientRef,
}

impl InputImage {
    /// Register a preview for `path` and wrap it as a selected input.
    pub fn register(tracker: &RefTracker, path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path: path.to_path_buf(),
            name,
            preview: tracker.acquire(RefKind::Preview, Payload::File(path.to_path_buf())),
        }
    }
}

/// A successfully processed image. The encoded bytes live behind `handle`.
#[derive(Debug)]
pub struct OutputImage {
    pub filename: String,
    /// Position of the source in the selection.
    pub index: usize,
    pub source_name: String,
    pub dimensions: Dimensions,
    pub crop: CropRect,
    /// Encoded size in bytes.
    pub size: usize,
    pub handle: TransientRef,
}

/// Serializable view of an [`OutputImage`], for `--json` style listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputSummary {
    pub filename: String,
    pub index: usize,
    pub source: String,
    pub width: u32,
    pub height: u32,
    pub size: usize,
    pub locator: String,
}

impl From<&OutputImage> for OutputSummary {
    fn from(out: &OutputImage) -> Self {
        Self {
            filename: out.filename.clone(),
            index: out.index,
            source: out.source_name.clone(),
            width: out.dimensions.width,
            height: out.dimensions.height,
            size: out.size,
            locator: out.handle.locator().to_string(),
        }
    }
}

/// Ordered log of human-readable status lines.
///
/// Items finishing on different threads append concurrently; each push is a
/// single locked operation so no line is lost or interleaved.
#[derive(Debug, Default)]
pub struct StatusLog {
    lines: Mutex<Vec<String>>,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, line: impl Into<String>) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.into());
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
