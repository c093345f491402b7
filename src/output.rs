//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every selected image is shown by its position in the selection and its
//! file name, with details (source path, output filename, failure) indented
//! beneath or after it. Positions are 1-based and zero-padded for display;
//! the index embedded in output filenames stays 0-based.
//!
//! # Output Format
//!
//! ## Selection
//!
//! ```text
//! Selection (2 images)
//! 001 beach.jpg
//!     Source: photos/beach.jpg
//! 002 broken.jpg
//!     Source: photos/broken.jpg
//! ```
//!
//! ## Process
//!
//! ```text
//! Processing 2 images (batch 2024-06-15)
//!     001 beach.jpg → rioyi-dev-2024-06-15-20240615123045-0-beach.webp (41.2 KB)
//!     002 broken.jpg
//!         ❌ Error loading image broken.jpg
//! ```
//!
//! ## Download
//!
//! ```text
//! Saved 1 image → cropped/
//!     rioyi-dev-2024-06-15-20240615123045-0-beach.webp
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::process::{ItemOutcome, ProcessEvent};
use crate::session::DownloadReport;
use crate::types::InputImage;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 0-based selection index as a 1-based, 3-digit zero-padded position.
fn format_position(index: usize) -> String {
    format!("{:0>3}", index + 1)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Human-readable byte size.
///
/// ```text
/// 512 B
/// 41.2 KB
/// 1.5 MB
/// ```
pub fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / MB)
    }
}

// ============================================================================
// Selection
// ============================================================================

pub fn format_selection(inputs: &[InputImage]) -> Vec<String> {
    let mut lines = vec![format!("Selection ({})", plural(inputs.len(), "image"))];
    for (idx, input) in inputs.iter().enumerate() {
        lines.push(format!("{} {}", format_position(idx), input.name));
        lines.push(format!("{}Source: {}", indent(1), input.path.display()));
    }
    lines
}

pub fn print_selection(inputs: &[InputImage]) {
    for line in format_selection(inputs) {
        println!("{}", line);
    }
}

// ============================================================================
// Process
// ============================================================================

/// Format a single progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::BatchStarted { total, batch_date } => {
            vec![format!(
                "Processing {} (batch {})",
                plural(*total, "image"),
                batch_date
            )]
        }
        ProcessEvent::ItemFinished {
            index,
            name,
            outcome,
        } => match outcome {
            ItemOutcome::Processed { filename, size } => vec![format!(
                "{}{} {} \u{2192} {} ({})",
                indent(1),
                format_position(*index),
                name,
                filename,
                format_size(*size)
            )],
            ItemOutcome::Failed { message } => vec![
                format!("{}{} {}", indent(1), format_position(*index), name),
                format!("{}{}", indent(2), message),
            ],
        },
    }
}

/// Status log, one line per message.
pub fn format_messages(messages: &[String]) -> Vec<String> {
    let mut lines = vec!["Messages".to_string()];
    lines.extend(messages.iter().map(|m| format!("{}{}", indent(1), m)));
    lines
}

pub fn print_messages(messages: &[String]) {
    for line in format_messages(messages) {
        println!("{}", line);
    }
}

// ============================================================================
// Download
// ============================================================================

pub fn format_download(report: &DownloadReport, dest: &Path) -> Vec<String> {
    let mut lines = vec![format!(
        "Saved {} \u{2192} {}/",
        plural(report.written.len(), "image"),
        dest.display()
    )];
    for path in &report.written {
        let name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        lines.push(format!("{}{}", indent(1), name));
    }
    if report.failed > 0 {
        lines.push(format!("{} could not be saved", plural(report.failed, "image")));
    }
    lines
}

pub fn print_download(report: &DownloadReport, dest: &Path) {
    for line in format_download(report, dest) {
        println!("{}", line);
    }
}

/// One-line batch summary.
pub fn format_summary(processed: usize, total: usize) -> String {
    if processed == total {
        format!("Processed {}", plural(total, "image"))
    } else {
        format!(
            "Processed {} of {} ({} failed)",
            processed,
            plural(total, "image"),
            total - processed
        )
    }
}
