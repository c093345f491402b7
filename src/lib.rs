//! # rioyi-crop
//!
//! Batch content-aware cropping. Select any number of photos, and each one is
//! cropped around its most interesting region, resized to a fixed 650×434
//! canvas, and encoded as lossy WebP (quality 80) under a predictable name:
//!
//! ```text
//! rioyi-dev-2024-06-15-20240615123045-0-beach.webp
//! ```
//!
//! # Architecture
//!
//! ```text
//! paths ──► scan ──► Session::select ──► Session::process ──► Session::download_all
//!                      │ preview refs      │ rayon fan-out         │ write files,
//!                      │                   │ per-item messages     │ revoke output refs
//!                      ▼                   ▼                       ▼
//!                   RefTracker ◄──── output refs ─────────────── report (index.html)
//! ```
//!
//! A failing item never stops the batch: it yields one status message and no
//! output. The session owns all state; nothing is global.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Expands command-line paths (files and directories) into the selection |
//! | [`session`] | Selection, outputs, status messages, processing state, downloads |
//! | [`process`] | Single-image pipeline and the concurrent batch orchestrator |
//! | [`lifecycle`] | Transient references to previews and outputs, revoked exactly once |
//! | [`imaging`] | Decode, smart-crop detection, resize and WebP encoding |
//! | [`naming`] | Output filenames, date/timestamp labels, the clock seam |
//! | [`config`] | TOML configuration: loading, merging, validation |
//! | [`types`] | Shared types (`InputImage`, `OutputImage`, `StatusLog`) |
//! | [`report`] | HTML results page rendered with Maud |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## References Are Owned Values
//!
//! Every preview and output is reachable through a
//! [`TransientRef`](lifecycle::TransientRef) that revokes itself when dropped.
//! Replacing a selection, downloading everything, or dropping the session
//! releases references simply by dropping the values that own them, so a
//! reference cannot be revoked twice or read after revocation.
//!
//! ## Pure-Rust Smart Crop
//!
//! Crop detection lives in [`imaging::smartcrop`]: edge, skin-tone and
//! saturation features are scored over every window of the target aspect
//! ratio. Decoding and resizing use the `image` crate; only the final lossy
//! WebP encode goes through libwebp.
//!
//! ## Testable Seams
//!
//! The backend ([`imaging::ImageBackend`]) and the clock ([`naming::Clock`])
//! are traits, so the whole batch flow runs in unit tests against a recording
//! mock backend and a frozen clock.

pub mod config;
pub mod imaging;
pub mod lifecycle;
pub mod naming;
pub mod output;
pub mod process;
pub mod report;
pub mod scan;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
