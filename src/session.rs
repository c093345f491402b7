//! The cropping session: current selection, processed outputs, status
//! messages and processing state.
//!
//! ## Reference lifecycle
//!
//! | Event | Previews | Outputs |
//! |---|---|---|
//! | `select` | old revoked, then new registered | revoked |
//! | `process` | kept | replaced by the new batch |
//! | `download` | kept | kept |
//! | `download_all` | kept | written, then revoked |
//! | drop | revoked | revoked |
//!
//! Every reference is a [`TransientRef`](crate::lifecycle::TransientRef)
//! owned by an [`InputImage`] or [`OutputImage`], so releasing the value is
//! what revokes the reference.

use crate::config::CropperConfig;
use crate::imaging::{CanvasConfig, ImageBackend};
use crate::lifecycle::{LifecycleError, RefKind, RefTracker};
use crate::naming::{Clock, SystemClock};
use crate::process::{BatchContext, ProcessError, ProcessEvent, process_batch};
use crate::types::{InputImage, OutputImage, OutputSummary, ProcessingState, StatusLog};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Payload error: {0}")]
    Lifecycle(#[from] LifecycleError),
    #[error("No processed image at position {0}")]
    NoSuchOutput(usize),
}

/// Result of a download-all.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub written: Vec<PathBuf>,
    pub failed: usize,
}

pub struct Session<B: ImageBackend, C: Clock = SystemClock> {
    backend: B,
    clock: C,
    tracker: RefTracker,
    canvas: CanvasConfig,
    brand: String,
    inputs: Vec<InputImage>,
    outputs: Vec<OutputImage>,
    status: StatusLog,
    state: ProcessingState,
}

impl<B: ImageBackend> Session<B, SystemClock> {
    pub fn new(backend: B, config: &CropperConfig) -> Self {
        Self::with_clock(backend, SystemClock, config)
    }
}

impl<B: ImageBackend, C: Clock> Session<B, C> {
    pub fn with_clock(backend: B, clock: C, config: &CropperConfig) -> Self {
        Self {
            backend,
            clock,
            tracker: RefTracker::new(),
            canvas: config.canvas(),
            brand: config.output.brand.clone(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            status: StatusLog::new(),
            state: ProcessingState::Idle,
        }
    }

    /// Replace the selection.
    ///
    /// Previous previews and outputs are revoked and the status log cleared
    /// before any new preview is registered.
    pub fn select(&mut self, paths: &[PathBuf]) {
        let released = self.inputs.len() + self.outputs.len();
        self.outputs.clear();
        self.inputs.clear();
        self.status.clear();
        if released > 0 {
            debug!(released, "previous selection released");
        }

        self.inputs = paths
            .iter()
            .map(|p| InputImage::register(&self.tracker, p))
            .collect();
        info!(selected = self.inputs.len(), "selection replaced");
    }

    /// Process the current selection.
    ///
    /// Returns the number of images processed. The output set is replaced in
    /// one step when the batch settles.
    pub fn process(&mut self, events: Option<Sender<ProcessEvent>>) -> Result<usize, ProcessError> {
        if self.state == ProcessingState::Processing {
            return Err(ProcessError::AlreadyProcessing);
        }
        if self.inputs.is_empty() {
            // Only the message is added; state and outputs stay as they are.
            return process_batch(&self.batch_context(), &self.inputs, events).map(|o| o.len());
        }

        self.state = ProcessingState::Processing;
        let result = process_batch(&self.batch_context(), &self.inputs, events);
        self.state = ProcessingState::Idle;

        let outputs = result?;
        let count = outputs.len();
        self.outputs = outputs;
        Ok(count)
    }

    fn batch_context(&self) -> BatchContext<'_, B, C> {
        BatchContext {
            backend: &self.backend,
            clock: &self.clock,
            tracker: &self.tracker,
            canvas: &self.canvas,
            brand: &self.brand,
            status: &self.status,
        }
    }

    /// Write one output into `dest` under its generated filename. The
    /// reference stays live.
    pub fn download(&self, position: usize, dest: &Path) -> Result<PathBuf, SessionError> {
        let output = self
            .outputs
            .get(position)
            .ok_or(SessionError::NoSuchOutput(position))?;
        fs::create_dir_all(dest)?;
        let path = dest.join(&output.filename);
        fs::write(&path, output.handle.read()?)?;
        debug!(path = %path.display(), "downloaded");
        Ok(path)
    }

    /// Write every output into `dest`, one after another, then release them.
    ///
    /// A file that cannot be written gets a status message; the rest are
    /// still written. Every output reference is revoked either way.
    pub fn download_all(&mut self, dest: &Path) -> Result<DownloadReport, SessionError> {
        fs::create_dir_all(dest)?;
        let mut report = DownloadReport::default();

        for output in std::mem::take(&mut self.outputs) {
            let path = dest.join(&output.filename);
            let written = output
                .handle
                .read()
                .map_err(SessionError::from)
                .and_then(|bytes| fs::write(&path, bytes).map_err(SessionError::from));
            match written {
                Ok(()) => report.written.push(path),
                Err(e) => {
                    warn!(file = %output.filename, error = %e, "download failed");
                    self.status
                        .push(format!("❌ Error saving {}: {e}", output.filename));
                    report.failed += 1;
                }
            }
        }

        info!(
            written = report.written.len(),
            failed = report.failed,
            live_outputs = self.tracker.live_count_of(RefKind::Output),
            "download all finished"
        );
        Ok(report)
    }

    pub fn inputs(&self) -> &[InputImage] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[OutputImage] {
        &self.outputs
    }

    pub fn output_summaries(&self) -> Vec<OutputSummary> {
        self.outputs.iter().map(OutputSummary::from).collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.status.snapshot()
    }

    pub fn state(&self) -> ProcessingState {
        self.state
    }

    pub fn tracker(&self) -> &RefTracker {
        &self.tracker
    }

    pub fn canvas(&self) -> &CanvasConfig {
        &self.canvas
    }

    /// Caption for the process action.
    pub fn process_label(&self) -> &'static str {
        match self.state {
            ProcessingState::Idle => "Process images",
            ProcessingState::Processing => "Processing...",
        }
    }
}

impl<B: ImageBackend, C: Clock> Drop for Session<B, C> {
    fn drop(&mut self) {
        self.outputs.clear();
        self.inputs.clear();
        debug!(stats = %self.tracker.stats(), "session closed");
    }
}
