//! Batch processing: read, decode, crop, encode and name every selected image.
//!
//! ## Per-item pipeline
//!
//! ```text
//! read bytes ──► decode ──► detect crop ──► resize to canvas ──► WebP ──► name ──► output ref
//!     │             │                 │                            │
//!  FileRead    ImageDecode        CropEncode                   CropEncode (empty payload)
//! ```
//!
//! A failing item contributes exactly one status message, appended the moment
//! it fails, and no output. Its siblings carry on.
//!
//! ## Batch
//!
//! The batch date is computed once, every item gets its selection index before
//! dispatch, and all items run in parallel on the rayon pool. Once every item
//! has settled, successes are collected in selection order and one
//! `✅ Processed: <filename>` line is appended per success.
//!
//! Progress events are sent on an optional channel so the CLI can print lines
//! as items finish, while the workers are still busy.

use crate::imaging::{BackendError, CanvasConfig, ImageBackend, decode_image, render_canvas};
use crate::lifecycle::{Payload, RefKind, RefTracker};
use crate::naming::{Clock, batch_date_label, output_filename, timestamp_label};
use crate::types::{InputImage, OutputImage, StatusLog};
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Status line appended when processing is requested with nothing selected.
pub const EMPTY_SELECTION_MESSAGE: &str = "❌ You must select at least one image.";

/// Why a single item produced no output.
#[derive(Error, Debug)]
pub enum ItemError {
    #[error("cannot read {name}: {source}")]
    FileRead {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot decode {name}: {source}")]
    ImageDecode {
        name: String,
        #[source]
        source: BackendError,
    },
    #[error("cannot process {name}: {source}")]
    CropEncode {
        name: String,
        #[source]
        source: BackendError,
    },
}

impl ItemError {
    /// The line appended to the status log for this failure.
    pub fn status_message(&self) -> String {
        match self {
            ItemError::FileRead { name, .. } => format!("❌ Error reading file {name}"),
            ItemError::ImageDecode { name, .. } => format!("❌ Error loading image {name}"),
            ItemError::CropEncode { name, source } => {
                format!("❌ Error processing {name}: {source}")
            }
        }
    }
}

/// Why a batch was not run at all.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProcessError {
    #[error("no images selected")]
    EmptySelection,
    #[error("a batch is already being processed")]
    AlreadyProcessing,
}

/// Status line for a successful item.
pub fn success_message(filename: &str) -> String {
    format!("✅ Processed: {filename}")
}

/// Progress reported while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    BatchStarted {
        total: usize,
        batch_date: String,
    },
    ItemFinished {
        index: usize,
        name: String,
        outcome: ItemOutcome,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Processed { filename: String, size: usize },
    Failed { message: String },
}

/// Everything shared by the items of one batch.
pub struct BatchContext<'a, B: ImageBackend, C: Clock> {
    pub backend: &'a B,
    pub clock: &'a C,
    pub tracker: &'a RefTracker,
    pub canvas: &'a CanvasConfig,
    pub brand: &'a str,
    pub status: &'a StatusLog,
}

/// Run the whole pipeline for one input.
///
/// Pure with respect to the status log: the caller decides where messages go.
pub fn process_item<B: ImageBackend, C: Clock>(
    ctx: &BatchContext<'_, B, C>,
    batch_date: &str,
    index: usize,
    input: &InputImage,
) -> Result<OutputImage, ItemError> {
    let name = &input.name;
    let bytes = std::fs::read(&input.path).map_err(|source| ItemError::FileRead {
        name: name.clone(),
        source,
    })?;

    let image = decode_image(ctx.backend, &bytes).map_err(|source| ItemError::ImageDecode {
        name: name.clone(),
        source,
    })?;
    debug!(index, %name, width = image.width(), height = image.height(), "decoded");

    let rendered =
        render_canvas(ctx.backend, &image, ctx.canvas).map_err(|source| ItemError::CropEncode {
            name: name.clone(),
            source,
        })?;

    let timestamp = timestamp_label(ctx.clock.now());
    let filename = output_filename(ctx.brand, batch_date, &timestamp, index, name);
    let size = rendered.payload.len();
    let handle = ctx
        .tracker
        .acquire(RefKind::Output, Payload::Bytes(Arc::from(rendered.payload)));
    debug!(index, %filename, size, crop = ?rendered.crop, "encoded");

    Ok(OutputImage {
        filename,
        index,
        source_name: name.clone(),
        dimensions: rendered.dimensions,
        crop: rendered.crop,
        size,
        handle,
    })
}

/// Process one item and report it: failures go to the status log at once.
fn run_item<B: ImageBackend, C: Clock>(
    ctx: &BatchContext<'_, B, C>,
    batch_date: &str,
    index: usize,
    input: &InputImage,
    events: Option<&Sender<ProcessEvent>>,
) -> Option<OutputImage> {
    let result = process_item(ctx, batch_date, index, input);
    let outcome = match &result {
        Ok(output) => ItemOutcome::Processed {
            filename: output.filename.clone(),
            size: output.size,
        },
        Err(e) => {
            warn!(index, error = %e, "item failed");
            let message = e.status_message();
            ctx.status.push(message.clone());
            ItemOutcome::Failed { message }
        }
    };
    if let Some(tx) = events {
        tx.send(ProcessEvent::ItemFinished {
            index,
            name: input.name.clone(),
            outcome,
        })
        .ok();
    }
    result.ok()
}

/// Process every input concurrently and collect the successes in selection order.
///
/// An empty selection appends [`EMPTY_SELECTION_MESSAGE`] and returns
/// [`ProcessError::EmptySelection`]. Item failures never fail the batch.
pub fn process_batch<B: ImageBackend, C: Clock>(
    ctx: &BatchContext<'_, B, C>,
    inputs: &[InputImage],
    events: Option<Sender<ProcessEvent>>,
) -> Result<Vec<OutputImage>, ProcessError> {
    if inputs.is_empty() {
        ctx.status.push(EMPTY_SELECTION_MESSAGE);
        return Err(ProcessError::EmptySelection);
    }

    let batch_date = batch_date_label(ctx.clock.now());
    info!(total = inputs.len(), %batch_date, "batch started");
    if let Some(tx) = &events {
        tx.send(ProcessEvent::BatchStarted {
            total: inputs.len(),
            batch_date: batch_date.clone(),
        })
        .ok();
    }

    let settled: Vec<Option<OutputImage>> = inputs
        .par_iter()
        .enumerate()
        .map_with(events, |tx, (index, input)| {
            run_item(ctx, &batch_date, index, input, tx.as_ref())
        })
        .collect();

    let outputs: Vec<OutputImage> = settled.into_iter().flatten().collect();
    for output in &outputs {
        ctx.status.push(success_message(&output.filename));
    }
    info!(
        total = inputs.len(),
        processed = outputs.len(),
        failed = inputs.len() - outputs.len(),
        "batch finished"
    );
    Ok(outputs)
}
