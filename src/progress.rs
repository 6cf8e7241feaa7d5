//! Progress-callback trait for per-stage transformation events.
//!
//! Attach an [`Arc<dyn TransformProgressCallback>`] with
//! [`crate::transform::Transformer::with_progress`] to hear when each stage
//! starts and finishes. The CLI drives its spinner from these events; the web
//! server relies on `tracing` instead and uses the no-op default.
//!
//! # Example
//!
//! ```rust
//! use booking_confirm::progress::{Stage, TransformProgressCallback};
//! use std::sync::Mutex;
//!
//! struct StageLog(Mutex<Vec<Stage>>);
//!
//! impl TransformProgressCallback for StageLog {
//!     fn on_stage_complete(&self, stage: Stage, _detail: &str) {
//!         self.0.lock().unwrap().push(stage);
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

/// The four steps of a transformation, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading and normalising the input document.
    Ingest,
    /// First LLM call: document → booking record.
    Extract,
    /// Second LLM call: booking record → HTML.
    Generate,
    /// Writing the confirmation file.
    Save,
}

impl Stage {
    /// Present-tense description shown while the stage runs.
    pub fn activity(self) -> &'static str {
        match self {
            Stage::Ingest => "Reading document",
            Stage::Extract => "Extracting booking details",
            Stage::Generate => "Generating confirmation",
            Stage::Save => "Saving confirmation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Ingest => "ingest",
            Stage::Extract => "extract",
            Stage::Generate => "generate",
            Stage::Save => "save",
        };
        f.write_str(name)
    }
}

/// Called by [`crate::transform::Transformer`] around each stage.
///
/// All methods default to no-ops so callers only override what they need.
pub trait TransformProgressCallback: Send + Sync {
    /// Called just before a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage succeeds.
    ///
    /// # Arguments
    /// * `stage`  — the stage that finished
    /// * `detail` — short human-readable summary (page count, guest, path)
    fn on_stage_complete(&self, stage: Stage, detail: &str) {
        let _ = (stage, detail);
    }

    /// Called when a stage fails. The error is also returned to the caller.
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl TransformProgressCallback for NoopProgressCallback {}

/// Shared handle stored by the transformer.
pub type ProgressCallback = Arc<dyn TransformProgressCallback>;
