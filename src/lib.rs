//! # booking-confirm
//!
//! Turn hotel booking documents into branded HTML confirmations using LLMs.
//!
//! ## Why this crate?
//!
//! Booking exports arrive as scanned PDFs, Word files or text pasted from
//! e-mails, and no two channels lay them out the same way. Rather than
//! maintain a parser per channel, this crate shows the document to a model
//! (page images for PDFs, flattened text otherwise), asks for a structured
//! [`BookingRecord`], and then asks a second time for a confirmation page that
//! follows The Planters House brand guide.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / DOCX / TXT / pasted text
//!  │
//!  ├─ 1. Ingest    PDF → page images (pdfium); DOCX/TXT → text, length-checked
//!  ├─ 2. Extract   LLM call #1 → JSON → BookingRecord
//!  ├─ 3. Review    (web only) operator edits the record
//!  ├─ 4. Generate  LLM call #2 → HTML, brand audit (warnings only)
//!  └─ 5. Save      <output_dir>/<res_id>_confirmation.html
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use booking_confirm::{TransformConfig, Transformer};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider from BOOKING_LLM_PROVIDER / BOOKING_MODEL, default Anthropic.
//!     let transformer = Transformer::from_config(TransformConfig::default())?;
//!     let output = transformer.transform(Path::new("booking.pdf")).await?;
//!     println!("{} → {}", output.record.guest_label(), output.confirmation.html_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `confirm` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `web`   | on      | Enables the [`web`] review form and the `confirm-web` binary (axum) |
//!
//! Disable both when using only the library:
//! ```toml
//! booking-confirm = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod booking;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod transform;
#[cfg(feature = "web")]
pub mod web;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use booking::{AgentInfo, BookingRecord, BookingType, Layout, PaymentStatus, Room};
pub use config::{TransformConfig, TransformConfigBuilder, WebConfig};
pub use error::BookingError;
pub use pipeline::input::{DocumentKind, IngestedDocument};
pub use pipeline::llm::{BookingModel, ModelReply, ModelRequest, ProviderModel};
pub use progress::{NoopProgressCallback, ProgressCallback, Stage, TransformProgressCallback};
pub use transform::{Confirmation, TransformOutput, TransformStats, Transformer};
