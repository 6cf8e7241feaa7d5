//! Error types for the booking-confirm library.
//!
//! Every failure in the extract → generate → save pipeline is fatal for the
//! current invocation, so a single enum covers them all. Variants fall into
//! four families:
//!
//! * **Input validation** — the operator supplied something we cannot read
//!   (wrong extension, missing file, a document with almost no text).
//!   [`BookingError::is_validation`] is `true` for these so the web layer can
//!   answer `400` instead of `500`.
//! * **Upstream API** — the LLM provider is missing, failed, or replied with
//!   something that is not a booking record. The raw reply is kept so an
//!   operator can see what the model actually said.
//! * **PDF** — pdfium could not be bound, could not open the file, or failed on
//!   a page.
//! * **I/O and configuration**.
//!
//! Missing booking fields are *not* errors: they are reported as warnings by
//! [`crate::booking::BookingRecord::missing_required_fields`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the booking-confirm library.
#[derive(Debug, Error)]
pub enum BookingError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file extension is not one we can ingest.
    #[error("Unsupported file type '{extension}' for '{name}'. Allowed: PDF, DOCX, TXT{hint}")]
    UnsupportedFormat {
        name: String,
        extension: String,
        hint: &'static str,
    },

    /// The file has a `.pdf` extension but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// Extracted or pasted text is below the minimum length.
    #[error("{source_kind} appears empty (only {chars} characters, need at least {min}). Please check the content.")]
    TextTooShort {
        source_kind: &'static str,
        chars: usize,
        min: usize,
    },

    /// The Word document could not be opened or its body could not be read.
    #[error("Could not read Word document '{path}': {detail}")]
    DocxUnreadable { path: PathBuf, detail: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' could not be opened: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH to the directory containing libpdfium, or install it system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API call failed.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// The model replied, but the reply is not what the stage expects.
    #[error("Could not parse {stage} reply: {detail}\nResponse was: {raw}")]
    MalformedReply {
        stage: &'static str,
        detail: String,
        raw: String,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the confirmation file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BookingError {
    /// `true` when the operator's input was at fault rather than the system.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BookingError::FileNotFound { .. }
                | BookingError::PermissionDenied { .. }
                | BookingError::UnsupportedFormat { .. }
                | BookingError::NotAPdf { .. }
                | BookingError::TextTooShort { .. }
                | BookingError::DocxUnreadable { .. }
        )
    }
}
