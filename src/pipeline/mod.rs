//! Pipeline stages for booking-document → confirmation transformation.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the LLM can be swapped for a canned model.
//!
//! ## Data Flow
//!
//! ```text
//!            ┌─▶ render ──▶ encode ─┐
//! input ─────┤   (pdfium)  (base64) ├──▶ llm ──▶ postprocess ──▶ llm ──▶ postprocess ──▶ output
//! (pdf/docx/ └─▶ docx / text ───────┘  (extract)  (JSON)        (generate)  (HTML)       (file)
//!  txt/paste)
//! ```
//!
//! 1. [`input`]  — pick the format by extension, validate, normalise to page
//!    images or text
//! 2. [`render`] — rasterise PDF pages; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`encode`] — PNG-encode and base64-wrap each page image
//! 4. [`docx`]   — flatten Word paragraphs and table rows to text
//! 5. [`llm`]    — the model seam; the only stage with network I/O
//! 6. [`postprocess`] — unwrap fenced replies, decode the booking, audit the
//!    generated document
//! 7. [`output`] — write `<res_id>_confirmation.html`

pub mod docx;
pub mod encode;
pub mod input;
pub mod llm;
pub mod output;
pub mod postprocess;
pub mod render;
