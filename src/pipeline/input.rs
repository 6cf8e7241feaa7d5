//! Input resolution: turn a user-supplied file or pasted text into something
//! the extraction call can consume.
//!
//! PDFs become page images (scans carry their layout, which the model reads
//! better than any text layer); Word and text files become a single text
//! blob. Documents with almost no text are rejected here rather than sent to
//! the model, which would otherwise happily invent a booking.

use crate::config::TransformConfig;
use crate::error::BookingError;
use crate::pipeline::{docx, encode, render};
use edgequake_llm::ImageData;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Supported input formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Text,
}

impl DocumentKind {
    /// Classify a file name by extension (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self, BookingError> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "docx" => Ok(DocumentKind::Docx),
            "txt" => Ok(DocumentKind::Text),
            _ => Err(BookingError::UnsupportedFormat {
                name: name.to_string(),
                extension,
                hint: if name.to_ascii_lowercase().ends_with(".doc") {
                    " (legacy .doc files must be re-saved as .docx)"
                } else {
                    ""
                },
            }),
        }
    }

    /// Human label used in validation messages.
    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "PDF",
            DocumentKind::Docx => "Word document",
            DocumentKind::Text => "Text file",
        }
    }
}

/// A document normalised for the extraction call: images or text, never both.
#[derive(Debug, Clone)]
pub enum IngestedDocument {
    /// One image per PDF page, in page order.
    Pages(Vec<ImageData>),
    /// Flattened document text.
    Text(String),
}

impl IngestedDocument {
    /// Short description for log lines.
    pub fn describe(&self) -> String {
        match self {
            IngestedDocument::Pages(p) => format!("{} page image(s)", p.len()),
            IngestedDocument::Text(t) => format!("{} characters of text", t.chars().count()),
        }
    }
}

/// Check the file exists, is readable and, for PDFs, starts with `%PDF`.
pub fn resolve_local(path: &Path, kind: DocumentKind) -> Result<PathBuf, BookingError> {
    if !path.exists() {
        return Err(BookingError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            if kind == DocumentKind::Pdf {
                use std::io::Read;
                let mut head = Vec::with_capacity(4);
                // Fewer than four bytes cannot be a PDF either.
                let read = f.by_ref().take(4).read_to_end(&mut head);
                if read.is_err() || head != b"%PDF" {
                    let mut magic = [0u8; 4];
                    magic[..head.len()].copy_from_slice(&head);
                    return Err(BookingError::NotAPdf {
                        path: path.to_path_buf(),
                        magic,
                    });
                }
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(BookingError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(BookingError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    debug!("Resolved local {:?}: {}", kind, path.display());
    Ok(path.to_path_buf())
}

/// Reject text shorter than `min_chars` characters.
pub fn ensure_min_length(
    text: &str,
    min_chars: usize,
    source_kind: &'static str,
) -> Result<(), BookingError> {
    let chars = text.chars().count();
    if chars < min_chars {
        return Err(BookingError::TextTooShort {
            source_kind,
            chars,
            min: min_chars,
        });
    }
    Ok(())
}

/// Ingest text pasted into the web form. Surrounding whitespace is ignored.
pub fn ingest_text(text: &str, min_chars: usize) -> Result<IngestedDocument, BookingError> {
    let text = text.trim();
    ensure_min_length(text, min_chars, "Pasted text")?;
    info!("Pasted text: {} characters", text.chars().count());
    Ok(IngestedDocument::Text(text.to_string()))
}

/// Ingest a file, using `name` (the original file name) to pick the format.
///
/// `name` differs from `path` for web uploads, which are staged under a
/// temporary name.
pub async fn ingest_file(
    path: &Path,
    name: &str,
    config: &TransformConfig,
) -> Result<IngestedDocument, BookingError> {
    let kind = DocumentKind::from_name(name)?;
    let path = resolve_local(path, kind)?;

    match kind {
        DocumentKind::Pdf => {
            let images = render::render_pages(&path, config).await?;
            let pages = images
                .iter()
                .enumerate()
                .map(|(idx, img)| {
                    encode::encode_page(img).map_err(|e| BookingError::RasterisationFailed {
                        page: idx + 1,
                        detail: format!("Image encoding failed: {e}"),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            info!("Ingested PDF '{}': {} pages", name, pages.len());
            Ok(IngestedDocument::Pages(pages))
        }
        DocumentKind::Docx => {
            let text = docx::extract_text(&path).await?;
            info!("Extracted {} characters from Word document", text.chars().count());
            debug!("Preview: {}", preview(&text));
            ensure_min_length(&text, config.min_text_chars, kind.label())?;
            Ok(IngestedDocument::Text(text))
        }
        DocumentKind::Text => {
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| BookingError::Internal(format!("Failed to read '{}': {e}", path.display())))?;
            let text = String::from_utf8_lossy(&bytes).into_owned();
            info!("Text file: {} characters", text.chars().count());
            ensure_min_length(&text, config.min_text_chars, kind.label())?;
            Ok(IngestedDocument::Text(text))
        }
    }
}

/// First 200 characters, for debug logging.
fn preview(text: &str) -> String {
    text.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn kind_from_extension() {
        assert_eq!(DocumentKind::from_name("scan.PDF").unwrap(), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_name("booking.docx").unwrap(), DocumentKind::Docx);
        assert_eq!(DocumentKind::from_name("paste.txt").unwrap(), DocumentKind::Text);
    }

    #[test]
    fn legacy_doc_gets_a_hint() {
        let err = DocumentKind::from_name("old.doc").unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains(".docx"), "got: {err}");
    }

    #[test]
    fn no_extension_is_rejected() {
        assert!(matches!(
            DocumentKind::from_name("README"),
            Err(BookingError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn min_length_boundary() {
        for len in [0usize, 10, 49] {
            let text = "x".repeat(len);
            let err = ingest_text(&text, 50).unwrap_err();
            assert!(
                matches!(err, BookingError::TextTooShort { chars, .. } if chars == len),
                "length {len} should fail"
            );
        }
        for len in [50usize, 51, 500] {
            let text = "x".repeat(len);
            assert!(ingest_text(&text, 50).is_ok(), "length {len} should pass");
        }
    }

    #[test]
    fn min_length_counts_characters_not_bytes() {
        // 50 two-byte characters.
        let text = "é".repeat(50);
        assert!(ensure_min_length(&text, 50, "Text file").is_ok());
    }

    #[test]
    fn missing_file() {
        let err = resolve_local(Path::new("/definitely/not/here.pdf"), DocumentKind::Pdf).unwrap_err();
        assert!(matches!(err, BookingError::FileNotFound { .. }));
    }

    #[test]
    fn pdf_magic_checked() {
        let mut f = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        f.write_all(b"PK\x03\x04 not a pdf").unwrap();
        let err = resolve_local(f.path(), DocumentKind::Pdf).unwrap_err();
        assert!(matches!(err, BookingError::NotAPdf { magic, .. } if &magic == b"PK\x03\x04"));
    }

    #[test]
    fn truncated_pdf_is_not_a_pdf() {
        let mut f = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        f.write_all(b"%P").unwrap();
        let err = resolve_local(f.path(), DocumentKind::Pdf).unwrap_err();
        assert!(matches!(err, BookingError::NotAPdf { magic, .. } if &magic == b"%P\0\0"));
        assert!(err.is_validation());

        let empty = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        let err = resolve_local(empty.path(), DocumentKind::Pdf).unwrap_err();
        assert!(matches!(err, BookingError::NotAPdf { .. }));
    }

    #[tokio::test]
    async fn short_text_file_rejected() {
        let mut f = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        f.write_all(b"Booking 12").unwrap();
        let config = TransformConfig::default();
        let err = ingest_file(f.path(), "notes.txt", &config).await.unwrap_err();
        assert!(matches!(err, BookingError::TextTooShort { chars: 10, .. }));
    }

    #[tokio::test]
    async fn text_file_passes_through() {
        let body = "Reservation R123 — guest Ada Lovelace, arriving 25/11/2025, departing 28/11/2025.";
        let mut f = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        let doc = ingest_file(f.path(), "booking.txt", &TransformConfig::default())
            .await
            .unwrap();
        match doc {
            IngestedDocument::Text(t) => assert_eq!(t, body),
            other => panic!("expected text, got {other:?}"),
        }
    }
}
