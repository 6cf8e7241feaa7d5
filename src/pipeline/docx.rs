//! Word (.docx) text flattening.
//!
//! A .docx file is a zip archive whose body lives in `word/document.xml`.
//! Booking exports keep most of their data in tables, so both body
//! paragraphs and table rows are collected: first every non-blank paragraph
//! outside a table, then every table row as its non-blank cell texts joined
//! with ` | `. Lines are joined with `\n`.

use crate::error::BookingError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::Read;
use std::path::{Path, PathBuf};

const DOCUMENT_PART: &str = "word/document.xml";

/// Extract the flattened text of a .docx file.
pub async fn extract_text(path: &Path) -> Result<String, BookingError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let xml = read_document_part(&path)?;
        flatten_document_xml(&xml).map_err(|detail| unreadable(&path, detail))
    })
    .await
    .map_err(|e| BookingError::Internal(format!("Word extraction task panicked: {e}")))?
}

fn unreadable(path: &Path, detail: impl ToString) -> BookingError {
    BookingError::DocxUnreadable {
        path: PathBuf::from(path),
        detail: detail.to_string(),
    }
}

fn read_document_part(path: &Path) -> Result<String, BookingError> {
    let file = std::fs::File::open(path).map_err(|e| unreadable(path, e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| unreadable(path, e))?;
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| unreadable(path, format!("{DOCUMENT_PART}: {e}")))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml).map_err(|e| unreadable(path, e))?;
    Ok(xml)
}

/// Flatten WordprocessingML body XML into paragraphs followed by table rows.
pub fn flatten_document_xml(xml: &str) -> Result<String, String> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs: Vec<String> = Vec::new();
    let mut rows: Vec<String> = Vec::new();

    let mut para = String::new();
    let mut in_text = false;
    let mut table_depth = 0usize;
    let mut cell_paras: Vec<String> = Vec::new();
    let mut row_cells: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => para.clear(),
                b"t" => in_text = true,
                b"tbl" => table_depth += 1,
                b"tr" if table_depth == 1 => row_cells.clear(),
                b"tc" if table_depth == 1 => cell_paras.clear(),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => para.push('\t'),
                b"br" | b"cr" => para.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                para.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    let text = std::mem::take(&mut para);
                    if table_depth == 0 {
                        if !text.trim().is_empty() {
                            paragraphs.push(text);
                        }
                    } else {
                        cell_paras.push(text);
                    }
                }
                b"tc" if table_depth == 1 => {
                    let cell = cell_paras.join("\n");
                    row_cells.push(cell.trim().to_string());
                    cell_paras.clear();
                }
                b"tr" if table_depth == 1 => {
                    let row = row_cells
                        .iter()
                        .filter(|c| !c.is_empty())
                        .map(String::as_str)
                        .collect::<Vec<_>>()
                        .join(" | ");
                    if !row.is_empty() {
                        rows.push(row);
                    }
                    row_cells.clear();
                }
                b"tbl" => table_depth = table_depth.saturating_sub(1),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "malformed XML at position {}: {e}",
                    reader.buffer_position()
                ))
            }
            _ => {}
        }
    }

    paragraphs.extend(rows);
    Ok(paragraphs.join("\n"))
}
