//! PDF rasterisation: render every page to a `DynamicImage` via pdfium.
//!
//! pdfium is a C++ library that is not safe to drive from async code, so the
//! work runs inside `tokio::task::spawn_blocking`. Pages are rendered at the
//! configured DPI, with `max_rendered_pixels` capping either edge so an
//! oversized page cannot blow up memory or the request size.

use crate::config::TransformConfig;
use crate::error::BookingError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// PDF points per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Rasterise all pages of a PDF, in page order.
///
/// Any page failure aborts the whole document.
pub async fn render_pages(
    pdf_path: &Path,
    config: &TransformConfig,
) -> Result<Vec<DynamicImage>, BookingError> {
    let path = pdf_path.to_path_buf();
    let dpi = config.dpi;
    let max_pixels = config.max_rendered_pixels;
    let lib_path = config.pdfium_lib_path.clone();

    tokio::task::spawn_blocking(move || {
        render_pages_blocking(&path, dpi, max_pixels, lib_path.as_deref())
    })
    .await
    .map_err(|e| BookingError::Internal(format!("Render task panicked: {e}")))?
}

/// Bind pdfium: explicit directory first, then the working directory, then
/// the system library path.
fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, BookingError> {
    let candidates: Vec<PathBuf> = lib_path
        .map(Path::to_path_buf)
        .into_iter()
        .chain(std::iter::once(PathBuf::from("./")))
        .collect();

    let mut last_err = String::new();
    for dir in candidates {
        match Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir)) {
            Ok(bindings) => return Ok(Pdfium::new(bindings)),
            Err(e) => last_err = format!("{}: {e:?}", dir.display()),
        }
    }

    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| BookingError::PdfiumBindingFailed(format!("{last_err}; system: {e:?}")))
}

/// Blocking implementation of page rendering.
fn render_pages_blocking(
    pdf_path: &Path,
    dpi: u32,
    max_pixels: u32,
    lib_path: Option<&Path>,
) -> Result<Vec<DynamicImage>, BookingError> {
    let pdfium = bind_pdfium(lib_path)?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| BookingError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: format!("{e:?}"),
        })?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(dpi as f32 / POINTS_PER_INCH)
        .set_maximum_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut results = Vec::with_capacity(pages.len() as usize);

    for (idx, page) in pages.iter().enumerate() {
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| BookingError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{e:?}"),
            })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );
        results.push(image);
    }

    if results.is_empty() {
        return Err(BookingError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: "document has no pages".into(),
        });
    }

    Ok(results)
}
