//! Output: persist the confirmation as `<res_id>_confirmation.html`.
//!
//! The reservation id comes from the model (or the review form), so it is
//! reduced to a safe file name first. An existing confirmation for the same
//! reservation is overwritten in place.

use crate::error::BookingError;
use std::path::{Path, PathBuf};
use tracing::info;

/// Suffix appended to the reservation id.
pub const CONFIRMATION_SUFFIX: &str = "_confirmation.html";

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
///
/// An id that is empty after trimming (or made only of dots) becomes
/// `unknown`.
pub fn sanitise_res_id(res_id: &str) -> String {
    let cleaned: String = res_id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.chars().all(|c| c == '.') {
        "unknown".to_string()
    } else {
        cleaned
    }
}

/// File name of the confirmation for `res_id`.
pub fn confirmation_file_name(res_id: &str) -> String {
    format!("{}{CONFIRMATION_SUFFIX}", sanitise_res_id(res_id))
}

/// Write `html` to `<output_dir>/<res_id>_confirmation.html`, creating the
/// directory if needed. Returns the path written.
pub async fn write_confirmation(
    output_dir: &Path,
    res_id: &str,
    html: &str,
) -> Result<PathBuf, BookingError> {
    let path = output_dir.join(confirmation_file_name(res_id));
    let write_err = |source: std::io::Error| BookingError::OutputWriteFailed {
        path: path.clone(),
        source,
    };

    tokio::fs::create_dir_all(output_dir).await.map_err(write_err)?;

    tokio::fs::write(&path, html).await.map_err(write_err)?;

    info!("Confirmation saved: {} ({} bytes)", path.display(), html.len());
    Ok(path)
}
