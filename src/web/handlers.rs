use std::io::Write;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::booking::BookingRecord;
use crate::error::BookingError;
use crate::pipeline::input::DocumentKind;
use crate::web::error::WebError;
use crate::web::state::AppState;

static UPLOAD_HTML: &str = include_str!("pages/upload.html");
static REVIEW_HTML: &str = include_str!("pages/review.html");
static SUCCESS_HTML: &str = include_str!("pages/success.html");

// ── Sessions ──

struct Session {
    id: String,
    is_new: bool,
}

fn session(state: &AppState, headers: &HeaderMap) -> Session {
    match state.sessions.session_id(headers) {
        Some(id) => Session { id, is_new: false },
        None => Session {
            id: uuid::Uuid::new_v4().to_string(),
            is_new: true,
        },
    }
}

fn with_cookie(state: &AppState, session: &Session, response: impl IntoResponse) -> Response {
    let mut response = response.into_response();
    if session.is_new {
        if let Some(cookie) = state.sessions.set_cookie(&session.id) {
            response.headers_mut().insert(header::SET_COOKIE, cookie);
        }
    }
    response
}

// ── Pages ──

pub async fn health() -> &'static str {
    "ok"
}

pub async fn upload_page() -> Html<&'static str> {
    Html(UPLOAD_HTML)
}

// GET /review
pub async fn review(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let booking = state
        .sessions
        .session_id(&headers)
        .and_then(|id| state.sessions.get(&id))
        .and_then(|s| s.booking_data);

    let Some(booking) = booking else {
        return (
            StatusCode::BAD_REQUEST,
            "No booking data found. Please upload a file first.",
        )
            .into_response();
    };

    let data = serde_json::to_string(&booking).unwrap_or_else(|_| "{}".to_string());
    Html(REVIEW_HTML.replace("__BOOKING_DATA__", &script_safe(&data))).into_response()
}

// GET /success
pub async fn success(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let data = state
        .sessions
        .session_id(&headers)
        .and_then(|id| state.sessions.get(&id));

    let Some((html_output, booking)) = data.and_then(|s| s.html_output.map(|h| (h, s.booking_data))) else {
        return (StatusCode::BAD_REQUEST, "No confirmation generated yet.").into_response();
    };

    let html_file = file_name(&html_output);
    let confirmation_number = booking
        .as_ref()
        .and_then(|b| b.res_id.clone())
        .unwrap_or_else(|| "N/A".to_string());

    Html(
        SUCCESS_HTML
            .replace("__HTML_FILE__", &escape_html(&html_file))
            .replace("__CONFIRMATION_NUMBER__", &escape_html(&confirmation_number)),
    )
    .into_response()
}

// ── JSON endpoints ──

// POST /upload
#[derive(Serialize)]
pub struct UploadResponse {
    success: bool,
    booking_data: BookingRecord,
    redirect: &'static str,
    missing_fields: Vec<&'static str>,
}

pub async fn upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, WebError> {
    let mut file: Option<(String, Bytes)> = None;
    let mut text: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| WebError::BadRequest(format!("Invalid upload: {e}")))?
    {
        match field.name().map(str::to_string).as_deref() {
            Some("file") => {
                let name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| WebError::BadRequest(format!("Invalid upload: {e}")))?;
                if !name.is_empty() {
                    file = Some((name, bytes));
                }
            }
            Some("text_content") => {
                text = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| WebError::BadRequest(format!("Invalid upload: {e}")))?,
                );
            }
            _ => {}
        }
    }

    let booking = if let Some((name, bytes)) = file {
        tracing::info!(file = %name, bytes = bytes.len(), "upload received");
        extract_upload(&state, &name, &bytes).await?
    } else if let Some(text) = text.filter(|t| !t.trim().is_empty()) {
        tracing::info!(chars = text.trim().chars().count(), "pasted text received");
        let booking = state
            .transformer
            .extract_from_text(&text)
            .await
            .map_err(extraction_error)?;
        if booking.guest_name.as_deref().map_or(true, |g| g.trim().is_empty()) {
            return Err(WebError::BadRequest(
                "Could not extract booking data. Please check the text format and try again.".into(),
            ));
        }
        booking
    } else {
        return Err(WebError::BadRequest("Please upload a file or paste text".into()));
    };

    let missing_fields = booking.missing_required_fields();
    if !missing_fields.is_empty() {
        tracing::warn!(missing = %missing_fields.join(", "), "booking has missing fields");
    }
    tracing::info!(guest = %booking.guest_label(), "extraction successful");

    let session = session(&state, &headers);
    state.sessions.update(&session.id, |s| {
        s.booking_data = Some(booking.clone());
        s.html_output = None;
        s.pdf_output = None;
    });

    Ok(with_cookie(
        &state,
        &session,
        Json(UploadResponse {
            success: true,
            booking_data: booking,
            redirect: "/review",
            missing_fields,
        }),
    ))
}

/// Stage an uploaded file in the upload directory and extract from it.
/// The staged copy is removed when this returns.
async fn extract_upload(state: &AppState, name: &str, bytes: &[u8]) -> Result<BookingRecord, WebError> {
    let kind = DocumentKind::from_name(name)?;
    let suffix = match kind {
        DocumentKind::Pdf => ".pdf",
        DocumentKind::Docx => ".docx",
        DocumentKind::Text => ".txt",
    };

    let upload_dir = &state.config.upload_dir;
    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| WebError::Internal(format!("Cannot create upload directory: {e}")))?;

    let mut staged = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(suffix)
        .tempfile_in(upload_dir)
        .map_err(|e| WebError::Internal(format!("Cannot stage upload: {e}")))?;
    staged
        .write_all(bytes)
        .map_err(|e| WebError::Internal(format!("Cannot stage upload: {e}")))?;

    state
        .transformer
        .extract_from_file(staged.path(), name)
        .await
        .map_err(extraction_error)
}

fn extraction_error(e: BookingError) -> WebError {
    if e.is_validation() {
        WebError::Booking(e)
    } else {
        WebError::Internal(format!("Extraction failed: {e}"))
    }
}

// POST /update
pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, WebError> {
    let Json(body) =
        body.map_err(|e| WebError::BadRequest(format!("Invalid booking data: {}", e.body_text())))?;
    let booking: BookingRecord = serde_json::from_value(body)
        .map_err(|e| WebError::BadRequest(format!("Invalid booking data: {e}")))?;

    let session = session(&state, &headers);
    tracing::info!(guest = %booking.guest_label(), "booking data updated");
    state.sessions.update(&session.id, |s| s.booking_data = Some(booking));

    Ok(with_cookie(&state, &session, Json(serde_json::json!({ "success": true }))))
}

// POST /generate
#[derive(Serialize)]
pub struct GenerateResponse {
    success: bool,
    html_file: String,
    pdf_file: Option<String>,
    confirmation_number: String,
    brand_warnings: Vec<String>,
}

pub async fn generate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<GenerateResponse>, WebError> {
    let session_id = state.sessions.session_id(&headers);
    let booking = session_id
        .as_deref()
        .and_then(|id| state.sessions.get(id))
        .and_then(|s| s.booking_data);

    let (Some(session_id), Some(booking)) = (session_id, booking) else {
        return Err(WebError::BadRequest("No booking data found".into()));
    };

    let confirmation = state.transformer.generate_confirmation(&booking).await?;

    state.sessions.update(&session_id, |s| {
        s.html_output = Some(confirmation.html_path.clone());
        s.pdf_output = confirmation.pdf_path.clone();
    });

    Ok(Json(GenerateResponse {
        success: true,
        html_file: file_name(&confirmation.html_path),
        pdf_file: confirmation.pdf_path.as_deref().map(file_name),
        confirmation_number: booking.res_id.clone().unwrap_or_else(|| "N/A".to_string()),
        brand_warnings: confirmation.brand_warnings,
    }))
}

// GET /download/:file_type
pub async fn download(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(file_type): Path<String>,
) -> Result<Response, WebError> {
    let data = state
        .sessions
        .session_id(&headers)
        .and_then(|id| state.sessions.get(&id))
        .unwrap_or_default();

    let (path, content_type) = match file_type.as_str() {
        "html" => (data.html_output, "text/html; charset=utf-8"),
        "pdf" => (data.pdf_output, "application/pdf"),
        _ => return Err(WebError::BadRequest("Invalid file type".into())),
    };

    let not_found = || WebError::NotFound("File not found".into());
    let path = path.ok_or_else(not_found)?;
    let contents = tokio::fs::read(&path).await.map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "download failed");
        not_found()
    })?;

    let filename = file_name(&path);
    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        contents,
    )
        .into_response())
}

// ── Helpers ──

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// JSON embedded in a `<script>` element must not be able to close it.
fn script_safe(json: &str) -> String {
    json.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_safe_neutralises_closing_tag() {
        let s = script_safe(r#"{"guest_name":"</script><b>"}"#);
        assert!(!s.contains("</script>"));
        let back: Value = serde_json::from_str(&s).unwrap();
        assert_eq!(back["guest_name"], "</script><b>");
    }

    #[test]
    fn escape_html_basics() {
        assert_eq!(escape_html("R<1>&\"'"), "R&lt;1&gt;&amp;&quot;&#39;");
    }
}
