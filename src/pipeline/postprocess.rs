//! Post-processing: deterministic handling of the model's text replies.
//!
//! Models are told to answer with bare JSON or bare HTML, but they often wrap
//! the answer in a markdown code fence anyway. Both stages therefore unwrap
//! the reply first:
//!
//! 1. A fence tagged with the expected language (` ```json ` / ` ```html `)
//!    wins; the text up to the next fence is the payload.
//! 2. Otherwise the first untagged fence is used.
//! 3. Otherwise the whole reply is the payload.
//!
//! An unterminated fence runs to the end of the reply. The payload is
//! trimmed in every case.
//!
//! The generated confirmation is also audited against the brand guide. The
//! audit never rejects a document; it only reports what looks off.

use crate::booking::BookingRecord;
use crate::error::BookingError;
use crate::prompts::{BRAND_GREEN, FORBIDDEN_BACKGROUNDS, HEADER_FONT, HOTEL_EMAIL, HOTEL_NAME, HOTEL_PHONE};
use once_cell::sync::Lazy;
use regex::Regex;

const FENCE: &str = "```";

/// A bare language identifier on the first line of an untagged fence.
static RE_LANG_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_+-]*\r?\n").unwrap());

/// `background` / `background-color` declarations, capturing the value.
static RE_BACKGROUND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)background(?:-color)?\s*:\s*([^;}{]+)").unwrap());

/// Unwrap a fenced reply, preferring a fence tagged `tag`.
pub fn strip_fence(reply: &str, tag: &str) -> String {
    let reply = reply.trim_start_matches('\u{FEFF}');
    let tagged = format!("{FENCE}{tag}");

    if let Some(start) = reply.find(&tagged) {
        return until_fence(&reply[start + tagged.len()..]).trim().to_string();
    }

    if let Some(start) = reply.find(FENCE) {
        let inner = until_fence(&reply[start + FENCE.len()..]);
        let inner = RE_LANG_LINE.find(inner).map_or(inner, |m| &inner[m.end()..]);
        return inner.trim().to_string();
    }

    reply.trim().to_string()
}

fn until_fence(s: &str) -> &str {
    match s.find(FENCE) {
        Some(end) => &s[..end],
        None => s,
    }
}

/// Decode the extraction reply into a booking record.
///
/// Anything that is not a JSON object is fatal; the raw reply travels with
/// the error so the operator can see what the model said.
pub fn parse_booking_reply(reply: &str) -> Result<BookingRecord, BookingError> {
    let payload = strip_fence(reply, "json");
    serde_json::from_str::<BookingRecord>(&payload).map_err(|e| BookingError::MalformedReply {
        stage: "extraction",
        detail: e.to_string(),
        raw: reply.to_string(),
    })
}

/// Unwrap the generation reply into the confirmation document.
///
/// The document itself is returned verbatim apart from line endings, which
/// are normalised to `\n`. An empty reply is an error.
pub fn unwrap_html_reply(reply: &str) -> Result<String, BookingError> {
    let html = normalise_line_endings(&strip_fence(reply, "html"));
    if html.is_empty() {
        return Err(BookingError::MalformedReply {
            stage: "generation",
            detail: "reply contained no document".into(),
            raw: reply.to_string(),
        });
    }
    Ok(html)
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

/// Check a generated confirmation against the brand guide.
///
/// Returns one human-readable warning per problem found; an empty list means
/// the document passed.
pub fn audit_confirmation(html: &str, record: &BookingRecord) -> Vec<String> {
    let lower = html.to_ascii_lowercase();
    let mut warnings = Vec::new();

    if !lower.contains("<!doctype") {
        warnings.push("Document has no <!DOCTYPE> declaration".to_string());
    }
    if !lower.contains("</html>") {
        warnings.push("Document is missing a closing </html> tag (reply may be truncated)".to_string());
    }

    for (label, required) in [
        ("hotel name", HOTEL_NAME),
        ("hotel email", HOTEL_EMAIL),
        ("hotel phone", HOTEL_PHONE),
        ("brand green", BRAND_GREEN),
        ("header font", HEADER_FONT),
    ] {
        if !lower.contains(&required.to_ascii_lowercase()) {
            warnings.push(format!("Missing {label} '{required}'"));
        }
    }

    if let Some(res_id) = record.res_id.as_deref().filter(|r| !r.trim().is_empty()) {
        if !html.contains(res_id.trim()) {
            warnings.push(format!("Confirmation number '{}' does not appear in the document", res_id.trim()));
        }
    }

    for caps in RE_BACKGROUND.captures_iter(html) {
        let value = caps[1].trim().to_ascii_lowercase();
        if let Some(colour) = FORBIDDEN_BACKGROUNDS.iter().find(|c| value.contains(*c)) {
            warnings.push(format!("Forbidden background colour {colour}"));
        }
    }
    warnings.dedup();

    warnings
}
