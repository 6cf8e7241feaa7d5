use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use tower::ServiceExt;

use booking_confirm::web::{self, AppState};
use booking_confirm::{
    BookingError, BookingModel, ModelReply, ModelRequest, TransformConfig, Transformer, WebConfig,
};

// ── Mock Model ──

const DIRECT_BOOKING: &str = r#"```json
{"booking_type": "direct", "res_id": "R123", "guest_name": "Ada Lovelace",
 "email": "ada@example.com", "check_in": "25/11/2025", "check_out": "28/11/2025",
 "rooms": [{"room_name": "Tea Suite", "adults": 2, "children": 0, "rate_per_night": 100, "total_rate": 300}],
 "total_amount": 300, "amount_paid": 150}
```"#;

const AGENT_BOOKING: &str = r#"{"booking_type": "agent", "res_id": "T-77", "guest_name": "Grace Hopper",
 "check_in": "01/12/2025", "check_out": "03/12/2025",
 "agent_info": {"agent_name": "Lanka Tours", "voucher_number": "V-9"}}"#;

const NO_EMAIL_DIRECT: &str = r#"{"booking_type": "direct", "res_id": "R9", "guest_name": "Alan Turing",
 "check_in": "01/12/2025", "check_out": "03/12/2025"}"#;

const NO_GUEST: &str = r#"{"res_id": "R1"}"#;

const CONFIRMATION_HTML: &str = "<!DOCTYPE html>\n<html><body><h1>The Planters House</h1></body></html>";

/// Replies to extraction with a fixed record and to generation with a
/// fixed document; records every instruction it was sent.
struct MockModel {
    extraction: String,
    instructions: Mutex<Vec<String>>,
}

#[async_trait]
impl BookingModel for MockModel {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelReply, BookingError> {
        self.instructions
            .lock()
            .unwrap()
            .push(request.instruction.clone());
        let text = match request.stage {
            "extraction" => self.extraction.clone(),
            _ => format!("```html\n{CONFIRMATION_HTML}\n```"),
        };
        Ok(ModelReply {
            text,
            ..Default::default()
        })
    }
}

// ── Helpers ──

struct TestApp {
    app: Router,
    model: Arc<MockModel>,
    dir: tempfile::TempDir,
}

impl TestApp {
    fn new(extraction: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(MockModel {
            extraction: extraction.to_string(),
            instructions: Mutex::new(vec![]),
        });
        let config = TransformConfig::builder()
            .output_dir(dir.path().join("output"))
            .build()
            .unwrap();
        let web_config = WebConfig {
            port: 0,
            upload_dir: dir.path().join("uploads"),
            max_upload_bytes: 16 * 1024 * 1024,
            session_secret: "test-secret".to_string(),
        };
        let transformer = Transformer::with_model(model.clone(), config);
        let state = Arc::new(AppState::new(transformer, web_config));
        Self {
            app: web::router(state),
            model,
            dir,
        }
    }

    async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(req).await.unwrap()
    }

    fn calls(&self) -> usize {
        self.model.instructions.lock().unwrap().len()
    }
}

const BOUNDARY: &str = "----booking-test-boundary";

/// Build a multipart/form-data POST to /upload.
fn upload_request(file: Option<(&str, &[u8])>, text: Option<&str>) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    if let Some((name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(text) = text {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"text_content\"\r\n\r\n{text}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, cookie: Option<&str>, json: &serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    builder.body(Body::from(json.to_string())).unwrap()
}

fn post_empty(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    builder.body(Body::empty()).unwrap()
}

/// `name=value` part of the response's Set-Cookie header.
fn session_cookie(res: &Response<Body>) -> String {
    let set_cookie = res
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie set")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

async fn body_string(res: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(res: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(res).await).unwrap()
}

const PASTED: &str =
    "Reservation R123 for Ada Lovelace (ada@example.com), Tea Suite, 25/11/2025 to 28/11/2025.";

/// Upload pasted text and return the session cookie.
async fn upload_text(t: &TestApp) -> String {
    let res = t.send(upload_request(None, Some(PASTED))).await;
    assert_eq!(res.status(), StatusCode::OK);
    session_cookie(&res)
}

// ── Pages ──

#[tokio::test]
async fn test_health() {
    let t = TestApp::new(DIRECT_BOOKING);
    let res = t.send(get("/health", None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_string(res).await, "ok");
}

#[tokio::test]
async fn test_upload_page() {
    let t = TestApp::new(DIRECT_BOOKING);
    let res = t.send(get("/", None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let html = body_string(res).await;
    assert!(html.contains("The Planters House"));
    assert!(html.contains("text_content"));
}

// ── Upload ──

#[tokio::test]
async fn test_upload_pasted_text() {
    let t = TestApp::new(DIRECT_BOOKING);
    let res = t.send(upload_request(None, Some(PASTED))).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key(header::SET_COOKIE));
    let json = body_json(res).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["redirect"], "/review");
    assert_eq!(json["booking_data"]["res_id"], "R123");
    assert_eq!(json["booking_data"]["booking_type"], "direct");
    assert_eq!(json["missing_fields"], serde_json::json!([]));

    let instructions = t.model.instructions.lock().unwrap();
    assert_eq!(instructions.len(), 1);
    assert!(instructions[0].contains(PASTED));
}

#[tokio::test]
async fn test_upload_short_text_rejected() {
    let t = TestApp::new(DIRECT_BOOKING);
    let res = t.send(upload_request(None, Some("Booking R1, 2 nights"))).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert!(json["error"].as_str().unwrap().contains("appears empty"));
    assert_eq!(t.calls(), 0);
}

#[tokio::test]
async fn test_upload_nothing() {
    let t = TestApp::new(DIRECT_BOOKING);
    let res = t.send(upload_request(None, Some("   "))).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(json["error"], "Please upload a file or paste text");
}

#[tokio::test]
async fn test_upload_unsupported_file_type() {
    let t = TestApp::new(DIRECT_BOOKING);
    let res = t
        .send(upload_request(Some(("booking.doc", b"\xD0\xCF\x11\xE0legacy")), None))
        .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert!(json["error"].as_str().unwrap().contains("Unsupported file type"));
    assert_eq!(t.calls(), 0);
}

#[tokio::test]
async fn test_upload_text_file_is_staged_and_removed() {
    let t = TestApp::new(DIRECT_BOOKING);
    let res = t
        .send(upload_request(Some(("Booking.TXT", PASTED.as_bytes())), None))
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["booking_data"]["guest_name"], "Ada Lovelace");

    let staged = std::fs::read_dir(t.dir.path().join("uploads")).unwrap().count();
    assert_eq!(staged, 0, "staged upload should be removed");
}

#[tokio::test]
async fn test_upload_short_text_file_rejected() {
    let t = TestApp::new(DIRECT_BOOKING);
    let res = t
        .send(upload_request(Some(("notes.txt", b"R1 two nights")), None))
        .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert!(json["error"].as_str().unwrap().starts_with("Text file appears empty"));
}

#[tokio::test]
async fn test_agent_booking_does_not_require_email() {
    let t = TestApp::new(AGENT_BOOKING);
    let res = t.send(upload_request(None, Some(PASTED))).await;

    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["booking_data"]["booking_type"], "agent");
    assert_eq!(json["missing_fields"], serde_json::json!([]));
}

#[tokio::test]
async fn test_direct_booking_missing_email_is_a_warning() {
    let t = TestApp::new(NO_EMAIL_DIRECT);
    let res = t.send(upload_request(None, Some(PASTED))).await;

    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["missing_fields"], serde_json::json!(["email"]));
}

#[tokio::test]
async fn test_pasted_text_without_guest_rejected() {
    let t = TestApp::new(NO_GUEST);
    let res = t.send(upload_request(None, Some(PASTED))).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert!(json["error"].as_str().unwrap().contains("Could not extract booking data"));
}

#[tokio::test]
async fn test_malformed_extraction_is_server_error() {
    let t = TestApp::new("Sorry, I can't help with that.");
    let res = t.send(upload_request(None, Some(PASTED))).await;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(res).await;
    let error = json["error"].as_str().unwrap();
    assert!(error.starts_with("Extraction failed"));
    assert!(error.contains("Sorry, I can't help with that."));
}

// ── Review / Update ──

#[tokio::test]
async fn test_review_without_session() {
    let t = TestApp::new(DIRECT_BOOKING);
    let res = t.send(get("/review", None)).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_review_with_forged_cookie() {
    let t = TestApp::new(DIRECT_BOOKING);
    let cookie = upload_text(&t).await;
    let forged = format!("{cookie}x");
    let res = t.send(get("/review", Some(&forged))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_review_shows_session_booking() {
    let t = TestApp::new(DIRECT_BOOKING);
    let cookie = upload_text(&t).await;

    let res = t.send(get("/review", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let html = body_string(res).await;
    assert!(html.contains("\"res_id\":\"R123\""));
    assert!(!html.contains("__BOOKING_DATA__"));
}

#[tokio::test]
async fn test_update_replaces_session_booking() {
    let t = TestApp::new(DIRECT_BOOKING);
    let cookie = upload_text(&t).await;

    let edited = serde_json::json!({
        "booking_type": "direct",
        "res_id": "R555",
        "guest_name": "Ada King",
        "rooms": [{"room_name": "Tea Suite"}, {"room_name": "Garden Room"}],
        "special_requests": "Late arrival"
    });
    let res = t.send(post_json("/update", Some(&cookie), &edited)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await, serde_json::json!({"success": true}));

    let html = body_string(t.send(get("/review", Some(&cookie))).await).await;
    assert!(html.contains("Ada King"));
    assert!(html.contains("special_requests"));
}

#[tokio::test]
async fn test_update_malformed_json_is_json_error() {
    let t = TestApp::new(DIRECT_BOOKING);
    let cookie = upload_text(&t).await;

    let req = Request::builder()
        .method("POST")
        .uri("/update")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, &cookie)
        .body(Body::from("{\"guest_name\": "))
        .unwrap();
    let res = t.send(req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = body_json(res).await;
    assert!(body["error"].as_str().unwrap().starts_with("Invalid booking data"));

    // The session booking is untouched.
    let html = body_string(t.send(get("/review", Some(&cookie))).await).await;
    assert!(html.contains("\"res_id\":\"R123\""));
}

// ── Generate / Download / Success ──

#[tokio::test]
async fn test_generate_without_booking() {
    let t = TestApp::new(DIRECT_BOOKING);
    let res = t.send(post_empty("/generate", None)).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(json["error"], "No booking data found");
    assert_eq!(t.calls(), 0);
}

#[tokio::test]
async fn test_success_before_generate() {
    let t = TestApp::new(DIRECT_BOOKING);
    let cookie = upload_text(&t).await;
    let res = t.send(get("/success", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_full_flow() {
    let t = TestApp::new(DIRECT_BOOKING);
    let cookie = upload_text(&t).await;

    let edited = serde_json::json!({
        "booking_type": "direct",
        "res_id": "R555",
        "guest_name": "Ada Lovelace",
        "email": "ada@example.com",
        "check_in": "25/11/2025",
        "check_out": "28/11/2025",
        "rooms": [{"room_name": "Tea Suite"}, {"room_name": "Garden Room"}],
        "total_amount": 500,
        "amount_paid": 500
    });
    let res = t.send(post_json("/update", Some(&cookie), &edited)).await;
    assert_eq!(res.status(), StatusCode::OK);

    // Generate
    let res = t.send(post_empty("/generate", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["html_file"], "R555_confirmation.html");
    assert_eq!(json["pdf_file"], serde_json::Value::Null);
    assert_eq!(json["confirmation_number"], "R555");
    assert!(json["brand_warnings"].is_array());

    let written = t.dir.path().join("output").join("R555_confirmation.html");
    assert_eq!(std::fs::read_to_string(&written).unwrap(), CONFIRMATION_HTML);

    // The generation prompt saw the edited record.
    {
        let instructions = t.model.instructions.lock().unwrap();
        let generation = instructions.last().unwrap();
        assert!(generation.contains("\"res_id\": \"R555\""));
        assert!(generation.contains("MULTI-ROOM"));
        assert!(generation.contains("FULLY PAID"));
    }

    // Download
    let res = t.send(get("/download/html", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let disposition = res
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(disposition, "attachment; filename=\"R555_confirmation.html\"");
    assert_eq!(body_string(res).await, CONFIRMATION_HTML);

    let res = t.send(get("/download/pdf", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(res).await, serde_json::json!({"error": "File not found"}));

    let res = t.send(get("/download/exe", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await, serde_json::json!({"error": "Invalid file type"}));

    // Success page
    let res = t.send(get("/success", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let html = body_string(res).await;
    assert!(html.contains("R555_confirmation.html"));
    assert!(html.contains("<strong>R555</strong>"));
}

#[tokio::test]
async fn test_download_after_file_removed() {
    let t = TestApp::new(DIRECT_BOOKING);
    let cookie = upload_text(&t).await;
    let res = t.send(post_empty("/generate", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::OK);

    std::fs::remove_file(t.dir.path().join("output").join("R123_confirmation.html")).unwrap();

    let res = t.send(get("/download/html", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(res).await["error"], "File not found");
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let t = TestApp::new(DIRECT_BOOKING);
    let first = upload_text(&t).await;
    let res = t.send(post_empty("/generate", Some(&first))).await;
    assert_eq!(res.status(), StatusCode::OK);

    let second = upload_text(&t).await;
    assert_ne!(first, second);

    let res = t.send(get("/download/html", Some(&second))).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = t.send(get("/download/html", Some(&first))).await;
    assert_eq!(res.status(), StatusCode::OK);
}
