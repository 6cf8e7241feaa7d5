//! The review web form: upload → review/edit → generate → download.
//!
//! State per browser lives in a server-side [`session::SessionStore`]; the
//! browser only holds a signed session id. All pipeline work goes through the
//! shared [`crate::transform::Transformer`] in [`state::AppState`].
//!
//! | Route | |
//! |---|---|
//! | `GET /` | upload page |
//! | `GET /health` | `ok` |
//! | `POST /upload` | multipart `file` or `text_content` → extracted booking |
//! | `GET /review` | edit page for the session's booking |
//! | `POST /update` | replace the session's booking with the JSON body |
//! | `POST /generate` | write the confirmation for the session's booking |
//! | `GET /download/:file_type` | `html` or `pdf` attachment |
//! | `GET /success` | download links |

pub mod error;
pub mod handlers;
pub mod session;
pub mod state;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub use error::WebError;
pub use state::AppState;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::upload_page))
        .route("/health", get(handlers::health))
        .route("/upload", post(handlers::upload))
        .route("/review", get(handlers::review))
        .route("/update", post(handlers::update))
        .route("/generate", post(handlers::generate))
        .route("/download/:file_type", get(handlers::download))
        .route("/success", get(handlers::success))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
