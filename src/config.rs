//! Configuration types for the booking pipeline and the web form.
//!
//! Pipeline behaviour is controlled through [`TransformConfig`], built via its
//! [`TransformConfigBuilder`]. The web server additionally reads a
//! [`WebConfig`] from the environment; it owns the session secret so the
//! secret's lifetime is tied to process start-up and injected into the
//! request-handling state rather than living in a global.

use crate::error::BookingError;
use std::path::PathBuf;

/// Default provider passed to `edgequake_llm::ProviderFactory`.
pub const DEFAULT_PROVIDER: &str = "anthropic";

/// Default model for both extraction and generation.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

/// Configuration for one extract → generate → save run.
///
/// Built via [`TransformConfig::builder()`] or [`TransformConfig::default()`].
///
/// # Example
/// ```rust
/// use booking_confirm::TransformConfig;
///
/// let config = TransformConfig::builder()
///     .dpi(150)
///     .output_dir("confirmations")
///     .max_retries(2)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 150);
/// ```
#[derive(Debug, Clone)]
pub struct TransformConfig {
    /// Rendering DPI for PDF pages. Range: 72–400. Default: 200.
    ///
    /// Booking exports use small print for rates and references; 200 DPI keeps
    /// those legible to the model.
    pub dpi: u32,

    /// Cap on the longest rendered edge in pixels. Default: 2400.
    pub max_rendered_pixels: u32,

    /// LLM provider name (e.g. "anthropic", "openai"). If None, uses
    /// `BOOKING_LLM_PROVIDER` or [`DEFAULT_PROVIDER`].
    pub provider_name: Option<String>,

    /// LLM model identifier. If None, uses `BOOKING_MODEL` or [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// Sampling temperature. Default: 0.1.
    pub temperature: f32,

    /// Max output tokens for the extraction call. Default: 2048.
    pub extraction_max_tokens: usize,

    /// Max output tokens for the generation call. Default: 8192.
    ///
    /// A single-page confirmation with inline CSS runs to roughly 4–6k tokens.
    pub generation_max_tokens: usize,

    /// Retry attempts on a failed LLM call. Default: 0 (fail fast).
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Minimum number of characters a text document must contain. Default: 50.
    pub min_text_chars: usize,

    /// Directory confirmations are written to. Default: `output`.
    pub output_dir: PathBuf,

    /// Directory containing libpdfium. If None, the working directory and then
    /// the system library path are tried.
    pub pdfium_lib_path: Option<PathBuf>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            max_rendered_pixels: 2400,
            provider_name: None,
            model: None,
            temperature: 0.1,
            extraction_max_tokens: 2048,
            generation_max_tokens: 8192,
            max_retries: 0,
            retry_backoff_ms: 500,
            min_text_chars: 50,
            output_dir: PathBuf::from("output"),
            pdfium_lib_path: std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from),
        }
    }
}

impl TransformConfig {
    /// Create a new builder for `TransformConfig`.
    pub fn builder() -> TransformConfigBuilder {
        TransformConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`TransformConfig`].
#[derive(Debug)]
pub struct TransformConfigBuilder {
    config: TransformConfig,
}

impl TransformConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn extraction_max_tokens(mut self, n: usize) -> Self {
        self.config.extraction_max_tokens = n;
        self
    }

    pub fn generation_max_tokens(mut self, n: usize) -> Self {
        self.config.generation_max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn min_text_chars(mut self, n: usize) -> Self {
        self.config.min_text_chars = n;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn pdfium_lib_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(dir.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<TransformConfig, BookingError> {
        let c = &self.config;
        if c.extraction_max_tokens == 0 || c.generation_max_tokens == 0 {
            return Err(BookingError::InvalidConfig(
                "max tokens must be ≥ 1 for both stages".into(),
            ));
        }
        if c.output_dir.as_os_str().is_empty() {
            return Err(BookingError::InvalidConfig(
                "output directory must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Web server ──────────────────────────────────────────────────────────

/// Settings for the `confirm-web` server.
#[derive(Clone)]
pub struct WebConfig {
    pub port: u16,
    /// Where uploads are staged while they are being processed.
    pub upload_dir: PathBuf,
    /// Request body cap in bytes. Default: 16 MiB.
    pub max_upload_bytes: usize,
    /// Key used to sign session cookies.
    pub session_secret: String,
}

impl std::fmt::Debug for WebConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebConfig")
            .field("port", &self.port)
            .field("upload_dir", &self.upload_dir)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("session_secret", &"<redacted>")
            .finish()
    }
}

impl WebConfig {
    /// Read settings from the environment, generating a per-process session
    /// secret when `SESSION_SECRET` is unset.
    ///
    /// `secret_fallback` is only called in that case.
    pub fn from_env(secret_fallback: impl FnOnce() -> String) -> Self {
        use std::env;

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("temp_uploads")),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(16 * 1024 * 1024),
            session_secret: env::var("SESSION_SECRET")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(secret_fallback),
        }
    }
}
