//! Transformation entry points: document → booking record → confirmation.
//!
//! [`Transformer`] owns the model and the configuration and exposes each
//! stage separately, because the web form pauses between extraction and
//! generation for the operator to review the record. The CLI runs the whole
//! chain with [`Transformer::transform`].

use crate::booking::{BookingRecord, Layout};
use crate::config::TransformConfig;
use crate::error::BookingError;
use crate::pipeline::input::{self, IngestedDocument};
use crate::pipeline::llm::{BookingModel, ModelRequest, ProviderModel};
use crate::pipeline::{output, postprocess};
use crate::progress::{NoopProgressCallback, ProgressCallback, Stage};
use crate::prompts;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Token usage and timing for one transformation.
#[derive(Debug, Clone, Default)]
pub struct TransformStats {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub extraction_duration: Duration,
    pub generation_duration: Duration,
}

/// Result of the generate + save steps.
#[derive(Debug, Clone)]
pub struct Confirmation {
    /// The written `<res_id>_confirmation.html`.
    pub html_path: PathBuf,
    /// Always `None`: the operator prints the HTML to PDF from the browser.
    pub pdf_path: Option<PathBuf>,
    /// Brand-guide findings; informational only.
    pub brand_warnings: Vec<String>,
}

/// Result of a full file → confirmation run.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub record: BookingRecord,
    pub layout: Layout,
    /// Required fields the extraction left empty.
    pub missing_fields: Vec<&'static str>,
    pub confirmation: Confirmation,
    pub stats: TransformStats,
}

/// Runs the extract → generate → save stages against a [`BookingModel`].
pub struct Transformer {
    model: Arc<dyn BookingModel>,
    config: TransformConfig,
    progress: ProgressCallback,
}

impl Transformer {
    /// Build a transformer backed by the provider named in `config`
    /// (or `BOOKING_LLM_PROVIDER` / `BOOKING_MODEL`).
    pub fn from_config(config: TransformConfig) -> Result<Self, BookingError> {
        let model = ProviderModel::from_config(&config)?;
        Ok(Self::with_model(Arc::new(model), config))
    }

    /// Build a transformer around an existing model.
    pub fn with_model(model: Arc<dyn BookingModel>, config: TransformConfig) -> Self {
        Self {
            model,
            config,
            progress: Arc::new(NoopProgressCallback),
        }
    }

    /// Report stage events to `progress`.
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Read a file; `name` (the original file name) selects the format.
    pub async fn ingest_file(&self, path: &Path, name: &str) -> Result<IngestedDocument, BookingError> {
        self.progress.on_stage_start(Stage::Ingest);
        let result = input::ingest_file(path, name, &self.config).await;
        self.report(Stage::Ingest, result, |doc| doc.describe())
    }

    /// Accept pasted text.
    pub fn ingest_text(&self, text: &str) -> Result<IngestedDocument, BookingError> {
        self.progress.on_stage_start(Stage::Ingest);
        let result = input::ingest_text(text, self.config.min_text_chars);
        self.report(Stage::Ingest, result, |doc| doc.describe())
    }

    /// Ask the model for the booking record in `document`.
    pub async fn extract(&self, document: &IngestedDocument) -> Result<BookingRecord, BookingError> {
        self.extract_with_stats(document, &mut TransformStats::default())
            .await
    }

    async fn extract_with_stats(
        &self,
        document: &IngestedDocument,
        stats: &mut TransformStats,
    ) -> Result<BookingRecord, BookingError> {
        self.progress.on_stage_start(Stage::Extract);
        let start = Instant::now();
        info!("Extracting booking from {}", document.describe());

        let request = match document {
            IngestedDocument::Pages(pages) => ModelRequest {
                stage: "extraction",
                instruction: prompts::extraction_prompt_for_images(),
                images: pages.clone(),
                max_tokens: self.config.extraction_max_tokens,
            },
            IngestedDocument::Text(text) => ModelRequest {
                stage: "extraction",
                instruction: prompts::extraction_prompt_for_text(text),
                images: Vec::new(),
                max_tokens: self.config.extraction_max_tokens,
            },
        };

        let result = async {
            let reply = self.model.complete(&request).await?;
            stats.input_tokens += reply.input_tokens;
            stats.output_tokens += reply.output_tokens;
            debug!("Extraction reply: {}", reply.text);
            postprocess::parse_booking_reply(&reply.text)
        }
        .await;
        stats.extraction_duration = start.elapsed();

        let record = self.report(Stage::Extract, result, |r| {
            format!("{} ({})", r.guest_label(), r.layout())
        })?;

        info!(
            "Extracted booking {} for {} ({}) in {:?}",
            record.res_id_or_unknown(),
            record.guest_label(),
            record.layout(),
            stats.extraction_duration
        );
        let missing = record.missing_required_fields();
        if !missing.is_empty() {
            warn!("Missing required fields: {}", missing.join(", "));
        }

        Ok(record)
    }

    /// Ingest and extract a file in one step.
    pub async fn extract_from_file(&self, path: &Path, name: &str) -> Result<BookingRecord, BookingError> {
        let document = self.ingest_file(path, name).await?;
        self.extract(&document).await
    }

    /// Ingest and extract pasted text in one step.
    pub async fn extract_from_text(&self, text: &str) -> Result<BookingRecord, BookingError> {
        let document = self.ingest_text(text)?;
        self.extract(&document).await
    }

    /// Ask the model for the confirmation document.
    pub async fn generate_html(&self, record: &BookingRecord) -> Result<String, BookingError> {
        self.generate_html_with_stats(record, &mut TransformStats::default())
            .await
    }

    async fn generate_html_with_stats(
        &self,
        record: &BookingRecord,
        stats: &mut TransformStats,
    ) -> Result<String, BookingError> {
        self.progress.on_stage_start(Stage::Generate);
        let start = Instant::now();
        info!("Generating confirmation ({})", record.layout());

        let request = ModelRequest {
            stage: "generation",
            instruction: prompts::generation_prompt(record),
            images: Vec::new(),
            max_tokens: self.config.generation_max_tokens,
        };

        let result = async {
            let reply = self.model.complete(&request).await?;
            stats.input_tokens += reply.input_tokens;
            stats.output_tokens += reply.output_tokens;
            postprocess::unwrap_html_reply(&reply.text)
        }
        .await;
        stats.generation_duration = start.elapsed();

        let html = self.report(Stage::Generate, result, |h| format!("{} bytes", h.len()))?;
        info!(
            "Generated {} bytes of HTML in {:?}",
            html.len(),
            stats.generation_duration
        );
        Ok(html)
    }

    /// Write `html` as the confirmation for `record`.
    pub async fn save(&self, record: &BookingRecord, html: &str) -> Result<PathBuf, BookingError> {
        self.progress.on_stage_start(Stage::Save);
        let result =
            output::write_confirmation(&self.config.output_dir, record.res_id_or_unknown(), html).await;
        self.report(Stage::Save, result, |p| p.display().to_string())
    }

    /// Generate, audit and save the confirmation for `record`.
    pub async fn generate_confirmation(&self, record: &BookingRecord) -> Result<Confirmation, BookingError> {
        self.confirm_with_stats(record, &mut TransformStats::default())
            .await
    }

    async fn confirm_with_stats(
        &self,
        record: &BookingRecord,
        stats: &mut TransformStats,
    ) -> Result<Confirmation, BookingError> {
        let html = self.generate_html_with_stats(record, stats).await?;

        let brand_warnings = postprocess::audit_confirmation(&html, record);
        for w in &brand_warnings {
            warn!("Brand check: {}", w);
        }

        let html_path = self.save(record, &html).await?;
        Ok(Confirmation {
            html_path,
            pdf_path: None,
            brand_warnings,
        })
    }

    /// Run the whole chain for a file on disk.
    pub async fn transform(&self, path: &Path) -> Result<TransformOutput, BookingError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        info!("Starting transformation: {}", path.display());

        let mut stats = TransformStats::default();
        let document = self.ingest_file(path, &name).await?;
        let record = self.extract_with_stats(&document, &mut stats).await?;
        let missing_fields = record.missing_required_fields();
        let confirmation = self.confirm_with_stats(&record, &mut stats).await?;

        info!(
            "Done: {} ({} input / {} output tokens)",
            confirmation.html_path.display(),
            stats.input_tokens,
            stats.output_tokens
        );

        Ok(TransformOutput {
            layout: record.layout(),
            record,
            missing_fields,
            confirmation,
            stats,
        })
    }

    fn report<T>(
        &self,
        stage: Stage,
        result: Result<T, BookingError>,
        detail: impl FnOnce(&T) -> String,
    ) -> Result<T, BookingError> {
        match &result {
            Ok(value) => self.progress.on_stage_complete(stage, &detail(value)),
            Err(e) => self.progress.on_stage_error(stage, &e.to_string()),
        }
        result
    }
}
