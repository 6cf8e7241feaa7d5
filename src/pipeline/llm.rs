//! LLM interaction: the request/response seam and its provider-backed
//! implementation.
//!
//! Both stages make exactly one logical call: a single user turn (optionally
//! carrying page images) answered by a single text reply. [`BookingModel`]
//! captures that shape so the pipeline and the web form can run against a
//! canned model in tests, while [`ProviderModel`] drives a real
//! `edgequake_llm` provider.
//!
//! Failures are returned immediately unless `max_retries` is raised, in which
//! case the call is repeated with exponential backoff
//! (`retry_backoff_ms * 2^attempt`).

use crate::config::{TransformConfig, DEFAULT_MODEL, DEFAULT_PROVIDER};
use crate::error::BookingError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// One call to the model.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Which pipeline stage is asking ("extraction" / "generation"), for logs.
    pub stage: &'static str,
    /// The instruction text of the user turn.
    pub instruction: String,
    /// Images sent ahead of the instruction. Empty for text-only calls.
    pub images: Vec<ImageData>,
    pub max_tokens: usize,
}

/// The model's reply.
#[derive(Debug, Clone, Default)]
pub struct ModelReply {
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Anything that can answer a [`ModelRequest`] with text.
#[async_trait]
pub trait BookingModel: Send + Sync {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelReply, BookingError>;
}

/// [`BookingModel`] backed by an `edgequake_llm` provider.
pub struct ProviderModel {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_retries: u32,
    retry_backoff_ms: u64,
}

impl ProviderModel {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &TransformConfig) -> Self {
        Self {
            provider,
            temperature: config.temperature,
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
        }
    }

    /// Create the provider named in the config (or the environment).
    ///
    /// Resolution order: `config.provider_name` / `config.model`, then
    /// `BOOKING_LLM_PROVIDER` / `BOOKING_MODEL`, then the Anthropic default.
    /// The provider reads its API key (e.g. `ANTHROPIC_API_KEY`) itself.
    pub fn from_config(config: &TransformConfig) -> Result<Self, BookingError> {
        let provider_name = config
            .provider_name
            .clone()
            .or_else(|| non_empty_env("BOOKING_LLM_PROVIDER"))
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string());
        let model = config
            .model
            .clone()
            .or_else(|| non_empty_env("BOOKING_MODEL"))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        info!("Using LLM provider '{}' (model: {})", provider_name, model);

        let provider = ProviderFactory::create_llm_provider(&provider_name, &model).map_err(|e| {
            BookingError::ProviderNotConfigured {
                provider: provider_name.clone(),
                hint: format!(
                    "Set the provider's API key (e.g. ANTHROPIC_API_KEY) in the environment or .env file.\nError: {e}"
                ),
            }
        })?;

        Ok(Self::new(provider, config))
    }

    fn build_messages(request: &ModelRequest) -> Vec<ChatMessage> {
        if request.images.is_empty() {
            vec![ChatMessage::user(request.instruction.as_str())]
        } else {
            vec![ChatMessage::user_with_images(
                request.instruction.as_str(),
                request.images.clone(),
            )]
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[async_trait]
impl BookingModel for ProviderModel {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelReply, BookingError> {
        let start = Instant::now();
        let messages = Self::build_messages(request);
        let options = CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(request.max_tokens),
            ..Default::default()
        };

        let mut last_err: Option<String> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = self.retry_backoff_ms * 2u64.pow(attempt - 1);
                warn!(
                    "{}: retry {}/{} after {}ms",
                    request.stage, attempt, self.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            match self.provider.chat(&messages, Some(&options)).await {
                Ok(response) => {
                    debug!(
                        "{}: {} input tokens, {} output tokens, {:?}",
                        request.stage,
                        response.prompt_tokens,
                        response.completion_tokens,
                        start.elapsed()
                    );
                    return Ok(ModelReply {
                        text: response.content,
                        input_tokens: response.prompt_tokens as u64,
                        output_tokens: response.completion_tokens as u64,
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    warn!("{}: attempt {} failed — {}", request.stage, attempt + 1, err_msg);
                    last_err = Some(err_msg);
                }
            }
        }

        Err(BookingError::LlmApiError {
            message: last_err.unwrap_or_else(|| "Unknown error".to_string()),
        })
    }
}
