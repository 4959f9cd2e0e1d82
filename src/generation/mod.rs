//! Backend-agnostic generation capability.
//!
//! The pipeline only ever sees [`GenerationClient`]: give it a headline and the
//! article body, get back a machine-written paragraph or a classified failure.
//! [`ChatGenerationClient`] implements it on top of any [`LlmProvider`].

pub mod prompt;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{GenerationError, LlmError};
use crate::llm::{Backend, GenerationRequest, LlmProvider, Message};

pub use prompt::{news_paragraph_prompt, sanitize, word_count, PROBE_PROMPT};

/// Turns an article into a generated counterpart.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate a paragraph for the given headline and body.
    async fn generate(&self, title: &str, content: &str) -> Result<String, GenerationError>;

    /// Cheap reachability and credential check, run once before a batch.
    async fn probe(&self) -> Result<(), GenerationError> {
        Ok(())
    }
}

/// Maps a transport error onto the failure kinds the retry policy understands.
pub fn classify(error: LlmError) -> GenerationError {
    match error {
        LlmError::MissingApiKey => GenerationError::AuthFailure(error.to_string()),
        LlmError::Timeout(message) => GenerationError::Timeout(message),
        LlmError::RequestFailed(message) => GenerationError::TransportError(message),
        LlmError::RateLimited(message) => {
            GenerationError::TransportError(format!("rate limited: {}", message))
        }
        LlmError::ParseError(_) => GenerationError::EmptyResult,
        LlmError::ApiError { code, message } => match code {
            401 | 403 => GenerationError::AuthFailure(format!("HTTP {}: {}", code, message)),
            408 => GenerationError::Timeout(format!("HTTP 408: {}", message)),
            429 | 500..=599 => {
                GenerationError::TransportError(format!("HTTP {}: {}", code, message))
            }
            _ => GenerationError::Rejected { code, message },
        },
    }
}

/// Generation client backed by a chat-completions provider.
pub struct ChatGenerationClient {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f64,
    max_tokens: u32,
    top_p: Option<f64>,
}

impl ChatGenerationClient {
    /// Wraps a provider. An empty `model` defers to the provider's default.
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: 500,
            top_p: None,
        }
    }

    /// Wraps a provider with the sampling defaults of a backend preset.
    pub fn for_backend(provider: Arc<dyn LlmProvider>, backend: Backend) -> Self {
        Self::new(provider, "")
            .with_temperature(backend.temperature())
            .with_max_tokens(backend.max_tokens())
            .with_top_p(backend.top_p())
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_top_p(mut self, top_p: Option<f64>) -> Self {
        self.top_p = top_p;
        self
    }

    fn request(&self, prompt: String, max_tokens: u32) -> GenerationRequest {
        GenerationRequest::new(self.model.clone(), vec![Message::user(prompt)])
            .with_temperature(self.temperature)
            .with_max_tokens(max_tokens)
            .with_top_p(self.top_p)
    }
}

#[async_trait]
impl GenerationClient for ChatGenerationClient {
    async fn generate(&self, title: &str, content: &str) -> Result<String, GenerationError> {
        let target_words = word_count(content);
        let prompt = news_paragraph_prompt(title, target_words);
        debug!(target_words, prompt_len = prompt.len(), "Sending generation request");

        let response = self
            .provider
            .generate(self.request(prompt, self.max_tokens))
            .await
            .map_err(classify)?;

        response
            .first_content()
            .and_then(sanitize)
            .ok_or(GenerationError::EmptyResult)
    }

    async fn probe(&self) -> Result<(), GenerationError> {
        self.provider
            .generate(self.request(PROBE_PROMPT.to_string(), 5))
            .await
            .map(|_| ())
            .map_err(classify)
    }
}
