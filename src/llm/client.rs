//! OpenAI-compatible chat-completions client.
//!
//! One client serves every backend preset; the preset only decides the
//! endpoint, model and whether a credential is mandatory. The client makes
//! exactly one HTTP request per call. Retrying is the caller's business.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::backend::Backend;
use crate::error::LlmError;

/// A message in a conversation with an LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (e.g., "user", "assistant").
    pub role: String,
    /// Content of the message.
    pub content: String,
}

impl Message {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Request for text generation from an LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model identifier. Empty means the client's configured model.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<Message>,
    /// Sampling temperature (0.0 - 2.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Maximum number of tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Nucleus sampling parameter (0.0 - 1.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
}

impl GenerationRequest {
    /// Create a new generation request with default parameters.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
            top_p: None,
        }
    }

    /// Set the temperature for this request.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the max tokens for this request.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the top_p for this request.
    pub fn with_top_p(mut self, top_p: Option<f64>) -> Self {
        self.top_p = top_p;
        self
    }
}

/// Response from an LLM generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Unique identifier for this response.
    pub id: String,
    /// Model that generated this response.
    pub model: String,
    /// Generated choices/completions.
    pub choices: Vec<Choice>,
    /// Token usage statistics. Local servers often leave it out.
    pub usage: Usage,
}

impl GenerationResponse {
    /// Get the content of the first choice, if available.
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

/// A single generated choice from the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    /// Index of this choice in the response.
    pub index: u32,
    /// Generated message.
    pub message: Message,
    /// Reason the generation stopped (e.g., "stop", "length").
    pub finish_reason: String,
}

/// Token usage statistics for a generation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Trait for LLM providers that can generate text.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a response for the given request.
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError>;
}

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct ChatClient {
    /// Base URL for the API.
    api_base: String,
    /// Optional API key for bearer authentication.
    api_key: Option<String>,
    /// Whether calls without a key must be refused locally.
    require_key: bool,
    /// Model used when a request leaves it empty.
    model: String,
    /// Shared HTTP client; reused across calls for connection pooling.
    http_client: Client,
}

impl ChatClient {
    /// Create a client with explicit configuration.
    ///
    /// # Arguments
    ///
    /// * `api_base` - Base URL (e.g., "http://localhost:8000/v1")
    /// * `api_key` - Optional API key for authentication
    /// * `model` - Model to use when a request does not name one
    /// * `timeout` - Per-request timeout
    pub fn new(
        api_base: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            require_key: false,
            model: model.into(),
            http_client,
        })
    }

    /// Create a client pre-configured for a backend preset.
    pub fn for_backend(
        backend: Backend,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let mut client = Self::new(backend.api_base(), api_key, backend.default_model(), timeout)?;
        client.require_key = backend.requires_key();
        Ok(client)
    }

    /// Override the API base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the default model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Get the API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Get the default model.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Check if an API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Get the API key for logging, masked.
    pub fn api_key_masked(&self) -> String {
        match &self.api_key {
            None => "<none>".to_string(),
            Some(key) if key.chars().count() <= 8 => "*".repeat(key.chars().count()),
            Some(key) => {
                let chars: Vec<char> = key.chars().collect();
                let head: String = chars[..4].iter().collect();
                let tail: String = chars[chars.len() - 4..].iter().collect();
                format!("{}...{}", head, tail)
            }
        }
    }
}

/// Internal request structure for the OpenAI-compatible API.
#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
}

/// Internal response structure from the OpenAI-compatible API.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    #[serde(default)]
    index: u32,
    message: ApiMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

/// Error response from the API.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[async_trait]
impl LlmProvider for ChatClient {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        if self.require_key && self.api_key.is_none() {
            return Err(LlmError::MissingApiKey);
        }

        let model = if request.model.is_empty() {
            self.model.clone()
        } else {
            request.model
        };

        let api_request = ApiRequest {
            model,
            messages: request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
        };

        let url = format!("{}/chat/completions", self.api_base);

        let mut http_request = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json");

        if let Some(ref api_key) = self.api_key {
            http_request = http_request.header("Authorization", format!("Bearer {}", api_key));
        }

        let http_response = http_request.json(&api_request).send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(e.to_string())
            } else {
                LlmError::RequestFailed(e.to_string())
            }
        })?;

        let status = http_response.status();

        if !status.is_success() {
            let status_code = status.as_u16();
            let error_text = http_response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());

            let message = serde_json::from_str::<ApiErrorResponse>(&error_text)
                .map(|parsed| parsed.error.message)
                .unwrap_or(error_text);

            if status_code == 429 {
                return Err(LlmError::RateLimited(message));
            }

            return Err(LlmError::ApiError {
                code: status_code,
                message,
            });
        }

        let body = http_response.text().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(e.to_string())
            } else {
                LlmError::RequestFailed(e.to_string())
            }
        })?;

        let api_response: ApiResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::ParseError(format!("Failed to parse API response: {}", e)))?;

        let choices = api_response
            .choices
            .into_iter()
            .map(|choice| {
                let content = choice.message.content.unwrap_or_default();
                Choice {
                    index: choice.index,
                    message: match choice.message.role {
                        Some(role) => Message { role, content },
                        None => Message::assistant(content),
                    },
                    finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_string()),
                }
            })
            .collect();

        let usage = api_response
            .usage
            .map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        Ok(GenerationResponse {
            id: api_response.id,
            model: api_response.model,
            choices,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeout() -> Duration {
        Duration::from_secs(5)
    }

    #[test]
    fn test_message_constructors() {
        assert_eq!(Message::user("u").role, "user");
        assert_eq!(Message::assistant("a").content, "a");
    }

    #[test]
    fn test_generation_request_builder() {
        let request = GenerationRequest::new("deepseek-chat", vec![Message::user("test")])
            .with_temperature(0.7)
            .with_max_tokens(500)
            .with_top_p(None);

        assert_eq!(request.model, "deepseek-chat");
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_tokens, Some(500));
        assert_eq!(request.top_p, None);
    }

    #[test]
    fn test_first_content() {
        let response = GenerationResponse {
            id: "id".to_string(),
            model: "m".to_string(),
            choices: vec![Choice {
                index: 0,
                message: Message::assistant("Hello!"),
                finish_reason: "stop".to_string(),
            }],
            usage: Usage::default(),
        };
        assert_eq!(response.first_content(), Some("Hello!"));

        let empty = GenerationResponse {
            choices: vec![],
            ..response
        };
        assert_eq!(empty.first_content(), None);
    }

    #[test]
    fn test_for_backend_uses_preset() {
        let client = ChatClient::for_backend(Backend::Deepseek, Some("sk-test".to_string()), timeout())
            .expect("client");
        assert_eq!(client.api_base(), "https://api.deepseek.com/v1");
        assert_eq!(client.model(), "deepseek-chat");
        assert!(client.has_api_key());

        let client = client
            .with_api_base("http://127.0.0.1:9000/v1/")
            .with_model("other");
        assert_eq!(client.api_base(), "http://127.0.0.1:9000/v1");
        assert_eq!(client.model(), "other");
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let client = ChatClient::new("http://localhost:1", Some("  ".to_string()), "m", timeout())
            .expect("client");
        assert!(!client.has_api_key());
        assert_eq!(client.api_key_masked(), "<none>");
    }

    #[test]
    fn test_api_key_masked() {
        let short = ChatClient::new("http://x", Some("abc".to_string()), "m", timeout()).unwrap();
        assert_eq!(short.api_key_masked(), "***");

        let long = ChatClient::new("http://x", Some("sk-1234567890abcdef".to_string()), "m", timeout())
            .unwrap();
        assert_eq!(long.api_key_masked(), "sk-1...cdef");
    }

    #[tokio::test]
    async fn test_missing_key_refused_before_any_request() {
        let client = ChatClient::for_backend(Backend::Deepseek, None, timeout()).unwrap();
        let result = client
            .generate(GenerationRequest::new("", vec![Message::user("hi")]))
            .await;
        assert!(matches!(result, Err(LlmError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_connection_error_is_request_failed() {
        let client = ChatClient::new("http://localhost:65535", None, "m", timeout()).unwrap();
        let result = client
            .generate(GenerationRequest::new("", vec![Message::user("test")]))
            .await;
        assert!(matches!(result, Err(LlmError::RequestFailed(_))));
    }

    #[test]
    fn test_api_response_tolerates_missing_optional_fields() {
        let body = r#"{"choices": [{"message": {"content": "text"}}]}"#;
        let parsed: ApiResponse = serde_json::from_str(body).expect("lenient parse");
        assert_eq!(parsed.choices.len(), 1);
        assert!(parsed.usage.is_none());
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("text"));
    }

    #[test]
    fn test_api_request_serialization_skips_none() {
        let request = ApiRequest {
            model: "deepseek-chat".to_string(),
            messages: vec![Message::user("test")],
            temperature: Some(0.7),
            max_tokens: Some(500),
            top_p: None,
        };
        let json = serde_json::to_string(&request).expect("serialize");
        assert!(json.contains("\"model\":\"deepseek-chat\""));
        assert!(json.contains("\"max_tokens\":500"));
        assert!(!json.contains("top_p"));
    }
}
