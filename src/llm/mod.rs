//! LLM integration for newsforge.
//!
//! A single OpenAI-compatible chat-completions client covers every backend;
//! [`Backend`] presets pick the endpoint, model and credential rules.
//!
//! ```ignore
//! use newsforge::llm::{Backend, ChatClient, GenerationRequest, LlmProvider, Message};
//! use std::time::Duration;
//!
//! let client = ChatClient::for_backend(Backend::Deepseek, Some(key), Duration::from_secs(30))?;
//! let request = GenerationRequest::new("", vec![Message::user("Hola")]).with_max_tokens(50);
//! let response = client.generate(request).await?;
//! ```

pub mod backend;
pub mod client;

pub use backend::Backend;
pub use client::{
    ChatClient, Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, Usage,
};
