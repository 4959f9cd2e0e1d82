//! Error types for newsforge operations.
//!
//! Defines error types for the major subsystems:
//! - Chat-completions transport (`LlmError`)
//! - Generation capability failures (`GenerationError`)
//! - Document loading and persistence (`DocumentError`)
//! - Terminal job outcomes (`JobFailure`)
//! - Run-level aborts (`RunError`)

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while talking to a chat-completions endpoint.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key: pass --credential or set NEWSFORGE_API_KEY")]
    MissingApiKey,

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },
}

/// Failure kinds reported by a generation client.
///
/// Only `Timeout` and `TransportError` are worth retrying. `AuthFailure`
/// poisons every later call as well, so it aborts the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("generation timed out: {0}")]
    Timeout(String),

    #[error("authentication rejected: {0}")]
    AuthFailure(String),

    #[error("transport error: {0}")]
    TransportError(String),

    #[error("backend returned no usable text")]
    EmptyResult,

    #[error("backend rejected the request ({code}): {message}")]
    Rejected { code: u16, message: String },
}

impl GenerationError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::Timeout(_) | GenerationError::TransportError(_)
        )
    }

    /// Whether the failure invalidates every subsequent call of the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GenerationError::AuthFailure(_))
    }
}

/// Errors that can occur while loading or persisting a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("IO error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed document '{path}': {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("Document '{path}' is missing required field '{field}' (found keys: {found})")]
    MissingField {
        path: PathBuf,
        field: &'static str,
        found: String,
    },

    #[error("Failed to persist '{path}': {reason}")]
    Persist { path: PathBuf, reason: String },
}

/// Terminal failed outcome of a single (document, generator) job.
#[derive(Debug, Error)]
pub enum JobFailure {
    #[error(transparent)]
    Malformed(DocumentError),

    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: GenerationError,
    },

    #[error("backend returned no usable text")]
    EmptyResult,

    #[error(transparent)]
    Rejected(GenerationError),

    #[error("fatal configuration error: {0}")]
    Fatal(GenerationError),

    #[error("cancelled during backoff after {attempts} attempts")]
    Cancelled { attempts: u32 },

    #[error(transparent)]
    Persist(DocumentError),
}

impl JobFailure {
    /// Whether this failure halts the whole run after the current job.
    pub fn is_fatal(&self) -> bool {
        matches!(self, JobFailure::Fatal(_))
    }
}

/// Errors that abort a run as a whole.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Root directory not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Fatal configuration error: {0}")]
    Fatal(GenerationError),

    #[error("Backend connection check failed: {0}")]
    Preflight(GenerationError),

    #[error("Invalid generator name '{0}': empty or a reserved article field")]
    InvalidGenerator(String),
}
