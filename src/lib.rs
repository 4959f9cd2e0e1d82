//! newsforge: human vs. machine-written news dataset builder.
//!
//! This library walks a tree of crawled article documents and asks a text
//! generation backend for a machine-written counterpart of each one. Runs are
//! resumable, tolerate flaky backends and stop cleanly on request.

pub mod augment;
pub mod cli;
pub mod documents;
pub mod error;
pub mod generation;
pub mod llm;

// Re-export commonly used error types
pub use error::{DocumentError, GenerationError, JobFailure, LlmError, RunError};
