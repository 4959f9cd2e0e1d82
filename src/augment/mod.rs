//! Resumable augmentation pipeline.
//!
//! Walks a tree of article documents and asks one generator for a
//! machine-written counterpart of each, exactly once per (document, generator)
//! pair. Re-running over the same tree only visits what is still missing.
//!
//! # Components
//!
//! - **Config**: retry bounds, timeouts and file extension
//! - **Retry**: bounded exponential backoff that classifies failures
//! - **Cancel**: cooperative stop flag fed by SIGINT/SIGTERM
//! - **Stats**: processed / skipped / errored counters
//! - **Orchestrator**: the per-document state machine and run loop
//!
//! # Example
//!
//! ```rust,ignore
//! use newsforge::augment::{AugmentConfig, AugmentationPipeline, CancellationController};
//! use std::path::Path;
//!
//! let cancel = CancellationController::new();
//! let _listener = cancel.listen_for_signals();
//!
//! let pipeline = AugmentationPipeline::from_config(client, "deepseek", &AugmentConfig::from_env()?)
//!     .with_cancellation(cancel);
//!
//! let report = pipeline.run(Path::new("Noticias")).await?;
//! println!("{}", report.stats);
//! ```

pub mod cancel;
pub mod config;
pub mod orchestrator;
pub mod retry;
pub mod stats;

pub use cancel::{CancellationController, WaitOutcome};
pub use config::{AugmentConfig, ConfigError, MAX_RETRIES_LIMIT};
pub use orchestrator::{AugmentationPipeline, HaltReason, JobOutcome, JobState, RunReport};
pub use retry::{Generated, RetryPolicy};
pub use stats::RunStats;
