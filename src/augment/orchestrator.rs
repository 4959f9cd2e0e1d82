//! Pipeline orchestrator: the scan, check, generate, persist loop.
//!
//! Each document goes through
//! `Pending -> Validating -> (Skip | Generating) -> (Persisting | Failed) -> Terminal`.
//! Documents are handled strictly one at a time. The stop flag is checked
//! before each new document and inside backoff waits; a persist that has
//! started always runs to completion.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::cancel::CancellationController;
use super::config::AugmentConfig;
use super::retry::RetryPolicy;
use super::stats::RunStats;
use crate::documents::{already_done, is_reserved_field, DocumentStore};
use crate::error::{JobFailure, RunError};
use crate::generation::GenerationClient;

/// States a single job moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Validating,
    Skip,
    Generating,
    Persisting,
    Failed,
    Terminal,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Pending => write!(f, "pending"),
            JobState::Validating => write!(f, "validating"),
            JobState::Skip => write!(f, "skip"),
            JobState::Generating => write!(f, "generating"),
            JobState::Persisting => write!(f, "persisting"),
            JobState::Failed => write!(f, "failed"),
            JobState::Terminal => write!(f, "terminal"),
        }
    }
}

/// Terminal outcome of one (document, generator) job.
#[derive(Debug)]
pub enum JobOutcome {
    /// Generated text was persisted.
    Processed { attempts: u32 },
    /// The document already carried the augmentation.
    Skipped,
    /// The job failed; the document is left as it was.
    Failed(JobFailure),
}

/// Why a run stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum HaltReason {
    /// Every document was visited.
    Completed,
    /// A stop was requested.
    Cancelled,
    /// A fatal configuration error aborted the run.
    Fatal(String),
}

impl std::fmt::Display for HaltReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HaltReason::Completed => write!(f, "completed"),
            HaltReason::Cancelled => write!(f, "cancelled"),
            HaltReason::Fatal(reason) => write!(f, "fatal: {}", reason),
        }
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub generator: String,
    pub root: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stats: RunStats,
    pub halt: HaltReason,
}

impl RunReport {
    /// Whether the run was aborted by a fatal configuration error.
    pub fn is_fatal(&self) -> bool {
        matches!(self.halt, HaltReason::Fatal(_))
    }
}

/// Drives one generator over a document tree.
pub struct AugmentationPipeline {
    store: DocumentStore,
    client: Arc<dyn GenerationClient>,
    retry: RetryPolicy,
    generator: String,
    cancel: CancellationController,
    preflight: bool,
}

impl AugmentationPipeline {
    /// Creates a pipeline with default store, retry policy and no preflight.
    pub fn new(client: Arc<dyn GenerationClient>, generator: impl Into<String>) -> Self {
        Self {
            store: DocumentStore::default(),
            client,
            retry: RetryPolicy::default(),
            generator: generator.into().trim().to_string(),
            cancel: CancellationController::new(),
            preflight: false,
        }
    }

    /// Creates a pipeline configured from an [`AugmentConfig`].
    pub fn from_config(
        client: Arc<dyn GenerationClient>,
        generator: impl Into<String>,
        config: &AugmentConfig,
    ) -> Self {
        Self::new(client, generator)
            .with_store(DocumentStore::new(config.extension.clone()))
            .with_retry_policy(RetryPolicy::from_config(config))
            .with_preflight(config.preflight)
    }

    pub fn with_store(mut self, store: DocumentStore) -> Self {
        self.store = store;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationController) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_preflight(mut self, enabled: bool) -> Self {
        self.preflight = enabled;
        self
    }

    /// Augmentation field this pipeline fills.
    pub fn generator(&self) -> &str {
        &self.generator
    }

    /// Runs over every document under `root`.
    ///
    /// # Errors
    ///
    /// - `RunError::InvalidGenerator`: the generator name is empty or names a
    ///   required or metadata field
    /// - `RunError::RootNotFound`: `root` is not a directory
    /// - `RunError::Fatal` / `RunError::Preflight`: the preflight probe failed
    ///
    /// A fatal error met mid-run is reported through [`RunReport::halt`] so
    /// the statistics survive.
    pub async fn run(&self, root: &Path) -> Result<RunReport, RunError> {
        if self.generator.is_empty() || is_reserved_field(&self.generator) {
            return Err(RunError::InvalidGenerator(self.generator.clone()));
        }
        if !root.is_dir() {
            return Err(RunError::RootNotFound(root.to_path_buf()));
        }

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            %run_id,
            generator = %self.generator,
            root = %root.display(),
            max_retries = self.retry.max_retries(),
            base_delay_secs = self.retry.base_delay().as_secs_f64(),
            "Starting augmentation run"
        );

        if self.preflight {
            info!("Checking backend connection");
            if let Err(err) = self.client.probe().await {
                error!(error = %err, "Backend connection check failed");
                return Err(if err.is_fatal() {
                    RunError::Fatal(err)
                } else {
                    RunError::Preflight(err)
                });
            }
        }

        let mut stats = RunStats::new();
        let mut halt = HaltReason::Completed;

        for path in self.store.enumerate(root) {
            if self.cancel.is_cancelled() {
                info!("Stop requested, not starting further documents");
                halt = HaltReason::Cancelled;
                break;
            }

            match self.process_document(&path).await {
                JobOutcome::Processed { .. } => stats.record_processed(),
                JobOutcome::Skipped => stats.record_skipped(),
                JobOutcome::Failed(failure) => {
                    stats.record_errored();
                    if failure.is_fatal() {
                        error!(error = %failure, "Aborting run: credentials rejected");
                        halt = HaltReason::Fatal(failure.to_string());
                        break;
                    }
                }
            }
        }

        if halt == HaltReason::Completed && self.cancel.is_cancelled() {
            halt = HaltReason::Cancelled;
        }

        stats.log_summary(&self.generator);

        Ok(RunReport {
            run_id,
            generator: self.generator.clone(),
            root: root.to_path_buf(),
            started_at,
            finished_at: Utc::now(),
            stats,
            halt,
        })
    }

    /// Takes one document through the job state machine.
    pub async fn process_document(&self, path: &Path) -> JobOutcome {
        info!(path = %path.display(), "Processing document");
        self.enter(path, JobState::Pending);

        self.enter(path, JobState::Validating);
        let mut document = match self.store.load(path) {
            Ok(document) => document,
            Err(err) => return self.fail(path, JobFailure::Malformed(err)),
        };
        let (title, content) = match document.required_fields(path) {
            Ok((title, content)) => (title.to_string(), content.to_string()),
            Err(err) => return self.fail(path, JobFailure::Malformed(err)),
        };

        if already_done(&document, &self.generator) {
            self.enter(path, JobState::Skip);
            info!(path = %path.display(), generator = %self.generator, "Already augmented, skipping");
            self.enter(path, JobState::Terminal);
            return JobOutcome::Skipped;
        }

        self.enter(path, JobState::Generating);

        let generated = match self
            .retry
            .run(self.client.as_ref(), &title, &content, &self.cancel)
            .await
        {
            Ok(generated) => generated,
            Err(failure) => return self.fail(path, failure),
        };

        let text = generated.text.trim();
        if text.is_empty() {
            return self.fail(path, JobFailure::EmptyResult);
        }

        self.enter(path, JobState::Persisting);
        document.set_augmentation(&self.generator, text);
        if let Err(err) = self.store.persist(path, &document) {
            return self.fail(path, JobFailure::Persist(err));
        }

        info!(
            path = %path.display(),
            generator = %self.generator,
            attempts = generated.attempts,
            "Augmentation stored"
        );
        self.enter(path, JobState::Terminal);
        JobOutcome::Processed {
            attempts: generated.attempts,
        }
    }

    fn enter(&self, path: &Path, state: JobState) {
        debug!(path = %path.display(), %state, "Job state");
    }

    fn fail(&self, path: &Path, failure: JobFailure) -> JobOutcome {
        self.enter(path, JobState::Failed);
        match &failure {
            JobFailure::Fatal(_) => error!(path = %path.display(), error = %failure, "Job failed"),
            _ => warn!(path = %path.display(), error = %failure, "Job failed"),
        }
        self.enter(path, JobState::Terminal);
        JobOutcome::Failed(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;

    struct Echo {
        calls: AtomicU32,
    }

    #[async_trait]
    impl GenerationClient for Echo {
        async fn generate(&self, title: &str, _content: &str) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("  Sobre {}  ", title))
        }
    }

    fn echo() -> Arc<Echo> {
        Arc::new(Echo {
            calls: AtomicU32::new(0),
        })
    }

    #[test]
    fn test_halt_reason_serialization() {
        let json = serde_json::to_value(HaltReason::Fatal("bad key".to_string())).unwrap();
        assert_eq!(json["status"], "fatal");
        assert_eq!(json["reason"], "bad key");

        let json = serde_json::to_value(HaltReason::Completed).unwrap();
        assert_eq!(json["status"], "completed");
    }

    #[tokio::test]
    async fn test_process_document_stores_trimmed_text() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.json");
        std::fs::write(&path, r#"{"title": "T", "content": "C"}"#).unwrap();

        let client = echo();
        let pipeline = AugmentationPipeline::new(client.clone(), " genA ");
        assert_eq!(pipeline.generator(), "genA");

        let outcome = pipeline.process_document(&path).await;
        assert!(matches!(outcome, JobOutcome::Processed { attempts: 1 }));

        let stored = DocumentStore::default().load(&path).unwrap();
        assert_eq!(stored.field("genA"), Some("Sobre T"));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_root_is_error() {
        let temp = TempDir::new().unwrap();
        let pipeline = AugmentationPipeline::new(echo(), "genA");
        let err = pipeline.run(&temp.path().join("nope")).await.unwrap_err();
        assert!(matches!(err, RunError::RootNotFound(_)));
    }

    #[tokio::test]
    async fn test_reserved_or_blank_generator_is_rejected() {
        let temp = TempDir::new().unwrap();
        for name in ["content", "URL", "  "] {
            let client = echo();
            let err = AugmentationPipeline::new(client.clone(), name)
                .run(temp.path())
                .await
                .unwrap_err();
            assert!(matches!(err, RunError::InvalidGenerator(_)), "{}", name);
            assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_empty_tree_completes() {
        let temp = TempDir::new().unwrap();
        let report = AugmentationPipeline::new(echo(), "genA")
            .run(temp.path())
            .await
            .unwrap();
        assert_eq!(report.halt, HaltReason::Completed);
        assert_eq!(report.stats.visited(), 0);
        assert!(report.finished_at >= report.started_at);
    }
}
