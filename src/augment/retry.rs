//! Bounded exponential backoff around a single generation job.
//!
//! Transient failures (`Timeout`, `TransportError`) are retried after
//! `base_delay * 2^attempt`; `AuthFailure` is fatal for the run; empty or
//! rejected results fail the job without retrying. Every backoff wait can be
//! cut short by cancellation.

use std::time::Duration;

use tracing::{debug, warn};

use super::cancel::{CancellationController, WaitOutcome};
use super::config::AugmentConfig;
use crate::error::{GenerationError, JobFailure};
use crate::generation::GenerationClient;

/// Text produced by a successful job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    /// Generated paragraph.
    pub text: String,
    /// Number of backend calls it took.
    pub attempts: u32,
}

/// Per-job retry bookkeeping, discarded once the job is terminal.
#[derive(Debug)]
struct RetryState {
    calls: u32,
    retries: u32,
}

/// Retry policy for generation calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&AugmentConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn from_config(config: &AugmentConfig) -> Self {
        Self::new(config.max_retries, config.base_delay)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Every wait the policy may perform for one job, in order.
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.max_retries).map(|a| self.delay_for(a)).collect()
    }

    /// Runs one job against `client`, retrying transient failures.
    pub async fn run(
        &self,
        client: &dyn GenerationClient,
        title: &str,
        content: &str,
        cancel: &CancellationController,
    ) -> Result<Generated, JobFailure> {
        let mut state = RetryState {
            calls: 0,
            retries: 0,
        };

        loop {
            state.calls += 1;
            let err = match client.generate(title, content).await {
                Ok(text) => {
                    return Ok(Generated {
                        text,
                        attempts: state.calls,
                    })
                }
                Err(err) => err,
            };

            if err.is_fatal() {
                return Err(JobFailure::Fatal(err));
            }
            if err == GenerationError::EmptyResult {
                return Err(JobFailure::EmptyResult);
            }
            if !err.is_retryable() {
                return Err(JobFailure::Rejected(err));
            }
            if state.retries >= self.max_retries {
                return Err(JobFailure::RetriesExhausted {
                    attempts: state.calls,
                    last: err,
                });
            }

            let delay = self.delay_for(state.retries);
            warn!(
                attempt = state.calls,
                max_retries = self.max_retries,
                delay_secs = delay.as_secs_f64(),
                error = %err,
                "Transient generation failure, backing off"
            );

            if cancel.wait(delay).await == WaitOutcome::Cancelled {
                debug!(attempts = state.calls, "Backoff interrupted by stop request");
                return Err(JobFailure::Cancelled {
                    attempts: state.calls,
                });
            }
            state.retries += 1;
        }
    }
}
