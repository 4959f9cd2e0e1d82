//! Cooperative cancellation for a run.
//!
//! The controller owns a [`CancellationToken`]. The pipeline checks it before
//! starting each document and races it against every backoff sleep. It never
//! interrupts an in-flight request or a persist.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Result of an interruptible wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The full delay elapsed.
    Elapsed,
    /// Cancellation was requested before the delay elapsed.
    Cancelled,
}

/// Holds the run-wide "stop requested" flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationController {
    token: CancellationToken,
}

impl CancellationController {
    /// Creates a controller that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a controller that is already cancelled.
    pub fn cancelled() -> Self {
        let controller = Self::new();
        controller.cancel();
        controller
    }

    /// Requests a stop. Idempotent; the flag never resets.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether a stop was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Sleeps for `delay` unless cancellation arrives first.
    pub async fn wait(&self, delay: Duration) -> WaitOutcome {
        if self.is_cancelled() {
            return WaitOutcome::Cancelled;
        }
        tokio::select! {
            _ = self.token.cancelled() => WaitOutcome::Cancelled,
            _ = tokio::time::sleep(delay) => WaitOutcome::Elapsed,
        }
    }

    /// Spawns a task that cancels on the first SIGINT (or SIGTERM on Unix).
    ///
    /// The task exits after the first signal; it also exits quietly if the
    /// token is cancelled by other means.
    pub fn listen_for_signals(&self) -> JoinHandle<()> {
        let token = self.token.clone();
        tokio::spawn(async move {
            tokio::select! {
                signal = termination_signal() => {
                    info!(signal, "Stop requested, finishing the current document");
                    token.cancel();
                }
                _ = token.cancelled() => {}
            }
        })
    }
}

#[cfg(unix)]
async fn termination_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                name = ctrl_c() => name,
                _ = sigterm.recv() => "SIGTERM",
            }
        }
        Err(err) => {
            warn!(error = %err, "Cannot install SIGTERM handler, listening for Ctrl-C only");
            ctrl_c().await
        }
    }
}

#[cfg(not(unix))]
async fn termination_signal() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Cannot listen for Ctrl-C; stop requests will be ignored");
        std::future::pending::<()>().await;
    }
    "SIGINT"
}
