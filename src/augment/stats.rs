//! Run statistics.

use serde::Serialize;
use tracing::info;

/// Counters for one run, incremented once per terminal job outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Documents augmented and persisted.
    pub processed: u64,
    /// Documents that already carried the augmentation.
    pub skipped: u64,
    /// Documents that ended in any failure.
    pub errored: u64,
}

impl RunStats {
    /// Creates new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful generation and persist.
    pub fn record_processed(&mut self) {
        self.processed += 1;
    }

    /// Records a document the idempotency guard skipped.
    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    /// Records a failed job.
    pub fn record_errored(&mut self) {
        self.errored += 1;
    }

    /// Documents visited so far.
    pub fn visited(&self) -> u64 {
        self.processed + self.skipped + self.errored
    }

    /// Emits the final tally through tracing.
    pub fn log_summary(&self, generator: &str) {
        info!(
            generator,
            processed = self.processed,
            skipped = self.skipped,
            errored = self.errored,
            visited = self.visited(),
            "Run finished"
        );
    }
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "processed={} skipped={} errored={}",
            self.processed, self.skipped, self.errored
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_sum_to_visited() {
        let mut stats = RunStats::new();
        stats.record_processed();
        stats.record_processed();
        stats.record_skipped();
        stats.record_errored();

        assert_eq!(stats.processed, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.errored, 1);
        assert_eq!(stats.visited(), 4);
        assert_eq!(stats.to_string(), "processed=2 skipped=1 errored=1");
    }

    #[test]
    fn test_serializes_counters() {
        let json = serde_json::to_value(RunStats::new()).unwrap();
        assert_eq!(json["processed"], 0);
        assert_eq!(json["errored"], 0);
    }
}
