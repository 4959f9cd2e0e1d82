//! Read-only coverage scan over a document tree.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use super::document::normalize_key;
use super::guard::already_done;
use super::store::DocumentStore;

/// How far each generator has got through a tree.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CoverageReport {
    /// Document files found.
    pub documents: u64,
    /// Files that failed to load or lack required fields.
    pub invalid: u64,
    /// Non-empty augmentations per (normalized) generator name.
    pub augmentations: BTreeMap<String, u64>,
    /// Valid documents still missing the requested generator, if one was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<u64>,
}

impl DocumentStore {
    /// Counts documents and augmentations under `root` without writing anything.
    pub fn coverage(&self, root: &Path, generator: Option<&str>) -> CoverageReport {
        let mut report = CoverageReport {
            pending: generator.map(|_| 0),
            ..CoverageReport::default()
        };

        for path in self.enumerate(root) {
            report.documents += 1;

            let document = match self.load(&path).and_then(|d| d.validate(&path).map(|_| d)) {
                Ok(document) => document,
                Err(err) => {
                    debug!(path = %path.display(), error = %err, "Invalid document");
                    report.invalid += 1;
                    continue;
                }
            };

            for (key, text) in document.augmentations() {
                if !text.trim().is_empty() {
                    *report.augmentations.entry(normalize_key(key)).or_insert(0) += 1;
                }
            }

            if let (Some(generator), Some(pending)) = (generator, report.pending.as_mut()) {
                if !already_done(&document, generator) {
                    *pending += 1;
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_coverage_counts_per_generator() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::write(
            root.join("1.json"),
            r#"{"title": "T", "content": "C", "DeepSeek": "a", "gemma": ""}"#,
        )
        .unwrap();
        std::fs::write(root.join("2.json"), r#"{"title": "T", "content": "C"}"#).unwrap();
        std::fs::write(root.join("3.json"), r#"{"title": "T"}"#).unwrap();
        std::fs::write(root.join("4.json"), "not json").unwrap();

        let report = DocumentStore::default().coverage(root, Some("deepseek"));
        assert_eq!(report.documents, 4);
        assert_eq!(report.invalid, 2);
        assert_eq!(report.augmentations.get("deepseek"), Some(&1));
        assert_eq!(report.augmentations.get("gemma"), None);
        assert_eq!(report.pending, Some(1));
    }

    #[test]
    fn test_coverage_without_generator_has_no_pending() {
        let temp = TempDir::new().unwrap();
        let report = DocumentStore::default().coverage(temp.path(), None);
        assert_eq!(report.documents, 0);
        assert!(report.pending.is_none());

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("pending").is_none());
    }
}
