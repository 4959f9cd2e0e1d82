//! Filesystem-backed document store.
//!
//! Walks a directory tree of JSON articles, loads them, and writes augmented
//! versions back atomically: the new content goes to a temporary file in the
//! same directory which is then renamed over the original, so a crash leaves
//! either the old or the new document on disk.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use super::document::Document;
use crate::error::DocumentError;

/// Default extension of document files.
pub const DEFAULT_EXTENSION: &str = "json";

/// Prefix of in-flight temporary files. The `.tmp` suffix keeps leftovers
/// from a hard kill out of enumeration.
const TEMP_PREFIX: &str = ".newsforge-";
const TEMP_SUFFIX: &str = ".tmp";

/// Enumerates, loads and persists documents under a root directory.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    extension: String,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSION)
    }
}

impl DocumentStore {
    /// Creates a store recognizing files with `extension` (without the dot).
    pub fn new(extension: impl Into<String>) -> Self {
        let extension = extension.into();
        Self {
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Extension of recognized document files.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Lazily walks `root` and yields document paths in file-name order.
    ///
    /// The order is stable for a given tree, which keeps resumption logs
    /// comparable between runs. Unreadable entries are logged and skipped.
    pub fn enumerate<'a>(&'a self, root: &Path) -> impl Iterator<Item = PathBuf> + 'a {
        WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(error = %err, "Skipping unreadable directory entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(move |path| self.is_document(path))
    }

    /// Whether `path` carries the recognized extension.
    pub fn is_document(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(&self.extension))
            .unwrap_or(false)
    }

    /// Reads and parses the document at `path`.
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected; the JSON
    /// structure still has to be a top-level object.
    pub fn load(&self, path: &Path) -> Result<Document, DocumentError> {
        let bytes = std::fs::read(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);
        Document::parse(&text, path)
    }

    /// Atomically replaces the document at `path` with `document`.
    pub fn persist(&self, path: &Path, document: &Document) -> Result<(), DocumentError> {
        let persist_err = |reason: String| DocumentError::Persist {
            path: path.to_path_buf(),
            reason,
        };

        let bytes = document
            .to_pretty_json()
            .map_err(|e| persist_err(format!("serialization failed: {}", e)))?;

        let dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(dir)
            .map_err(|e| persist_err(format!("cannot create temporary file: {}", e)))?;

        tmp.write_all(&bytes)
            .map_err(|e| persist_err(format!("write failed: {}", e)))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| persist_err(format!("sync failed: {}", e)))?;
        tmp.persist(path)
            .map_err(|e| persist_err(format!("rename failed: {}", e.error)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, body: &str) -> PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(&path, body).expect("write fixture");
        path
    }

    #[test]
    fn test_enumerate_is_recursive_filtered_and_sorted() {
        let temp = TempDir::new().expect("temp dir");
        let root = temp.path();
        write(root, "b/2.json", "{}");
        write(root, "a/1.json", "{}");
        write(root, "a/notes.txt", "ignored");
        write(root, "0.JSON", "{}");

        let store = DocumentStore::default();
        let found: Vec<PathBuf> = store
            .enumerate(root)
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            found,
            vec![
                PathBuf::from("0.JSON"),
                PathBuf::from("a/1.json"),
                PathBuf::from("b/2.json"),
            ]
        );

        let again: Vec<PathBuf> = store.enumerate(root).collect();
        assert_eq!(again.len(), 3);
    }

    #[test]
    fn test_custom_extension_strips_dot() {
        let store = DocumentStore::new(".ndjson");
        assert_eq!(store.extension(), "ndjson");
        assert!(store.is_document(Path::new("x.ndjson")));
        assert!(!store.is_document(Path::new("x.json")));
    }

    #[test]
    fn test_load_replaces_invalid_utf8() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("bad.json");
        let mut bytes = br#"{"title": "caf"#.to_vec();
        bytes.push(0xff);
        bytes.extend_from_slice(br#"", "content": "x"}"#);
        std::fs::write(&path, bytes).unwrap();

        let document = DocumentStore::default().load(&path).expect("lossy load");
        assert!(document.title().unwrap().starts_with("caf"));
    }

    #[test]
    fn test_load_malformed_and_missing() {
        let temp = TempDir::new().expect("temp dir");
        let store = DocumentStore::default();

        let path = write(temp.path(), "broken.json", "{\"title\": ");
        assert!(matches!(
            store.load(&path),
            Err(DocumentError::Malformed { .. })
        ));

        let missing = temp.path().join("missing.json");
        assert!(matches!(store.load(&missing), Err(DocumentError::Io { .. })));
    }

    #[test]
    fn test_persist_replaces_atomically_and_leaves_no_temp_files() {
        let temp = TempDir::new().expect("temp dir");
        let store = DocumentStore::default();
        let path = write(temp.path(), "doc.json", r#"{"title": "T", "content": "C"}"#);

        let mut document = store.load(&path).unwrap();
        document.set_augmentation("genA", "text");
        store.persist(&path, &document).expect("persist");

        let reloaded = store.load(&path).unwrap();
        assert_eq!(reloaded, document);

        let leftovers: Vec<_> = std::fs::read_dir(temp.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(TEMP_PREFIX))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_persist_into_missing_directory_fails_without_touching_anything() {
        let temp = TempDir::new().expect("temp dir");
        let store = DocumentStore::default();
        let path = temp.path().join("gone").join("doc.json");
        let document = Document::parse(r#"{"title": "T", "content": "C"}"#, &path).unwrap();

        let err = store.persist(&path, &document).unwrap_err();
        assert!(matches!(err, DocumentError::Persist { .. }));
        assert!(!path.exists());
    }
}
