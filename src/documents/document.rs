//! In-memory representation of a crawled article.

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::DocumentError;

/// Required field holding the article headline.
pub const TITLE_FIELD: &str = "title";

/// Required field holding the human-written article body.
pub const CONTENT_FIELD: &str = "content";

/// Crawler metadata fields that are neither required nor augmentations.
pub const METADATA_FIELDS: &[&str] = &["url", "date", "section"];

/// Normalizes a field name for comparison.
///
/// Crawlers emit inconsistent casing and stray whitespace in keys, so every
/// lookup goes through this.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Whether `name` is a required or crawler metadata field, and so can never
/// hold an augmentation.
pub fn is_reserved_field(name: &str) -> bool {
    let normalized = normalize_key(name);
    normalized == TITLE_FIELD
        || normalized == CONTENT_FIELD
        || METADATA_FIELDS.contains(&normalized.as_str())
}

/// A JSON article record plus any generator augmentations.
///
/// Keys keep their original casing and order so a rewrite only ever adds
/// fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    fields: Map<String, Value>,
}

impl Document {
    /// Parses a document from JSON text.
    ///
    /// Anything other than a top-level JSON object is malformed.
    pub fn parse(text: &str, path: &Path) -> Result<Self, DocumentError> {
        let value: Value = serde_json::from_str(text).map_err(|e| DocumentError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(DocumentError::Malformed {
                path: path.to_path_buf(),
                reason: format!("expected a JSON object, found {}", json_kind(&other)),
            }),
        }
    }

    /// Looks up a string field by case-insensitive, trimmed name.
    ///
    /// Non-string values are treated as absent. When several keys collide
    /// after normalization, the first non-blank value wins; if all are blank
    /// the first one is returned.
    pub fn field(&self, name: &str) -> Option<&str> {
        let wanted = normalize_key(name);
        let mut values = self
            .fields
            .iter()
            .filter(|(key, _)| normalize_key(key) == wanted)
            .filter_map(|(_, value)| value.as_str());

        let first = values.next()?;
        if !first.trim().is_empty() {
            return Some(first);
        }
        Some(values.find(|value| !value.trim().is_empty()).unwrap_or(first))
    }

    /// Headline of the article, if present.
    pub fn title(&self) -> Option<&str> {
        self.field(TITLE_FIELD)
    }

    /// Body of the article, if present.
    pub fn content(&self) -> Option<&str> {
        self.field(CONTENT_FIELD)
    }

    /// Checks that `title` and `content` exist and are non-blank.
    pub fn validate(&self, path: &Path) -> Result<(), DocumentError> {
        self.required_fields(path).map(|_| ())
    }

    /// Returns `(title, content)` once both are known to be non-blank.
    pub fn required_fields(&self, path: &Path) -> Result<(&str, &str), DocumentError> {
        let title = self.non_blank(TITLE_FIELD, path)?;
        let content = self.non_blank(CONTENT_FIELD, path)?;
        Ok((title, content))
    }

    fn non_blank(&self, field: &'static str, path: &Path) -> Result<&str, DocumentError> {
        self.field(field)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| DocumentError::MissingField {
                path: path.to_path_buf(),
                field,
                found: self.keys_summary(),
            })
    }

    /// Stores generated text under `generator`.
    ///
    /// An existing key that matches case-insensitively (for instance a blank
    /// leftover from an interrupted run) is overwritten in place instead of
    /// adding a near-duplicate key.
    pub fn set_augmentation(&mut self, generator: &str, text: impl Into<String>) {
        let wanted = normalize_key(generator);
        let existing = self
            .fields
            .keys()
            .find(|key| normalize_key(key) == wanted)
            .cloned();
        let key = existing.unwrap_or_else(|| generator.trim().to_string());
        self.fields.insert(key, Value::String(text.into()));
    }

    /// Iterates over augmentation fields as `(key, text)` pairs.
    ///
    /// Every string field that is not required or crawler metadata counts.
    pub fn augmentations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().filter_map(|(key, value)| {
            if is_reserved_field(key) {
                return None;
            }
            value.as_str().map(|text| (key.as_str(), text))
        })
    }

    /// Comma-separated list of the original keys, for error traces.
    pub fn keys_summary(&self) -> String {
        self.fields
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Number of fields in the document.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the document has no fields at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Serializes the document as 2-space indented JSON.
    pub fn to_pretty_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(&self.fields)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
