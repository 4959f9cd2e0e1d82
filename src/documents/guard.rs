//! Idempotency guard for (document, generator) pairs.

use super::document::{normalize_key, Document};

/// Returns true when `document` already carries non-empty text for `generator`.
///
/// Keys match case-insensitively after trimming. A key holding blank text (or a
/// non-string value) does not count, so a run that stored nothing usable gets
/// another chance.
pub fn already_done(document: &Document, generator: &str) -> bool {
    let wanted = normalize_key(generator);
    document
        .augmentations()
        .any(|(key, text)| normalize_key(key) == wanted && !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn doc(text: &str) -> Document {
        Document::parse(text, Path::new("guard.json")).expect("valid json object")
    }

    #[test]
    fn test_absent_field_is_not_done() {
        let document = doc(r#"{"title": "T", "content": "C"}"#);
        assert!(!already_done(&document, "deepseek"));
    }

    #[test]
    fn test_present_field_is_done_case_insensitively() {
        let document = doc(r#"{"title": "T", "content": "C", " DeepSeek": "text"}"#);
        assert!(already_done(&document, "deepseek"));
        assert!(already_done(&document, "DEEPSEEK "));
        assert!(!already_done(&document, "gemma"));
    }

    #[test]
    fn test_blank_or_non_string_value_is_not_done() {
        assert!(!already_done(
            &doc(r#"{"title": "T", "content": "C", "deepseek": "  "}"#),
            "deepseek"
        ));
        assert!(!already_done(
            &doc(r#"{"title": "T", "content": "C", "deepseek": null}"#),
            "deepseek"
        ));
    }

    #[test]
    fn test_required_fields_never_count_as_augmentation() {
        let document = doc(r#"{"title": "T", "content": "C"}"#);
        assert!(!already_done(&document, "content"));
    }
}
