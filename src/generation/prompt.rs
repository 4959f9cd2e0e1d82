//! Prompt construction and response cleanup for news paragraph generation.

use std::sync::OnceLock;

use regex::Regex;

/// Tolerance, in words, around the target paragraph length.
pub const LENGTH_TOLERANCE: usize = 15;

/// Short request used to check the backend before a run.
pub const PROBE_PROMPT: &str = "Prueba de conexión. Responde únicamente con la palabra OK.";

/// Newsroom instruction. `{title}`, `{words}` and `{tolerance}` are substituted.
const NEWS_PARAGRAPH_PROMPT: &str = r#"Eres redactor jefe de un periódico. Escribe un único párrafo que:
1. Desarrolle de forma objetiva este titular: '{title}'
2. Tenga una longitud aproximada de {words}±{tolerance} palabras
3. Siga la estructura de pirámide invertida
4. Mantenga un estilo periodístico profesional
5. Contenga solo el párrafo, sin introducciones, títulos ni comentarios
6. No use marcadores de relleno como "(insertar …)" o "[insertar …]"; si falta un dato, escríbelo de forma verosímil o reformula la frase
Texto generado:
"#;

/// Leading labels some models echo back before the paragraph.
static ECHO_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

fn echo_patterns() -> &'static [Regex] {
    ECHO_PATTERNS.get_or_init(|| {
        [
            r"(?i)^\s*texto generado\s*:\s*",
            r"(?i)^\s*p[aá]rrafo( generado)?\s*:\s*",
        ]
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
    })
}

/// Whitespace-separated word count, used as the target length hint.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Builds the generation prompt for an article.
pub fn news_paragraph_prompt(title: &str, target_words: usize) -> String {
    NEWS_PARAGRAPH_PROMPT
        .replace("{title}", title.trim())
        .replace("{words}", &target_words.to_string())
        .replace("{tolerance}", &LENGTH_TOLERANCE.to_string())
}

/// Cleans raw model output. Returns `None` when nothing usable remains.
pub fn sanitize(raw: &str) -> Option<String> {
    let mut text = raw.trim().to_string();

    for pattern in echo_patterns() {
        text = pattern.replace(&text, "").into_owned();
    }

    let text = strip_wrapping_quotes(text.trim()).trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn strip_wrapping_quotes(text: &str) -> &str {
    for (open, close) in [('"', '"'), ('“', '”'), ('«', '»')] {
        if text.chars().count() >= 2 && text.starts_with(open) && text.ends_with(close) {
            let inner = &text[open.len_utf8()..text.len() - close.len_utf8()];
            // Only a single outer pair; inner quotes are part of the prose.
            if !inner.contains(open) && !inner.contains(close) {
                return inner;
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("  uno\tdos\ntres  "), 3);
    }

    #[test]
    fn test_prompt_carries_title_and_length_hint() {
        let prompt = news_paragraph_prompt("  X gana un premio ", 140);
        assert!(prompt.contains("'X gana un premio'"));
        assert!(prompt.contains("140±15 palabras"));
        assert!(!prompt.contains("{title}"));
        assert!(prompt.trim_end().ends_with("Texto generado:"));
    }

    #[test]
    fn test_sanitize_trims_and_drops_label_echo() {
        assert_eq!(
            sanitize("  Texto generado:  X recibió un reconocimiento. \n"),
            Some("X recibió un reconocimiento.".to_string())
        );
        assert_eq!(
            sanitize("Párrafo: Hoy llueve."),
            Some("Hoy llueve.".to_string())
        );
    }

    #[test]
    fn test_sanitize_strips_single_wrapping_quote_pair() {
        assert_eq!(sanitize("\"Hoy llueve.\""), Some("Hoy llueve.".to_string()));
        assert_eq!(sanitize("“Hoy llueve.”"), Some("Hoy llueve.".to_string()));
        assert_eq!(
            sanitize("\"Dijo\" que \"sí\""),
            Some("\"Dijo\" que \"sí\"".to_string())
        );
    }

    #[test]
    fn test_sanitize_rejects_blank_output() {
        assert_eq!(sanitize(""), None);
        assert_eq!(sanitize("   \n "), None);
        assert_eq!(sanitize("Texto generado:"), None);
        assert_eq!(sanitize("\"\""), None);
    }
}
