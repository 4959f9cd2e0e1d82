//! Presets for the generation backends newsforge knows how to reach.

use serde::Serialize;

/// A chat-completions backend preset.
///
/// Every preset speaks the same OpenAI-compatible protocol; they differ in
/// endpoint, model, credential requirements and sampling defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// DeepSeek hosted API.
    Deepseek,
    /// A locally hosted model behind an OpenAI-compatible server.
    Local,
}

impl Backend {
    /// Default API base URL.
    pub fn api_base(&self) -> &'static str {
        match self {
            Backend::Deepseek => "https://api.deepseek.com/v1",
            Backend::Local => "http://localhost:8000/v1",
        }
    }

    /// Default model identifier.
    pub fn default_model(&self) -> &'static str {
        match self {
            Backend::Deepseek => "deepseek-chat",
            Backend::Local => "gemma-3-1b-pt",
        }
    }

    /// Augmentation field name used when none is given.
    pub fn default_generator(&self) -> &'static str {
        match self {
            Backend::Deepseek => "deepseek",
            Backend::Local => "local",
        }
    }

    /// Whether requests must carry a bearer credential.
    pub fn requires_key(&self) -> bool {
        matches!(self, Backend::Deepseek)
    }

    /// Completion token cap for one paragraph.
    pub fn max_tokens(&self) -> u32 {
        match self {
            Backend::Deepseek => 500,
            Backend::Local => 200,
        }
    }

    /// Sampling temperature.
    pub fn temperature(&self) -> f64 {
        0.7
    }

    /// Nucleus sampling, only sent to local servers.
    pub fn top_p(&self) -> Option<f64> {
        match self {
            Backend::Deepseek => None,
            Backend::Local => Some(0.9),
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Deepseek => write!(f, "deepseek"),
            Backend::Local => write!(f, "local"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deepseek_preset() {
        let backend = Backend::Deepseek;
        assert_eq!(backend.api_base(), "https://api.deepseek.com/v1");
        assert_eq!(backend.default_model(), "deepseek-chat");
        assert_eq!(backend.default_generator(), "deepseek");
        assert!(backend.requires_key());
        assert_eq!(backend.max_tokens(), 500);
        assert_eq!(backend.top_p(), None);
    }

    #[test]
    fn test_local_preset_needs_no_key() {
        let backend = Backend::Local;
        assert!(!backend.requires_key());
        assert_eq!(backend.top_p(), Some(0.9));
        assert_eq!(backend.to_string(), "local");
    }
}
