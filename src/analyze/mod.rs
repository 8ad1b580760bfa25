//! Text analysis pipeline
//!
//! Provides analysis via:
//! - OpenAI chat completions (remote)
//! - Gemini generate content (remote)
//! - A local heuristic mock analyzer (default, needs no credentials)
//!
//! [`process_text`] is the single entry point: it selects an analyzer from
//! the configured provider and returns a normalized [`ProcessedData`]
//! record or a [`ProviderError`]. Unknown provider names route to the mock
//! analyzer so a misconfigured name never silently calls a paid API.

pub mod gemini;
pub mod mock;
pub mod normalize;
pub mod openai;

use crate::config::Settings;
use crate::error::ProviderError;
use serde::{Deserialize, Serialize};

/// Structured result of analyzing one piece of captured text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedData {
    /// Main topic or subject, never empty
    pub topic: String,
    /// Named entities in order of appearance, may be empty
    pub entities: Vec<String>,
    /// Primary intent: note, question, shopping, meeting, task, or
    /// whatever the provider supplied
    pub intent: String,
    /// Categories, never empty (falls back to "Miscellaneous")
    pub categories: Vec<String>,
    /// Action items, never empty (falls back to "No action needed")
    pub action_items: Vec<String>,
}

/// Known analysis providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Gemini,
    #[default]
    Mock,
}

impl Provider {
    /// Parse a provider name. Unknown names map to [`Provider::Mock`],
    /// the safe default.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "openai" => Provider::OpenAi,
            "gemini" => Provider::Gemini,
            _ => Provider::Mock,
        }
    }

    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Gemini => "gemini",
            Provider::Mock => "mock",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for text analysis backends
pub trait Analyzer: Send + Sync {
    /// Analyze text using the given prompt template
    fn analyze(&self, text: &str, template: &str) -> Result<ProcessedData, ProviderError>;

    /// Get the backend name
    fn name(&self) -> &'static str;
}

/// Create an analyzer based on the configured provider
pub fn create_analyzer(settings: &Settings) -> Box<dyn Analyzer> {
    match settings.provider.to_lowercase().as_str() {
        "openai" => Box::new(openai::OpenAiAnalyzer::new(
            &settings.openai,
            settings.request_timeout(),
        )),
        "gemini" => Box::new(gemini::GeminiAnalyzer::new(
            &settings.gemini,
            settings.request_timeout(),
        )),
        "mock" | "" => Box::new(mock::MockAnalyzer::new(&settings.mock)),
        other => {
            tracing::warn!("Unknown provider '{}', falling back to mock", other);
            Box::new(mock::MockAnalyzer::new(&settings.mock))
        }
    }
}

/// Analyze captured text with the configured provider.
///
/// The only side effect is the outbound call made by the chosen adapter.
pub fn process_text(
    text: &str,
    template: &str,
    settings: &Settings,
) -> Result<ProcessedData, ProviderError> {
    let analyzer = create_analyzer(settings);
    tracing::debug!(
        "Processing {} chars with the {} analyzer",
        text.len(),
        analyzer.name()
    );
    analyzer.analyze(text, template)
}

/// Substitute the `{text}` placeholder in a prompt template.
///
/// Only the first occurrence is replaced, literally and without escaping;
/// template authors must not use a literal `{text}` elsewhere.
pub fn render_prompt(template: &str, text: &str) -> String {
    template.replacen("{text}", text, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_prompt_substitutes_verbatim() {
        let rendered = render_prompt("Analyze this:\n\n{text}\n\nThanks", "Buy milk & eggs");
        assert!(rendered.contains("Buy milk & eggs"));
        assert!(!rendered.contains("{text}"));
    }

    #[test]
    fn test_render_prompt_first_occurrence_only() {
        let rendered = render_prompt("{text} and {text}", "A");
        assert_eq!(rendered, "A and {text}");
    }

    #[test]
    fn test_render_prompt_no_placeholder_is_identity() {
        assert_eq!(render_prompt("no placeholder", "x"), "no placeholder");
    }

    #[test]
    fn test_provider_parse_known_names() {
        assert_eq!(Provider::parse("openai"), Provider::OpenAi);
        assert_eq!(Provider::parse("OpenAI"), Provider::OpenAi);
        assert_eq!(Provider::parse("gemini"), Provider::Gemini);
        assert_eq!(Provider::parse("mock"), Provider::Mock);
    }

    #[test]
    fn test_provider_parse_unknown_is_mock() {
        assert_eq!(Provider::parse(""), Provider::Mock);
        assert_eq!(Provider::parse("claude"), Provider::Mock);
        assert_eq!(Provider::parse("gpt"), Provider::Mock);
    }

    #[test]
    fn test_create_analyzer_dispatch() {
        let mut settings = Settings::default();
        settings.mock.delay_ms = 0;

        assert_eq!(create_analyzer(&settings).name(), "mock");

        settings.provider = "openai".to_string();
        assert_eq!(create_analyzer(&settings).name(), "openai");

        settings.provider = "gemini".to_string();
        assert_eq!(create_analyzer(&settings).name(), "gemini");

        settings.provider = "something-new".to_string();
        assert_eq!(create_analyzer(&settings).name(), "mock");
    }

    #[test]
    fn test_process_text_with_mock() {
        let mut settings = Settings::default();
        settings.mock.delay_ms = 0;
        settings.mock.failure_rate = 0.0;

        let template = settings.prompt.template.clone();
        let data = process_text("Buy milk and eggs", &template, &settings).unwrap();
        assert_eq!(data.intent, "shopping");
        assert!(data.categories.contains(&"Shopping".to_string()));
    }

    #[test]
    fn test_process_text_openai_without_key_fails() {
        let mut settings = Settings::default();
        settings.provider = "openai".to_string();

        let result = process_text("text", "{text}", &settings);
        assert!(matches!(
            result,
            Err(ProviderError::MissingCredential { .. })
        ));
    }
}
