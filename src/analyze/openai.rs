//! OpenAI chat-completions adapter
//!
//! Sends the rendered prompt as a single-turn chat request and hands the
//! first completion's text to the response normalizer. One request per
//! analysis, fixed sampling parameters, no retries, no streaming.

use super::{render_prompt, Analyzer, ProcessedData};
use crate::analyze::normalize;
use crate::config::OpenAiSettings;
use crate::error::ProviderError;
use std::time::Duration;

const PROVIDER: &str = "OpenAI";

/// Default chat-completions endpoint
pub const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that analyzes text and extracts structured information.";

/// Analyzer backed by the OpenAI chat-completions API
#[derive(Debug, Clone)]
pub struct OpenAiAnalyzer {
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiAnalyzer {
    /// Create an analyzer from settings
    pub fn new(settings: &OpenAiSettings, timeout: Duration) -> Self {
        Self {
            endpoint: OPENAI_ENDPOINT.to_string(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            timeout,
        }
    }

    /// Point at a different OpenAI-compatible endpoint (self-hosted gateways)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Issue the chat-completion request and extract the reply text
    fn call(&self, prompt: &str) -> Result<String, ProviderError> {
        let agent = ureq::AgentBuilder::new().timeout(self.timeout).build();

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt }
            ],
            "temperature": 0.3,
            "max_tokens": 500
        });

        tracing::debug!("Calling OpenAI chat completions (model={})", self.model);

        let response = agent
            .post(&self.endpoint)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(body)
            .map_err(remote_rejected)?;

        let json: serde_json::Value = response.into_json().map_err(|e| {
            ProviderError::RemoteRejected {
                provider: PROVIDER,
                message: format!("Failed to parse response: {}", e),
            }
        })?;

        json.get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .map(str::to_string)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ProviderError::EmptyResponse { provider: PROVIDER })
    }
}

/// Map ureq failures onto the provider error taxonomy, pulling the
/// provider's own error message out of the body when it has one
fn remote_rejected(error: ureq::Error) -> ProviderError {
    match error {
        ureq::Error::Status(code, response) => {
            let message = response
                .into_json::<serde_json::Value>()
                .ok()
                .and_then(|body| {
                    Some(body.get("error")?.get("message")?.as_str()?.to_string())
                })
                .unwrap_or_else(|| format!("Server returned status {}", code));
            ProviderError::RemoteRejected {
                provider: PROVIDER,
                message,
            }
        }
        ureq::Error::Transport(transport) => ProviderError::RemoteRejected {
            provider: PROVIDER,
            message: transport.to_string(),
        },
    }
}

impl Analyzer for OpenAiAnalyzer {
    fn analyze(&self, text: &str, template: &str) -> Result<ProcessedData, ProviderError> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::MissingCredential { provider: PROVIDER });
        }

        let prompt = render_prompt(template, text);
        let raw = self.call(&prompt)?;
        tracing::debug!("OpenAI returned {} chars", raw.len());

        Ok(normalize::normalize(&raw, text))
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
