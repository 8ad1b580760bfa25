//! Gemini generate-content adapter
//!
//! Same contract as the OpenAI adapter with Google's request shape: the
//! API key travels as a query parameter and the model name is part of the
//! endpoint path. Single request, fixed sampling parameters, no retries.

use super::{render_prompt, Analyzer, ProcessedData};
use crate::analyze::normalize;
use crate::config::GeminiSettings;
use crate::error::ProviderError;
use std::time::Duration;

const PROVIDER: &str = "Gemini";

/// Default generate-content endpoint base (model name is appended)
pub const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Analyzer backed by the Gemini generate-content API
#[derive(Debug, Clone)]
pub struct GeminiAnalyzer {
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl GeminiAnalyzer {
    /// Create an analyzer from settings
    pub fn new(settings: &GeminiSettings, timeout: Duration) -> Self {
        Self {
            endpoint: GEMINI_ENDPOINT.to_string(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            timeout,
        }
    }

    /// Point at a different endpoint base (test servers, proxies)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Issue the generate-content request and extract the reply text
    fn call(&self, prompt: &str) -> Result<String, ProviderError> {
        let agent = ureq::AgentBuilder::new().timeout(self.timeout).build();

        let url = format!(
            "{}/{}:generateContent?key={}",
            self.endpoint.trim_end_matches('/'),
            self.model,
            self.api_key
        );

        let body = serde_json::json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ],
            "generationConfig": {
                "temperature": 0.3,
                "maxOutputTokens": 500
            }
        });

        // The URL carries the API key, so it never goes into the logs
        tracing::debug!("Calling Gemini generate-content (model={})", self.model);

        let response = agent
            .post(&url)
            .send_json(body)
            .map_err(remote_rejected)?;

        let json: serde_json::Value = response.into_json().map_err(|e| {
            ProviderError::RemoteRejected {
                provider: PROVIDER,
                message: format!("Failed to parse response: {}", e),
            }
        })?;

        json.get("candidates")
            .and_then(|candidates| candidates.get(0))
            .and_then(|candidate| candidate.get("content"))
            .and_then(|content| content.get("parts"))
            .and_then(|parts| parts.get(0))
            .and_then(|part| part.get("text"))
            .and_then(|text| text.as_str())
            .map(str::to_string)
            .filter(|text| !text.trim().is_empty())
            .ok_or(ProviderError::EmptyResponse { provider: PROVIDER })
    }
}

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

impl Analyzer for GeminiAnalyzer {
    fn analyze(&self, text: &str, template: &str) -> Result<ProcessedData, ProviderError> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::MissingCredential { provider: PROVIDER });
        }

        let prompt = render_prompt(template, text);
        let raw = self.call(&prompt)?;
        tracing::debug!("Gemini returned {} chars", raw.len());

        Ok(normalize::normalize(&raw, text))
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
