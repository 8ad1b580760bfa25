//! Configuration loading and types for clipsift
//!
//! Configuration is loaded in layers:
//! 1. Built-in defaults
//! 2. Config file (~/.config/clipsift/config.toml)
//! 3. Environment variables (CLIPSIFT_*)
//! 4. CLI arguments (highest priority)

use crate::error::ClipsiftError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file content
pub const DEFAULT_CONFIG: &str = r#"# Clipsift Configuration
#
# Location: ~/.config/clipsift/config.toml
# All settings can be overridden via CLI flags

# Which analysis provider to use: "openai", "gemini", or "mock"
# "mock" is a local heuristic analyzer that needs no API key.
# Unknown values fall back to "mock" so a typo never hits a paid API.
provider = "mock"

[openai]
# API key for the OpenAI chat-completions endpoint
# Can also be set via CLIPSIFT_OPENAI_API_KEY
api_key = ""

# Model to request
model = "gpt-3.5-turbo"

[gemini]
# API key for the Gemini generate-content endpoint
# Can also be set via CLIPSIFT_GEMINI_API_KEY
api_key = ""

# Model to request
model = "gemini-pro"

[prompt]
# Analysis prompt template. The {text} placeholder is replaced with the
# captured clipboard text. Avoid a literal "{text}" elsewhere in the
# template; only the first occurrence is substituted.
# template = """..."""

[processing]
# Analyze items automatically when they are captured
enabled = true

# Timeout for remote provider calls, in seconds
timeout_secs = 30

[mock]
# Simulated network latency in milliseconds
delay_ms = 1500

# Probability (0.0 - 1.0) that the mock analyzer fails, for exercising
# the retry path. Set to 0.0 for deterministic runs.
failure_rate = 0.1

[storage]
# History database location. "auto" uses ~/.local/share/clipsift/history.db
path = "auto"
"#;

/// Default analysis prompt template
pub const DEFAULT_PROMPT: &str = "Analyze the following text and extract structured information:

{text}

Extract the following:
1. Main topic or subject
2. Key entities (people, organizations, locations, dates)
3. Primary intent (question, task, note, event, etc.)
4. Relevant categories or tags
5. Any actionable items";

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Analysis provider: "openai", "gemini", or "mock"
    /// Unknown values route to the mock analyzer.
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default)]
    pub openai: OpenAiSettings,

    #[serde(default)]
    pub gemini: GeminiSettings,

    #[serde(default)]
    pub prompt: PromptSettings,

    #[serde(default)]
    pub processing: ProcessingSettings,

    #[serde(default)]
    pub mock: MockSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

/// OpenAI provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenAiSettings {
    /// API key; blank means not configured
    #[serde(default)]
    pub api_key: String,

    /// Model name sent with each request
    #[serde(default = "default_openai_model")]
    pub model: String,
}

/// Gemini provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeminiSettings {
    /// API key; blank means not configured
    #[serde(default)]
    pub api_key: String,

    /// Model name used to build the endpoint path
    #[serde(default = "default_gemini_model")]
    pub model: String,
}

/// Prompt template configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PromptSettings {
    /// Template containing a single {text} placeholder
    #[serde(default = "default_prompt_template")]
    pub template: String,
}

/// Processing pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProcessingSettings {
    /// Analyze items automatically on capture
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Timeout for remote provider calls, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Mock analyzer tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MockSettings {
    /// Simulated latency in milliseconds
    #[serde(default = "default_mock_delay_ms")]
    pub delay_ms: u64,

    /// Probability of an injected failure per call (0.0 - 1.0)
    #[serde(default = "default_mock_failure_rate")]
    pub failure_rate: f64,
}

/// History storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    /// "auto" for the default data directory, or an explicit path
    #[serde(default = "default_storage_path")]
    pub path: String,
}

fn default_provider() -> String {
    // Mock is the safe default: never call a paid API without explicit selection
    "mock".to_string()
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_gemini_model() -> String {
    "gemini-pro".to_string()
}

fn default_prompt_template() -> String {
    DEFAULT_PROMPT.to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_mock_delay_ms() -> u64 {
    1500
}

fn default_mock_failure_rate() -> f64 {
    0.1
}

fn default_storage_path() -> String {
    "auto".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            openai: OpenAiSettings::default(),
            gemini: GeminiSettings::default(),
            prompt: PromptSettings::default(),
            processing: ProcessingSettings::default(),
            mock: MockSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_openai_model(),
        }
    }
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_gemini_model(),
        }
    }
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            template: default_prompt_template(),
        }
    }
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for MockSettings {
    fn default() -> Self {
        Self {
            delay_ms: default_mock_delay_ms(),
            failure_rate: default_mock_failure_rate(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

impl Settings {
    /// Get the default config file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "clipsift")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "clipsift")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the data directory path (history database, subscription state)
    pub fn data_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", "clipsift")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Resolve the history database path from config
    pub fn resolve_history_path(&self) -> PathBuf {
        match self.storage.path.to_lowercase().as_str() {
            "auto" | "" => Self::data_dir().join("history.db"),
            _ => PathBuf::from(&self.storage.path),
        }
    }

    /// Path of the persisted subscription state file
    pub fn subscription_state_path() -> PathBuf {
        Self::data_dir().join("subscription.toml")
    }

    /// Ensure all required directories exist
    pub fn ensure_directories() -> std::io::Result<()> {
        if let Some(config_dir) = Self::config_dir() {
            std::fs::create_dir_all(&config_dir)?;
            tracing::debug!("Ensured config directory exists: {:?}", config_dir);
        }

        let data_dir = Self::data_dir();
        std::fs::create_dir_all(&data_dir)?;
        tracing::debug!("Ensured data directory exists: {:?}", data_dir);

        Ok(())
    }

    /// Timeout for remote provider calls
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.processing.timeout_secs)
    }

    /// Model identifier the current provider would use, for tier gating
    pub fn active_model(&self) -> &str {
        match self.provider.to_lowercase().as_str() {
            "openai" => &self.openai.model,
            "gemini" => &self.gemini.model,
            _ => "mock",
        }
    }
}

/// Load configuration from file, with defaults for missing values
pub fn load_config(path: Option<&Path>) -> Result<Settings, ClipsiftError> {
    // Start with defaults
    let mut settings = Settings::default();

    // Determine config file path
    let config_path = path.map(PathBuf::from).or_else(Settings::default_path);

    // Load from file if it exists
    if let Some(ref path) = config_path {
        if path.exists() {
            tracing::debug!("Loading config from {:?}", path);
            let contents = std::fs::read_to_string(path)
                .map_err(|e| ClipsiftError::Config(format!("Failed to read config: {}", e)))?;

            settings = toml::from_str(&contents)
                .map_err(|e| ClipsiftError::Config(format!("Invalid config: {}", e)))?;
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
        }
    }

    // Override from environment variables
    if let Ok(provider) = std::env::var("CLIPSIFT_PROVIDER") {
        settings.provider = provider;
    }
    if let Ok(key) = std::env::var("CLIPSIFT_OPENAI_API_KEY") {
        settings.openai.api_key = key;
    }
    if let Ok(key) = std::env::var("CLIPSIFT_GEMINI_API_KEY") {
        settings.gemini.api_key = key;
    }

    Ok(settings)
}

/// Save configuration to file
pub fn save_config(settings: &Settings, path: &Path) -> Result<(), ClipsiftError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ClipsiftError::Config(format!("Failed to create config dir: {}", e)))?;
    }

    let contents = toml::to_string_pretty(settings)
        .map_err(|e| ClipsiftError::Config(format!("Failed to serialize config: {}", e)))?;

    std::fs::write(path, contents)
        .map_err(|e| ClipsiftError::Config(format!("Failed to write config: {}", e)))?;

    Ok(())
}
