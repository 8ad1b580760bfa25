//! Error types for clipsift
//!
//! Uses thiserror for ergonomic error definitions with clear messages
//! that guide users toward fixing common issues.

use thiserror::Error;

/// Top-level error type for the clipsift application
#[derive(Error, Debug)]
pub enum ClipsiftError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Analysis error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::history::storage::StorageError),

    #[error("Subscription error: {0}")]
    Subscription(#[from] crate::subscription::SubscriptionError),

    #[error("Export error: {0}")]
    Export(#[from] crate::history::export::ExportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by analysis providers
///
/// Parse problems inside response normalization are deliberately absent:
/// normalization always degrades to a usable fallback record instead of
/// surfacing an error.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{provider} API key is not configured. Add it in settings.")]
    MissingCredential { provider: &'static str },

    #[error("{provider} request failed: {message}")]
    RemoteRejected {
        provider: &'static str,
        message: String,
    },

    #[error("No content returned from {provider}")]
    EmptyResponse { provider: &'static str },

    #[error("AI processing failed. Please try again.")]
    InjectedFailure,
}

/// Result type alias using ClipsiftError
pub type Result<T> = std::result::Result<T, ClipsiftError>;
