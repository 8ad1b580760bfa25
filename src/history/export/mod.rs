//! Export functionality for the clipboard history
//!
//! Provides exporters for the supported output formats. Which formats a
//! user may produce is a subscription question answered by the calling
//! layer before anything here runs; exporters only ever see the
//! already-approved watermark flag.

pub mod csv;
pub mod json;
pub mod txt;

use crate::history::ClipboardItem;
use thiserror::Error;

/// Notice appended to free-tier exports
pub const WATERMARK: &str =
    "Generated with Clipsift Free Version. Upgrade to Premium for more features.";

/// Export format types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Human-readable sections per item
    Txt,
    /// Item array plus export metadata
    Json,
    /// One row per item, fixed header
    Csv,
}

impl ExportFormat {
    /// Parse format from string name
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "txt" | "text" => Some(ExportFormat::Txt),
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }

    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    /// MIME type for share targets
    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "text/plain",
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
        }
    }

    /// Get all supported format names
    pub fn all_names() -> &'static [&'static str] {
        &["txt", "json", "csv"]
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Format not supported: {0}")]
    UnsupportedFormat(String),
}

/// Export options
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Append the free-version watermark
    pub watermark: bool,
}

/// Trait for history exporters
pub trait Exporter: Send + Sync {
    /// Export items to a string
    fn export(&self, items: &[ClipboardItem], options: &ExportOptions)
        -> Result<String, ExportError>;

    /// Get the format
    fn format(&self) -> ExportFormat;
}

/// Export items to a string in the specified format
pub fn export_items(
    items: &[ClipboardItem],
    format: ExportFormat,
    options: &ExportOptions,
) -> Result<String, ExportError> {
    let exporter: Box<dyn Exporter> = match format {
        ExportFormat::Txt => Box::new(txt::TextExporter),
        ExportFormat::Json => Box::new(json::JsonExporter),
        ExportFormat::Csv => Box::new(csv::CsvExporter),
    };

    exporter.export(items, options)
}

/// Export items to a file
pub fn export_items_to_file(
    items: &[ClipboardItem],
    format: ExportFormat,
    options: &ExportOptions,
    path: &std::path::Path,
) -> Result<(), ExportError> {
    let content = export_items(items, format, options)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Default export file name for the given format
pub fn default_file_name(format: ExportFormat) -> String {
    let stamp = chrono::Utc::now()
        .format("%Y-%m-%dT%H-%M-%S")
        .to_string();
    format!("clipboard-export-{}.{}", stamp, format.extension())
}
