//! JSON exporter for the clipboard history

use crate::analyze::ProcessedData;
use crate::history::export::{ExportError, ExportFormat, ExportOptions, Exporter, WATERMARK};
use crate::history::ClipboardItem;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// JSON exporter
pub struct JsonExporter;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportDocument<'a> {
    export_date: DateTime<Utc>,
    items: Vec<ExportedItem<'a>>,
    metadata: ExportMetadata,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportedItem<'a> {
    id: String,
    /// Capture time as epoch milliseconds
    timestamp: i64,
    /// Capture time as an ISO-8601 string
    date: DateTime<Utc>,
    status: &'a str,
    ai_provider: &'a str,
    original_text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    processed_data: Option<&'a ProcessedData>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportMetadata {
    count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    watermark: Option<&'static str>,
}

impl Exporter for JsonExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Json
    }

    fn export(
        &self,
        items: &[ClipboardItem],
        options: &ExportOptions,
    ) -> Result<String, ExportError> {
        let document = ExportDocument {
            export_date: Utc::now(),
            items: items
                .iter()
                .map(|item| ExportedItem {
                    id: item.id.to_string(),
                    timestamp: item.timestamp.timestamp_millis(),
                    date: item.timestamp,
                    status: item.status.as_str(),
                    ai_provider: &item.ai_provider,
                    original_text: &item.original_text,
                    processed_data: item.processed_data.as_ref(),
                })
                .collect(),
            metadata: ExportMetadata {
                count: items.len(),
                watermark: options.watermark.then_some(WATERMARK),
            },
        };

        serde_json::to_string_pretty(&document)
            .map_err(|e| ExportError::Serialization(e.to_string()))
    }
}
