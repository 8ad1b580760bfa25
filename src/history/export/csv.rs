//! CSV exporter for the clipboard history
//!
//! Fixed header row; multi-value fields are pipe-joined so they stay a
//! single column; text fields are quoted with internal quotes doubled.

use crate::history::export::{ExportError, ExportFormat, ExportOptions, Exporter, WATERMARK};
use crate::history::ClipboardItem;

/// Column header row, in the order rows are emitted
pub const CSV_HEADER: &str =
    "ID,Timestamp,Date,Status,AI Provider,Topic,Intent,Entities,Categories,Action Items,Original Text";

/// CSV exporter
pub struct CsvExporter;

impl Exporter for CsvExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }

    fn export(
        &self,
        items: &[ClipboardItem],
        options: &ExportOptions,
    ) -> Result<String, ExportError> {
        let mut output = String::new();
        output.push_str(CSV_HEADER);
        output.push('\n');

        for item in items {
            let topic = item
                .processed_data
                .as_ref()
                .map(|d| d.topic.as_str())
                .unwrap_or("");
            let intent = item
                .processed_data
                .as_ref()
                .map(|d| d.intent.as_str())
                .unwrap_or("");
            let entities = item
                .processed_data
                .as_ref()
                .map(|d| d.entities.join("|"))
                .unwrap_or_default();
            let categories = item
                .processed_data
                .as_ref()
                .map(|d| d.categories.join("|"))
                .unwrap_or_default();
            let action_items = item
                .processed_data
                .as_ref()
                .map(|d| d.action_items.join("|"))
                .unwrap_or_default();

            let row = [
                item.id.to_string(),
                item.timestamp.timestamp_millis().to_string(),
                item.timestamp.to_rfc3339(),
                item.status.as_str().to_string(),
                item.ai_provider.clone(),
                escape_csv(topic),
                escape_csv(intent),
                escape_csv(&entities),
                escape_csv(&categories),
                escape_csv(&action_items),
                escape_csv(&item.original_text),
            ];

            output.push_str(&row.join(","));
            output.push('\n');
        }

        if options.watermark {
            output.push_str(&format!("\n\"{}\"\n", WATERMARK));
        }

        Ok(output)
    }
}

/// Quote a text field, doubling internal quotes
fn escape_csv(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::ProcessedData;
    use crate::history::ItemStatus;

    fn processed_item(text: &str) -> ClipboardItem {
        let mut item = ClipboardItem::new(text, "mock");
        item.status = ItemStatus::Processed;
        item.processed_data = Some(ProcessedData {
            topic: "Topic".to_string(),
            entities: vec!["Alice".to_string(), "Bob".to_string()],
            intent: "note".to_string(),
            categories: vec!["Work".to_string(), "Personal".to_string()],
            action_items: vec!["Contact someone".to_string()],
        });
        item
    }

    #[test]
    fn test_header_row_exact() {
        let out = CsvExporter.export(&[], &ExportOptions::default()).unwrap();
        assert_eq!(out.lines().next().unwrap(), CSV_HEADER);
    }

    #[test]
    fn test_multi_value_fields_pipe_joined() {
        let out = CsvExporter
            .export(&[processed_item("text")], &ExportOptions::default())
            .unwrap();
        let row = out.lines().nth(1).unwrap();
        assert!(row.contains("\"Alice|Bob\""));
        assert!(row.contains("\"Work|Personal\""));
        assert!(row.contains("\"Contact someone\""));
    }

    #[test]
    fn test_quotes_and_commas_escaped() {
        let item = ClipboardItem::new("He said \"hi\", then left", "mock");
        let out = CsvExporter
            .export(&[item], &ExportOptions::default())
            .unwrap();
        let row = out.lines().nth(1).unwrap();
        assert!(row.contains("\"He said \"\"hi\"\", then left\""));
    }

    #[test]
    fn test_unprocessed_item_has_empty_analysis_columns() {
        let out = CsvExporter
            .export(&[ClipboardItem::new("raw", "mock")], &ExportOptions::default())
            .unwrap();
        let row = out.lines().nth(1).unwrap();
        // Topic and intent columns are present but empty
        assert!(row.contains(",\"\",\"\","));
        assert!(row.ends_with("\"raw\""));
    }

    #[test]
    fn test_watermark_appended_as_quoted_line() {
        let out = CsvExporter
            .export(&[], &ExportOptions { watermark: true })
            .unwrap();
        assert!(out.ends_with(&format!("\"{}\"\n", WATERMARK)));
    }
}
