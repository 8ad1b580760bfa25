//! Plain text exporter for the clipboard history

use crate::history::export::{ExportError, ExportFormat, ExportOptions, Exporter, WATERMARK};
use crate::history::ClipboardItem;
use chrono::Local;

/// Plain text exporter
pub struct TextExporter;

impl Exporter for TextExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Txt
    }

    fn export(
        &self,
        items: &[ClipboardItem],
        options: &ExportOptions,
    ) -> Result<String, ExportError> {
        let mut output = String::new();

        output.push_str("# Clipsift Export\n");
        output.push_str(&format!(
            "# Generated on {}\n\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));

        for (index, item) in items.iter().enumerate() {
            output.push_str(&format!("## Item {}\n", index + 1));
            output.push_str(&format!(
                "Date: {}\n",
                item.timestamp
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S")
            ));
            output.push_str(&format!("Status: {}\n", item.status));
            output.push_str(&format!("AI Provider: {}\n\n", item.ai_provider));

            output.push_str(&format!("Original Text:\n{}\n\n", item.original_text));

            if let Some(ref data) = item.processed_data {
                output.push_str(&format!("Topic: {}\n", data.topic));
                output.push_str(&format!("Intent: {}\n", data.intent));

                if !data.entities.is_empty() {
                    output.push_str(&format!("Entities: {}\n", data.entities.join(", ")));
                }

                if !data.categories.is_empty() {
                    output.push_str(&format!("Categories: {}\n", data.categories.join(", ")));
                }

                if !data.action_items.is_empty() {
                    output.push_str("Action Items:\n");
                    for action in &data.action_items {
                        output.push_str(&format!("- {}\n", action));
                    }
                }
            }

            output.push_str("\n---\n\n");
        }

        if options.watermark {
            output.push_str(&format!("\n{}\n", WATERMARK));
        }

        Ok(output)
    }
}
