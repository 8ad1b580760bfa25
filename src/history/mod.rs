//! Clipboard history: items, lifecycle, persistence, export
//!
//! A captured text becomes a [`ClipboardItem`] that moves through
//! `pending -> processing -> processed | failed`; retry re-enters
//! `processing` from either terminal state. The [`store::HistoryStore`]
//! owns the collection and drives the analysis pipeline.

pub mod export;
pub mod storage;
pub mod store;

use crate::analyze::ProcessedData;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a clipboard item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    /// Generate a new unique item ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ItemId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Lifecycle state of a clipboard item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Captured, not yet analyzed
    Pending,
    /// Analysis in flight
    Processing,
    /// Analysis succeeded
    Processed,
    /// Analysis failed; retry is available
    Failed,
}

impl ItemStatus {
    /// Parse from the lowercase storage representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ItemStatus::Pending),
            "processing" => Some(ItemStatus::Processing),
            "processed" => Some(ItemStatus::Processed),
            "failed" => Some(ItemStatus::Failed),
            _ => None,
        }
    }

    /// Lowercase storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Processing => "processing",
            ItemStatus::Processed => "processed",
            ItemStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One captured clipboard text and its analysis state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipboardItem {
    pub id: ItemId,
    /// The captured text, immutable after capture
    pub original_text: String,
    /// Capture time
    pub timestamp: DateTime<Utc>,
    pub status: ItemStatus,
    /// Analysis result, set when status is processed. A later failed
    /// retry leaves the previous result in place for inspection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_data: Option<ProcessedData>,
    /// Failure message, set when status is failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Provider used for the most recent attempt
    pub ai_provider: String,
}

impl ClipboardItem {
    /// Create a pending item for freshly captured text
    pub fn new(text: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            original_text: text.into(),
            timestamp: Utc::now(),
            status: ItemStatus::Pending,
            processed_data: None,
            error: None,
            ai_provider: provider.into(),
        }
    }
}

/// Aggregate processing statistics, recomputed after every attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    /// Items processed today (local calendar day)
    pub processed_today: usize,
    /// processed / (processed + failed), rounded to the nearest percent;
    /// 100 when nothing has been attempted yet
    pub success_rate: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_roundtrip() {
        let id = ItemId::new();
        let parsed = ItemId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_item_id_parse_rejects_garbage() {
        assert!(ItemId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            ItemStatus::Pending,
            ItemStatus::Processing,
            ItemStatus::Processed,
            ItemStatus::Failed,
        ] {
            assert_eq!(ItemStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ItemStatus::parse("bogus"), None);
    }

    #[test]
    fn test_new_item_is_pending() {
        let item = ClipboardItem::new("hello", "mock");
        assert_eq!(item.status, ItemStatus::Pending);
        assert_eq!(item.original_text, "hello");
        assert_eq!(item.ai_provider, "mock");
        assert!(item.processed_data.is_none());
        assert!(item.error.is_none());
    }
}
