//! History store: the clipboard item lifecycle
//!
//! Owns the item collection and drives analysis. One item moves through
//! `pending -> processing -> processed | failed`; retry re-enters
//! `processing` from either outcome. Provider failures never escape this
//! boundary: they are captured into the item's `error` field, and only
//! storage failures propagate to the caller.
//!
//! The collection lock is never held across a provider call, so retries
//! of different items can run concurrently. Two concurrent retries of the
//! same item are last-writer-wins; this is a single-user application.

use crate::analyze::{self, Provider};
use crate::config::Settings;
use crate::history::storage::{ItemStore, StorageError};
use crate::history::{ClipboardItem, ItemId, ItemStatus, Stats};
use chrono::{Local, NaiveDate};
use std::sync::Mutex;

/// Clipboard history service, constructed once at startup
pub struct HistoryStore {
    items: Mutex<Vec<ClipboardItem>>,
    stats: Mutex<Stats>,
    store: Box<dyn ItemStore>,
}

impl HistoryStore {
    /// Create a history store, loading persisted items through the
    /// injected capability
    pub fn new(store: Box<dyn ItemStore>) -> Result<Self, StorageError> {
        let items = store.load()?;
        let stats = compute_stats(&items, Local::now().date_naive());
        tracing::debug!("Loaded {} history items", items.len());

        Ok(Self {
            items: Mutex::new(items),
            stats: Mutex::new(stats),
            store,
        })
    }

    /// Capture text as a new pending item at the front of the history
    pub fn add_item(
        &self,
        text: impl Into<String>,
        settings: &Settings,
    ) -> Result<ClipboardItem, StorageError> {
        let provider = Provider::parse(&settings.provider).as_str();
        let item = ClipboardItem::new(text, provider);

        {
            let mut items = self.items.lock().unwrap();
            items.insert(0, item.clone());
            self.store.save(&items)?;
        }

        tracing::debug!("Captured item {} ({} chars)", item.id, item.original_text.len());
        Ok(item)
    }

    /// Run (or re-run) analysis for one item.
    ///
    /// Stamps the item with the *currently* configured provider on entry
    /// to `processing`, so a retry after a provider switch is attributed
    /// to the new provider. On success the error is cleared; on failure
    /// the message is recorded and any previous result is left in place.
    pub fn process_item(
        &self,
        id: ItemId,
        settings: &Settings,
    ) -> Result<ClipboardItem, StorageError> {
        let provider = Provider::parse(&settings.provider).as_str();

        let text = {
            let mut items = self.items.lock().unwrap();
            let item = find_mut(&mut items, id)?;
            item.status = ItemStatus::Processing;
            item.ai_provider = provider.to_string();
            let text = item.original_text.clone();
            self.store.save(&items)?;
            text
        };

        // The provider call runs without the lock held
        let result = analyze::process_text(&text, &settings.prompt.template, settings);

        let updated = {
            let mut items = self.items.lock().unwrap();
            let item = find_mut(&mut items, id)?;

            match result {
                Ok(data) => {
                    item.status = ItemStatus::Processed;
                    item.processed_data = Some(data);
                    item.error = None;
                    tracing::info!("Item {} processed with {}", id, provider);
                }
                Err(e) => {
                    item.status = ItemStatus::Failed;
                    item.error = Some(e.to_string());
                    tracing::warn!("Item {} failed: {}", id, e);
                }
            }

            let updated = item.clone();
            *self.stats.lock().unwrap() = compute_stats(&items, Local::now().date_naive());
            self.store.save(&items)?;
            updated
        };

        Ok(updated)
    }

    /// Retry a previously failed (or re-analyze a processed) item
    pub fn retry_item(
        &self,
        id: ItemId,
        settings: &Settings,
    ) -> Result<ClipboardItem, StorageError> {
        self.process_item(id, settings)
    }

    /// Remove one item from the history
    pub fn remove_item(&self, id: ItemId) -> Result<(), StorageError> {
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|item| item.id != id);

        if items.len() == before {
            return Err(StorageError::NotFound(id.to_string()));
        }

        self.store.save(&items)?;
        *self.stats.lock().unwrap() = compute_stats(&items, Local::now().date_naive());
        Ok(())
    }

    /// Remove all items
    pub fn clear(&self) -> Result<(), StorageError> {
        let mut items = self.items.lock().unwrap();
        items.clear();
        self.store.save(&items)?;
        *self.stats.lock().unwrap() = Stats::default();
        Ok(())
    }

    /// Look up one item by id
    pub fn get(&self, id: ItemId) -> Option<ClipboardItem> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .find(|item| item.id == id)
            .cloned()
    }

    /// Snapshot of all items, newest first
    pub fn items(&self) -> Vec<ClipboardItem> {
        self.items.lock().unwrap().clone()
    }

    /// Current aggregate statistics
    pub fn stats(&self) -> Stats {
        *self.stats.lock().unwrap()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().unwrap().is_empty()
    }
}

fn find_mut(items: &mut [ClipboardItem], id: ItemId) -> Result<&mut ClipboardItem, StorageError> {
    items
        .iter_mut()
        .find(|item| item.id == id)
        .ok_or_else(|| StorageError::NotFound(id.to_string()))
}

/// Recompute aggregate statistics over the collection.
///
/// `processed_today` counts processed items captured on the given local
/// calendar day; `success_rate` is processed over attempted, rounded to
/// the nearest percent, defaulting to 100 before any attempt.
pub fn compute_stats(items: &[ClipboardItem], today: NaiveDate) -> Stats {
    let processed_today = items
        .iter()
        .filter(|item| {
            item.status == ItemStatus::Processed
                && item.timestamp.with_timezone(&Local).date_naive() == today
        })
        .count();

    let attempted = items
        .iter()
        .filter(|item| matches!(item.status, ItemStatus::Processed | ItemStatus::Failed))
        .count();
    let succeeded = items
        .iter()
        .filter(|item| item.status == ItemStatus::Processed)
        .count();

    let success_rate = if attempted > 0 {
        ((succeeded as f64 / attempted as f64) * 100.0).round() as u8
    } else {
        100
    };

    Stats {
        processed_today,
        success_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::storage::MemoryItemStore;

    fn test_settings() -> Settings {
        let mut settings = Settings::default();
        settings.mock.delay_ms = 0;
        settings.mock.failure_rate = 0.0;
        settings
    }

    fn failing_settings() -> Settings {
        let mut settings = test_settings();
        settings.mock.failure_rate = 1.0;
        settings
    }

    fn store() -> HistoryStore {
        HistoryStore::new(Box::<MemoryItemStore>::default()).unwrap()
    }

    #[test]
    fn test_add_item_is_pending_and_front() {
        let store = store();
        let settings = test_settings();

        let first = store.add_item("first", &settings).unwrap();
        let second = store.add_item("second", &settings).unwrap();

        let items = store.items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, second.id);
        assert_eq!(items[1].id, first.id);
        assert_eq!(items[0].status, ItemStatus::Pending);
        assert_eq!(items[0].ai_provider, "mock");
    }

    #[test]
    fn test_process_success_sets_data_and_clears_error() {
        let store = store();
        let settings = test_settings();

        let item = store.add_item("Buy milk and eggs", &settings).unwrap();
        let processed = store.process_item(item.id, &settings).unwrap();

        assert_eq!(processed.status, ItemStatus::Processed);
        assert!(processed.error.is_none());
        let data = processed.processed_data.unwrap();
        assert_eq!(data.intent, "shopping");
    }

    #[test]
    fn test_process_failure_records_error_message() {
        let store = store();
        let item = store.add_item("whatever", &test_settings()).unwrap();

        let failed = store.process_item(item.id, &failing_settings()).unwrap();
        assert_eq!(failed.status, ItemStatus::Failed);
        assert_eq!(
            failed.error.as_deref(),
            Some("AI processing failed. Please try again.")
        );
        assert!(failed.processed_data.is_none());
    }

    #[test]
    fn test_retry_after_failure_transitions_to_processed() {
        let store = store();
        let item = store.add_item("note to self", &test_settings()).unwrap();

        let failed = store.process_item(item.id, &failing_settings()).unwrap();
        assert_eq!(failed.status, ItemStatus::Failed);

        let retried = store.retry_item(item.id, &test_settings()).unwrap();
        assert_eq!(retried.status, ItemStatus::Processed);
        assert!(retried.error.is_none());
        assert!(retried.processed_data.is_some());
    }

    #[test]
    fn test_retry_restamps_provider_from_current_settings() {
        let store = store();
        let item = store.add_item("hello", &test_settings()).unwrap();
        assert_eq!(item.ai_provider, "mock");

        // Switch the configured provider before retrying; the attempt is
        // attributed to the new provider even though it fails (no key)
        let mut openai = test_settings();
        openai.provider = "openai".to_string();

        let failed = store.retry_item(item.id, &openai).unwrap();
        assert_eq!(failed.ai_provider, "openai");
        assert_eq!(failed.status, ItemStatus::Failed);
        assert!(failed.error.unwrap().contains("API key"));
    }

    #[test]
    fn test_failed_retry_preserves_previous_result() {
        let store = store();
        let item = store.add_item("Buy milk", &test_settings()).unwrap();

        let processed = store.process_item(item.id, &test_settings()).unwrap();
        let previous = processed.processed_data.clone().unwrap();

        let failed = store.retry_item(item.id, &failing_settings()).unwrap();
        assert_eq!(failed.status, ItemStatus::Failed);
        assert!(failed.error.is_some());
        // The last good result stays inspectable
        assert_eq!(failed.processed_data, Some(previous));
    }

    #[test]
    fn test_process_unknown_id_is_not_found() {
        let store = store();
        let result = store.process_item(ItemId::new(), &test_settings());
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_remove_and_clear() {
        let store = store();
        let settings = test_settings();
        let a = store.add_item("a", &settings).unwrap();
        store.add_item("b", &settings).unwrap();

        store.remove_item(a.id).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get(a.id).is_none());
        assert!(matches!(
            store.remove_item(a.id),
            Err(StorageError::NotFound(_))
        ));

        store.clear().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_stats_success_rate() {
        let store = store();
        let settings = test_settings();

        // No attempts yet: success rate defaults to 100
        assert_eq!(store.stats().success_rate, 100);

        let a = store.add_item("one", &settings).unwrap();
        let b = store.add_item("two", &settings).unwrap();

        store.process_item(a.id, &settings).unwrap();
        assert_eq!(store.stats().success_rate, 100);
        assert_eq!(store.stats().processed_today, 1);

        store.process_item(b.id, &failing_settings()).unwrap();
        assert_eq!(store.stats().success_rate, 50);
        assert_eq!(store.stats().processed_today, 1);
    }

    #[test]
    fn test_compute_stats_rounding() {
        let mut items = vec![
            ClipboardItem::new("a", "mock"),
            ClipboardItem::new("b", "mock"),
            ClipboardItem::new("c", "mock"),
        ];
        items[0].status = ItemStatus::Processed;
        items[1].status = ItemStatus::Processed;
        items[2].status = ItemStatus::Failed;

        let today = Local::now().date_naive();
        let stats = compute_stats(&items, today);
        // 2/3 rounds to 67
        assert_eq!(stats.success_rate, 67);
        assert_eq!(stats.processed_today, 2);
    }

    #[test]
    fn test_compute_stats_ignores_other_days() {
        let mut item = ClipboardItem::new("old", "mock");
        item.status = ItemStatus::Processed;
        item.timestamp = item.timestamp - chrono::Duration::days(2);

        let stats = compute_stats(&[item], Local::now().date_naive());
        assert_eq!(stats.processed_today, 0);
        // Still counts toward the success rate
        assert_eq!(stats.success_rate, 100);
    }

    #[test]
    fn test_state_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");
        let settings = test_settings();

        let id = {
            let store = HistoryStore::new(Box::new(
                crate::history::storage::SqliteItemStore::open(&path).unwrap(),
            ))
            .unwrap();
            let item = store.add_item("persisted", &settings).unwrap();
            store.process_item(item.id, &settings).unwrap();
            item.id
        };

        let store = HistoryStore::new(Box::new(
            crate::history::storage::SqliteItemStore::open(&path).unwrap(),
        ))
        .unwrap();
        let item = store.get(id).unwrap();
        assert_eq!(item.status, ItemStatus::Processed);
        assert!(item.processed_data.is_some());
    }
}
