//! Persistence for the clipboard history
//!
//! The history store works against the [`ItemStore`] capability so the
//! lifecycle logic never touches a database directly. The SQLite
//! implementation is the production backend; the in-memory one backs
//! tests and ephemeral sessions.

use crate::history::{ClipboardItem, ItemId, ItemStatus};
use chrono::{TimeZone, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

/// Storage-related errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Item not found: {0}")]
    NotFound(String),
}

/// Load/save capability for the item collection.
///
/// `save` persists the whole collection; item counts are small (this is a
/// single user's clipboard history) and whole-state writes keep ordering
/// and deletion trivially consistent.
pub trait ItemStore: Send + Sync {
    fn load(&self) -> Result<Vec<ClipboardItem>, StorageError>;
    fn save(&self, items: &[ClipboardItem]) -> Result<(), StorageError>;
}

/// SQLite-backed item store
pub struct SqliteItemStore {
    conn: Mutex<Connection>,
}

impl SqliteItemStore {
    /// Open or create the history database
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;

        Ok(store)
    }

    /// Open an in-process database, useful for tests
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StorageError> {
        self.conn.lock().unwrap().execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                id TEXT PRIMARY KEY,
                original_text TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                ai_provider TEXT NOT NULL DEFAULT '',
                processed_data TEXT,
                error TEXT,
                position INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_items_position ON items(position);
            "#,
        )?;
        Ok(())
    }
}

impl ItemStore for SqliteItemStore {
    fn load(&self) -> Result<Vec<ClipboardItem>, StorageError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT id, original_text, timestamp, status, ai_provider, processed_data, error
            FROM items ORDER BY position ASC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<String>>(6)?,
            ))
        })?;

        let mut items = Vec::new();
        for row in rows {
            let (id, original_text, millis, status, ai_provider, processed_json, error) = row?;

            let id = ItemId::parse(&id)
                .map_err(|e| StorageError::NotFound(format!("bad item id '{}': {}", id, e)))?;

            let processed_data = match processed_json {
                Some(json) => Some(serde_json::from_str(&json)?),
                None => None,
            };

            items.push(ClipboardItem {
                id,
                original_text,
                timestamp: Utc
                    .timestamp_millis_opt(millis)
                    .single()
                    .unwrap_or_else(Utc::now),
                status: ItemStatus::parse(&status).unwrap_or(ItemStatus::Pending),
                processed_data,
                error,
                ai_provider,
            });
        }

        Ok(items)
    }

    fn save(&self, items: &[ClipboardItem]) -> Result<(), StorageError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM items", [])?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO items
                    (id, original_text, timestamp, status, ai_provider, processed_data, error, position)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )?;

            for (position, item) in items.iter().enumerate() {
                let processed_json = item
                    .processed_data
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?;

                stmt.execute(params![
                    item.id.to_string(),
                    item.original_text,
                    item.timestamp.timestamp_millis(),
                    item.status.as_str(),
                    item.ai_provider,
                    processed_json,
                    item.error,
                    position as i64,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }
}

/// In-memory item store
#[derive(Default)]
pub struct MemoryItemStore {
    items: Mutex<Vec<ClipboardItem>>,
}

impl ItemStore for MemoryItemStore {
    fn load(&self) -> Result<Vec<ClipboardItem>, StorageError> {
        Ok(self.items.lock().unwrap().clone())
    }

    fn save(&self, items: &[ClipboardItem]) -> Result<(), StorageError> {
        *self.items.lock().unwrap() = items.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::ProcessedData;

    fn sample_item(text: &str) -> ClipboardItem {
        ClipboardItem::new(text, "mock")
    }

    #[test]
    fn test_sqlite_roundtrip_empty() {
        let store = SqliteItemStore::open_in_memory().unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_sqlite_roundtrip_preserves_order_and_fields() {
        let store = SqliteItemStore::open_in_memory().unwrap();

        let mut first = sample_item("first");
        first.status = ItemStatus::Processed;
        first.processed_data = Some(ProcessedData {
            topic: "first".to_string(),
            entities: vec!["One".to_string()],
            intent: "note".to_string(),
            categories: vec!["Miscellaneous".to_string()],
            action_items: vec!["No action needed".to_string()],
        });

        let mut second = sample_item("second");
        second.status = ItemStatus::Failed;
        second.error = Some("boom".to_string());

        store.save(&[first.clone(), second.clone()]).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, first.id);
        assert_eq!(loaded[0].status, ItemStatus::Processed);
        assert_eq!(
            loaded[0].processed_data.as_ref().unwrap().topic,
            "first"
        );
        assert_eq!(loaded[1].id, second.id);
        assert_eq!(loaded[1].status, ItemStatus::Failed);
        assert_eq!(loaded[1].error.as_deref(), Some("boom"));
        assert_eq!(
            loaded[0].timestamp.timestamp_millis(),
            first.timestamp.timestamp_millis()
        );
    }

    #[test]
    fn test_sqlite_save_replaces_previous_state() {
        let store = SqliteItemStore::open_in_memory().unwrap();

        store.save(&[sample_item("a"), sample_item("b")]).unwrap();
        store.save(&[sample_item("only")]).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].original_text, "only");
    }

    #[test]
    fn test_sqlite_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.db");
        let store = SqliteItemStore::open(&path).unwrap();
        store.save(&[sample_item("x")]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryItemStore::default();
        store.save(&[sample_item("a")]).unwrap();
        assert_eq!(store.load().unwrap().len(), 1);
    }
}
