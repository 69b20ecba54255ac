//! Preference persistence: filter and sort descriptors under two fixed keys.
//!
//! `PreferenceStore` is the raw key-value seam. `Preferences` wraps a store
//! with the best-effort contract: failures are logged and swallowed, and a
//! missing or malformed entry reads as "nothing saved".

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::PreferenceError;
use crate::types::{LeadFilters, LeadSort};

pub const FILTERS_KEY: &str = "seller-console-filters";
pub const SORT_KEY: &str = "seller-console-sort";

/// Raw string key-value storage.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError>;
    fn remove(&self, key: &str) -> Result<(), PreferenceError>;
}

// =============================================================================
// In-memory store
// =============================================================================

/// Process-local store. `set_failing(true)` makes every call error, for tests.
#[derive(Default)]
pub struct MemoryPreferenceStore {
    entries: Mutex<HashMap<String, String>>,
    failing: Mutex<bool>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    fn check(&self) -> Result<(), PreferenceError> {
        if *self.failing.lock() {
            return Err(PreferenceError::Unavailable(
                "memory store is failing".to_string(),
            ));
        }
        Ok(())
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        self.check()?;
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.check()?;
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PreferenceError> {
        self.check()?;
        self.entries.lock().remove(key);
        Ok(())
    }
}

// =============================================================================
// JSON file store
// =============================================================================

/// All entries in one JSON object file, rewritten on every change.
pub struct JsonFilePreferenceStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read_all(&self) -> Result<HashMap<String, String>, PreferenceError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Like `read_all`, but a file that no longer parses counts as empty so
    /// the next write replaces it.
    fn read_for_update(&self) -> Result<(HashMap<String, String>, bool), PreferenceError> {
        match self.read_all() {
            Ok(entries) => Ok((entries, false)),
            Err(PreferenceError::Serialize(e)) => {
                log::warn!(
                    "Overwriting unreadable preference file {}: {}",
                    self.path.display(),
                    e
                );
                Ok((HashMap::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    fn write_all(&self, entries: &HashMap<String, String>) -> Result<(), PreferenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl PreferenceStore for JsonFilePreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let _guard = self.lock.lock();
        let (mut entries, _) = self.read_for_update()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), PreferenceError> {
        let _guard = self.lock.lock();
        let (mut entries, corrupt) = self.read_for_update()?;
        if entries.remove(key).is_some() || corrupt {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

// =============================================================================
// SQLite store
// =============================================================================

/// Single-table SQLite store. The connection is serialized behind a mutex
/// because `rusqlite::Connection` is not `Sync`.
pub struct SqlitePreferenceStore {
    conn: Mutex<Connection>,
}

impl SqlitePreferenceStore {
    pub fn open(path: &Path) -> Result<Self, PreferenceError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        Self::from_connection(Connection::open(path)?)
    }

    fn from_connection(conn: Connection) -> Result<Self, PreferenceError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl PreferenceStore for SqlitePreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        let conn = self.conn.lock();
        let value = conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO preferences (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            rusqlite::params![key, value, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PreferenceError> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM preferences WHERE key = ?1", [key])?;
        Ok(())
    }
}

// =============================================================================
// Best-effort typed wrapper
// =============================================================================

/// Typed, best-effort access to the saved filter and sort descriptors.
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn PreferenceStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryPreferenceStore::new()))
    }

    pub fn load_filters(&self) -> Option<LeadFilters> {
        self.load(FILTERS_KEY)
    }

    pub fn load_sort(&self) -> Option<LeadSort> {
        self.load(SORT_KEY)
    }

    pub fn save_filters(&self, filters: &LeadFilters) {
        self.save(FILTERS_KEY, filters);
    }

    pub fn save_sort(&self, sort: &LeadSort) {
        self.save(SORT_KEY, sort);
    }

    /// Remove both entries.
    pub fn clear(&self) {
        for key in [FILTERS_KEY, SORT_KEY] {
            if let Err(e) = self.store.remove(key) {
                log::warn!("Failed to clear stored preference {}: {}", key, e);
            }
        }
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Failed to load {} from preference store: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Ignoring malformed preference {}: {}", key, e);
                None
            }
        }
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(PreferenceError::from)
            .and_then(|raw| self.store.set(key, &raw));
        if let Err(e) = result {
            log::warn!("Failed to save {} to preference store: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SortDirection, SortField, StatusFilter};
    use tempfile::TempDir;

    fn custom_filters() -> LeadFilters {
        LeadFilters {
            search: "acme".to_string(),
            status: StatusFilter::Contacted,
        }
    }

    fn custom_sort() -> LeadSort {
        LeadSort {
            field: SortField::Company,
            direction: SortDirection::Asc,
        }
    }

    #[test]
    fn test_nothing_saved_reads_none() {
        let prefs = Preferences::in_memory();
        assert!(prefs.load_filters().is_none());
        assert!(prefs.load_sort().is_none());
    }

    #[test]
    fn test_malformed_entries_read_none() {
        let store = Arc::new(MemoryPreferenceStore::new());
        store.set(FILTERS_KEY, "{not json").unwrap();
        store
            .set(SORT_KEY, r#"{"field":"email","direction":"desc"}"#)
            .unwrap();

        let prefs = Preferences::new(store);
        assert!(prefs.load_filters().is_none());
        assert!(prefs.load_sort().is_none());
    }

    #[test]
    fn test_saves_json_under_fixed_keys() {
        let store = Arc::new(MemoryPreferenceStore::new());
        let prefs = Preferences::new(store.clone());
        prefs.save_sort(&custom_sort());

        assert_eq!(
            store.get(SORT_KEY).unwrap().as_deref(),
            Some(r#"{"field":"company","direction":"asc"}"#)
        );
    }

    #[test]
    fn test_failing_store_is_swallowed() {
        let store = Arc::new(MemoryPreferenceStore::new());
        let prefs = Preferences::new(store.clone());
        store.set_failing(true);

        prefs.save_filters(&custom_filters());
        prefs.clear();
        assert!(prefs.load_filters().is_none());

        store.set_failing(false);
        assert!(prefs.load_filters().is_none());
    }

    #[test]
    fn test_clear_removes_both_entries() {
        let prefs = Preferences::in_memory();
        prefs.save_filters(&custom_filters());
        prefs.save_sort(&custom_sort());
        prefs.clear();
        assert!(prefs.load_filters().is_none());
        assert!(prefs.load_sort().is_none());
    }

    #[test]
    fn test_json_file_store_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("preferences.json");

        let prefs = Preferences::new(Arc::new(JsonFilePreferenceStore::new(&path)));
        prefs.save_filters(&custom_filters());
        prefs.save_sort(&custom_sort());
        assert!(path.exists());

        let reopened = Preferences::new(Arc::new(JsonFilePreferenceStore::new(&path)));
        assert_eq!(reopened.load_filters(), Some(custom_filters()));
        assert_eq!(reopened.load_sort(), Some(custom_sort()));

        reopened.clear();
        let again = Preferences::new(Arc::new(JsonFilePreferenceStore::new(&path)));
        assert!(again.load_filters().is_none());
    }

    #[test]
    fn test_corrupt_json_file_is_tolerated() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("preferences.json");
        fs::write(&path, "garbage").unwrap();

        let store = JsonFilePreferenceStore::new(&path);
        assert!(store.get(FILTERS_KEY).is_err());

        let prefs = Preferences::new(Arc::new(store));
        assert!(prefs.load_filters().is_none());
    }

    #[test]
    fn test_saving_over_corrupt_json_file_recovers() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("preferences.json");
        let sort = LeadSort {
            field: SortField::Name,
            direction: SortDirection::Asc,
        };

        fs::write(&path, "garbage").unwrap();
        let prefs = Preferences::new(Arc::new(JsonFilePreferenceStore::new(&path)));
        prefs.save_sort(&sort);
        let reopened = Preferences::new(Arc::new(JsonFilePreferenceStore::new(&path)));
        assert_eq!(reopened.load_sort(), Some(sort));

        fs::write(&path, "garbage").unwrap();
        prefs.clear();
        prefs.save_filters(&LeadFilters::default());
        let reopened = Preferences::new(Arc::new(JsonFilePreferenceStore::new(&path)));
        assert_eq!(reopened.load_filters(), Some(LeadFilters::default()));
        assert!(reopened.load_sort().is_none());
    }

    #[test]
    fn test_clear_rewrites_corrupt_json_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("preferences.json");
        fs::write(&path, "garbage").unwrap();

        let store = JsonFilePreferenceStore::new(&path);
        store.remove(SORT_KEY).unwrap();
        assert_eq!(store.get(SORT_KEY).unwrap(), None);
        assert_ne!(fs::read_to_string(&path).unwrap(), "garbage");
    }

    #[test]
    fn test_sqlite_store_upserts() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("preferences.db");

        let store = SqlitePreferenceStore::open(&path).unwrap();
        store.set(SORT_KEY, "a").unwrap();
        store.set(SORT_KEY, "b").unwrap();
        assert_eq!(store.get(SORT_KEY).unwrap().as_deref(), Some("b"));

        store.remove(SORT_KEY).unwrap();
        assert_eq!(store.get(SORT_KEY).unwrap(), None);
        drop(store);

        let prefs = Preferences::new(Arc::new(SqlitePreferenceStore::open(&path).unwrap()));
        prefs.save_filters(&custom_filters());
        let reopened = Preferences::new(Arc::new(SqlitePreferenceStore::open(&path).unwrap()));
        assert_eq!(reopened.load_filters(), Some(custom_filters()));
    }

    #[test]
    fn test_sqlite_store_stamps_writes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("preferences.db");
        let store = SqlitePreferenceStore::open(&path).unwrap();
        store.set(FILTERS_KEY, "{}").unwrap();
        drop(store);

        let conn = Connection::open(&path).unwrap();
        let updated_at: String = conn
            .query_row(
                "SELECT updated_at FROM preferences WHERE key = ?1",
                [FILTERS_KEY],
                |row| row.get(0),
            )
            .unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&updated_at).is_ok());
    }
}
