use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Todo, TodoTemplate};
use crate::store::{StoreObserver, StoreSnapshot, TodoStore, default_templates};

/// Name of the blob holding todos and templates
pub const STORAGE_KEY: &str = "todo-canvas-storage";

/// Version written into the persisted envelope
pub const STATE_VERSION: u32 = 0;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create storage directory: {0}")]
    DirectoryError(String),
    #[error("Failed to serialize state: {0}")]
    SerializeError(#[from] serde_json::Error),
}

/// The persisted part of the store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub todos: Vec<Todo>,
    #[serde(default = "default_templates")]
    pub templates: Vec<TodoTemplate>,
}

impl PersistedState {
    pub fn into_store(self) -> TodoStore {
        TodoStore::from_state(self.todos, self.templates)
    }
}

impl From<StoreSnapshot<'_>> for PersistedState {
    fn from(snapshot: StoreSnapshot<'_>) -> Self {
        Self {
            todos: snapshot.todos.to_vec(),
            templates: snapshot.templates.to_vec(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    state: PersistedState,
    #[serde(default)]
    version: u32,
}

/// Key/value store of named text blobs on SQLite
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open (or create) the storage file and initialize the schema
    pub fn new(path: &str) -> Result<Self, StorageError> {
        let db_path = PathBuf::from(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StorageError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        let storage = Storage { conn };
        storage.initialize_schema()?;

        Ok(storage)
    }

    /// In-memory storage, gone when dropped
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let storage = Storage {
            conn: Connection::open_in_memory()?,
        };
        storage.initialize_schema()?;
        Ok(storage)
    }

    fn initialize_schema(&self) -> Result<(), StorageError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key             TEXT PRIMARY KEY,
                value           TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Insert or overwrite a blob
    pub fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Best-effort load of the persisted state.
    /// Absent, unreadable or malformed data yields `None`.
    pub fn load_state(&self) -> Option<PersistedState> {
        let raw = match self.get_item(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("no persisted state found");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "failed to read persisted state");
                return None;
            }
        };

        match serde_json::from_str::<Envelope>(&raw) {
            Ok(envelope) => Some(envelope.state),
            Err(e) => {
                warn!(error = %e, "persisted state is malformed, starting empty");
                None
            }
        }
    }

    pub fn save_state(&self, state: &PersistedState) -> Result<(), StorageError> {
        let envelope = Envelope {
            state: state.clone(),
            version: STATE_VERSION,
        };
        let json = serde_json::to_string(&envelope)?;
        self.set_item(STORAGE_KEY, &json)
    }

    /// Build a store from the persisted state (or a fresh one) wired to save back here
    pub fn into_store(self) -> TodoStore {
        let mut store = match self.load_state() {
            Some(state) => state.into_store(),
            None => TodoStore::new(),
        };
        store.subscribe(PersistHook::new(self));
        store
    }
}

/// Writes the store to storage after every mutation. Errors are logged and dropped.
pub struct PersistHook {
    storage: Storage,
}

impl PersistHook {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }
}

impl StoreObserver for PersistHook {
    fn on_change(&mut self, snapshot: StoreSnapshot<'_>) {
        let state = PersistedState::from(snapshot);
        if let Err(e) = self.storage.save_state(&state) {
            warn!(error = %e, "failed to persist state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, NewTodo, Priority};

    #[test]
    fn items_round_trip_and_overwrite() {
        let storage = Storage::open_in_memory().unwrap();
        assert_eq!(storage.get_item("k").unwrap(), None);

        storage.set_item("k", "one").unwrap();
        storage.set_item("k", "two").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("two"));

        storage.remove_item("k").unwrap();
        assert_eq!(storage.get_item("k").unwrap(), None);
    }

    #[test]
    fn malformed_blob_loads_as_none() {
        let storage = Storage::open_in_memory().unwrap();
        storage.set_item(STORAGE_KEY, "{not json").unwrap();
        assert_eq!(storage.load_state(), None);

        storage
            .set_item(STORAGE_KEY, r#"{"state":{"todos":[{"id":"1"}]}}"#)
            .unwrap();
        assert_eq!(storage.load_state(), None);
    }

    #[test]
    fn parses_browser_style_timestamps() {
        let storage = Storage::open_in_memory().unwrap();
        let blob = r#"{
            "state": {
                "todos": [{
                    "id": "abc",
                    "title": "Call mom",
                    "priority": "high",
                    "category": "personal",
                    "position": {"x": 120.5, "y": 300},
                    "createdAt": "2024-05-01T10:20:30.000Z",
                    "isSelected": false
                }],
                "templates": []
            },
            "version": 0
        }"#;
        storage.set_item(STORAGE_KEY, blob).unwrap();

        let state = storage.load_state().unwrap();
        assert_eq!(state.todos.len(), 1);
        assert_eq!(state.todos[0].title, "Call mom");
        assert_eq!(state.todos[0].created_at.to_rfc3339(), "2024-05-01T10:20:30+00:00");
    }

    #[test]
    fn missing_templates_key_keeps_the_defaults() {
        let storage = Storage::open_in_memory().unwrap();
        storage
            .set_item(STORAGE_KEY, r#"{"state":{"todos":[]},"version":0}"#)
            .unwrap();
        let state = storage.load_state().unwrap();
        assert_eq!(state.templates, default_templates());

        storage
            .set_item(STORAGE_KEY, r#"{"state":{"todos":[],"templates":[]},"version":0}"#)
            .unwrap();
        assert!(storage.load_state().unwrap().templates.is_empty());
    }

    #[test]
    fn hook_persists_every_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canvas.db");
        let path = path.to_str().unwrap();

        let mut store = Storage::new(path).unwrap().into_store();
        let id = store.create_todo(NewTodo::new("Persist me", Priority::Low, Category::Work));
        drop(store);

        let state = Storage::new(path).unwrap().load_state().unwrap();
        assert_eq!(state.todos.len(), 1);
        assert_eq!(state.todos[0].id, id);
        assert_eq!(state.templates.len(), 3);
    }
}
