//! Durable storage port for the favorites collection.
//!
//! The store reads and writes one serialized document under a fixed key.
//! Adapters only move strings; (de)serialization stays in the store so a
//! corrupted document can be exercised with any backend.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

/// Key the favorites document is stored under.
pub const FAVORITES_STORE_KEY: &str = "favorites-storage";

/// Errors raised by storage adapters.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Side-effecting port the favorites store persists through.
pub trait FavoritesStorage: Send {
    /// Read the stored document. `Ok(None)` means nothing was stored yet.
    fn load(&self) -> Result<Option<String>, StorageError>;

    /// Overwrite the stored document.
    fn save(&self, document: &str) -> Result<(), StorageError>;
}

impl<S: FavoritesStorage + ?Sized> FavoritesStorage for Box<S> {
    fn load(&self) -> Result<Option<String>, StorageError> {
        (**self).load()
    }

    fn save(&self, document: &str) -> Result<(), StorageError> {
        (**self).save(document)
    }
}

/// In-process storage. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage pre-filled with a document.
    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(document.into()))),
        }
    }

    /// Current raw document, if any.
    pub fn document(&self) -> Option<String> {
        self.slot.lock().clone()
    }
}

impl FavoritesStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.slot.lock().clone())
    }

    fn save(&self, document: &str) -> Result<(), StorageError> {
        *self.slot.lock() = Some(document.to_string());
        Ok(())
    }
}

/// One JSON file per store key inside a data directory.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Storage at `<dir>/<key>.json`.
    pub fn new(dir: &Path, key: &str) -> Self {
        Self {
            path: dir.join(format!("{}.json", key)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FavoritesStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, document: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write beside the target, then rename over it
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, document)?;
        fs::rename(&tmp, &self.path)?;

        tracing::debug!("Saved favorites to {:?}", self.path);
        Ok(())
    }
}

/// Key/value table in a SQLite database.
pub struct SqliteKvStorage {
    conn: Mutex<Connection>,
    key: String,
}

impl SqliteKvStorage {
    /// Open or create the database and bind this storage to `key`.
    pub fn open(path: &Path, key: &str) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn, key)
    }

    /// Create an in-memory database (for testing).
    #[cfg(test)]
    pub fn in_memory(key: &str) -> anyhow::Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, key)
    }

    fn with_connection(conn: Connection, key: &str) -> anyhow::Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            key: key.to_string(),
        })
    }
}

impl FavoritesStorage for SqliteKvStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .lock()
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![self.key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn save(&self, document: &str) -> Result<(), StorageError> {
        self.conn.lock().execute(
            "INSERT OR REPLACE INTO kv_store (key, value) VALUES (?1, ?2)",
            params![self.key, document],
        )?;
        Ok(())
    }
}
