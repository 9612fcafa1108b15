//! Local persistence for dentacamp.
//!
//! Everything is stored as JSON text under a handful of fixed keys. The
//! [`KeyValueStore`] trait is the only thing the collection layer needs, so
//! SQLite, an in-memory map, or anything else with `get`/`set` can back it.

mod collections;
mod drafts;
mod kv;
mod schema;

pub use collections::*;
pub use schema::*;

use rusqlite::Connection;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    Poisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// Minimal key-value medium: one text value per key.
pub trait KeyValueStore {
    /// Read the value under `key`, `None` if absent.
    fn get(&self, key: &str) -> DbResult<Option<String>>;

    /// Overwrite the value under `key`.
    fn set(&self, key: &str, value: &str) -> DbResult<()>;
}

/// SQLite-backed store.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// In-process store, used for previews and tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> DbResult<Option<String>> {
        let entries = self.entries.lock().map_err(|_| DbError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> DbResult<()> {
        let mut entries = self.entries.lock().map_err(|_| DbError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Test double whose reads or writes can be switched to fail.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct FaultyStore {
    inner: MemoryStore,
    fail_reads: std::cell::Cell<bool>,
    fail_writes: std::cell::Cell<bool>,
}

#[cfg(test)]
impl FaultyStore {
    pub(crate) fn fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    pub(crate) fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// The stored value, bypassing the failure switches.
    pub(crate) fn raw(&self, key: &str) -> Option<String> {
        self.inner.get(key).unwrap()
    }
}

#[cfg(test)]
impl KeyValueStore for FaultyStore {
    fn get(&self, key: &str) -> DbResult<Option<String>> {
        if self.fail_reads.get() {
            return Err(DbError::Poisoned);
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> DbResult<()> {
        if self.fail_writes.get() {
            return Err(DbError::Poisoned);
        }
        self.inner.set(key, value)
    }
}
