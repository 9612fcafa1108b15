//! Keyed entity collections (doctors, camps, screening records).
//!
//! Each collection is one JSON array under a fixed key. Reads never fail:
//! an absent or unparsable payload comes back as an empty collection. Writes
//! replace the whole array immediately.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::{DbResult, KeyValueStore};
use crate::config::{CAMPS_KEY, DOCTORS_KEY, RECORDS_KEY};
use crate::models::{Camp, Doctor, ScreeningRecord};

/// Anything stored in a collection is addressed by its id.
pub trait Identified {
    fn id(&self) -> &str;
}

impl Identified for Doctor {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for Camp {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for ScreeningRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Where new (not replaced) items go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Append,
    Prepend,
}

/// The stored collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKey {
    Doctors,
    Camps,
    Records,
}

impl CollectionKey {
    pub fn storage_key(self) -> &'static str {
        match self {
            CollectionKey::Doctors => DOCTORS_KEY,
            CollectionKey::Camps => CAMPS_KEY,
            CollectionKey::Records => RECORDS_KEY,
        }
    }

    /// Camps and records list newest first; doctors keep creation order.
    pub fn insert_position(self) -> InsertPosition {
        match self {
            CollectionKey::Doctors => InsertPosition::Append,
            CollectionKey::Camps | CollectionKey::Records => InsertPosition::Prepend,
        }
    }
}

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Replaced { index: usize },
}

/// Replace the first item with the same id in place, or insert at `position`.
pub fn upsert_into<T: Identified>(
    items: &mut Vec<T>,
    item: T,
    position: InsertPosition,
) -> UpsertOutcome {
    match items.iter().position(|existing| existing.id() == item.id()) {
        Some(index) => {
            items[index] = item;
            UpsertOutcome::Replaced { index }
        }
        None => {
            match position {
                InsertPosition::Append => items.push(item),
                InsertPosition::Prepend => items.insert(0, item),
            }
            UpsertOutcome::Inserted
        }
    }
}

/// Collection access over any key-value medium.
pub struct EntityStore<'a, S: KeyValueStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: KeyValueStore + ?Sized> EntityStore<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Load a collection; absent or malformed payloads yield an empty one.
    pub fn load<T: DeserializeOwned>(&self, key: CollectionKey) -> Vec<T> {
        self.read_json(key.storage_key()).unwrap_or_default()
    }

    /// Like [`Self::load`], but a failed read of the medium is an error.
    pub fn try_load<T: DeserializeOwned>(&self, key: CollectionKey) -> DbResult<Vec<T>> {
        Ok(self
            .try_read_json(key.storage_key())?
            .unwrap_or_default())
    }

    /// Overwrite a whole collection.
    pub fn save_all<T: Serialize>(&self, key: CollectionKey, items: &[T]) -> DbResult<()> {
        let text = serde_json::to_string(items)?;
        self.store.set(key.storage_key(), &text)
    }

    /// Insert or replace `item` by id and write the collection back.
    ///
    /// Returns the collection as written. If the current collection cannot be
    /// read, nothing is written.
    pub fn upsert<T>(&self, key: CollectionKey, item: T) -> DbResult<Vec<T>>
    where
        T: Serialize + DeserializeOwned + Identified,
    {
        let mut items: Vec<T> = self.try_load(key)?;
        let id = item.id().to_string();
        let outcome = upsert_into(&mut items, item, key.insert_position());
        self.save_all(key, &items)?;
        debug!(
            key = key.storage_key(),
            id = %id,
            outcome = ?outcome,
            size = items.len(),
            "Upserted collection item"
        );
        Ok(items)
    }

    /// First item with the given id.
    pub fn find<T>(&self, key: CollectionKey, id: &str) -> Option<T>
    where
        T: DeserializeOwned + Identified,
    {
        self.load::<T>(key).into_iter().find(|item| item.id() == id)
    }

    /// Read and parse the JSON under `key`. Failures are logged and yield `None`.
    pub(super) fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.try_read_json(key).unwrap_or_else(|e| {
            warn!(key, error = %e, "Failed to read stored value");
            None
        })
    }

    /// Read and parse the JSON under `key`.
    ///
    /// Read errors propagate. An absent key is `Ok(None)`, and so is a
    /// malformed payload, which is logged.
    pub(super) fn try_read_json<T: DeserializeOwned>(&self, key: &str) -> DbResult<Option<T>> {
        let Some(text) = self.store.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&text) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key, error = %e, "Discarding malformed stored value");
                Ok(None)
            }
        }
    }

    pub(super) fn store(&self) -> &'a S {
        self.store
    }
}
