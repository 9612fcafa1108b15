//! Standalone-mode autosave draft.

use super::{DbResult, EntityStore, KeyValueStore};
use crate::config::CURRENT_DRAFT_KEY;
use crate::models::ScreeningRecord;

impl<'a, S: KeyValueStore + ?Sized> EntityStore<'a, S> {
    /// Overwrite the autosaved draft.
    pub fn save_current_draft(&self, record: &ScreeningRecord) -> DbResult<()> {
        let text = record.to_canonical_json()?;
        self.store().set(CURRENT_DRAFT_KEY, &text)
    }

    /// The autosaved draft, if one exists and parses.
    pub fn load_current_draft(&self) -> Option<ScreeningRecord> {
        self.read_json(CURRENT_DRAFT_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{CollectionKey, Database, MemoryStore};
    use crate::models::{FindingCategory, ScreeningContext};

    #[test]
    fn test_no_draft() {
        let store = MemoryStore::new();
        assert!(EntityStore::new(&store).load_current_draft().is_none());
    }

    #[test]
    fn test_save_and_load_draft() {
        let db = Database::open_in_memory().unwrap();
        let entities = EntityStore::new(&db);

        let draft = ScreeningRecord::new_draft(&ScreeningContext::default())
            .toggle_tooth(Some(FindingCategory::Missing), "21".parse().unwrap());
        entities.save_current_draft(&draft).unwrap();

        assert_eq!(entities.load_current_draft(), Some(draft));
    }

    #[test]
    fn test_draft_does_not_touch_records() {
        let store = MemoryStore::new();
        let entities = EntityStore::new(&store);

        let draft = ScreeningRecord::new_draft(&ScreeningContext::default());
        entities.save_current_draft(&draft).unwrap();

        let records: Vec<ScreeningRecord> = entities.load(CollectionKey::Records);
        assert!(records.is_empty());
    }

    #[test]
    fn test_malformed_draft_is_none() {
        let store = MemoryStore::new();
        store.set(CURRENT_DRAFT_KEY, "{\"header\":").unwrap();
        assert!(EntityStore::new(&store).load_current_draft().is_none());
    }
}
