//! Operations offered to the UI layer.
//!
//! [`ScreeningService`] wraps one store. The current doctor/camp selection is
//! always passed in as a [`ScreeningContext`]; the service keeps no selection
//! state of its own.

use thiserror::Error;
use tracing::info;

use crate::db::{CollectionKey, DbError, EntityStore, KeyValueStore};
use crate::models::{Camp, Doctor, RecordError, RecordSummary, ScreeningContext, ScreeningRecord};
use crate::search::filter_for_camp;

/// Errors from service operations.
#[derive(Error, Debug)]
pub enum ScreeningError {
    #[error(transparent)]
    Storage(#[from] DbError),

    #[error(transparent)]
    Invariant(#[from] RecordError),
}

pub type ScreeningResult<T> = Result<T, ScreeningError>;

pub struct ScreeningService<'a, S: KeyValueStore + ?Sized> {
    entities: EntityStore<'a, S>,
}

impl<'a, S: KeyValueStore + ?Sized> ScreeningService<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            entities: EntityStore::new(store),
        }
    }

    // =========================================================================
    // Doctors & Camps
    // =========================================================================

    /// Create a doctor profile and append it to the stored list.
    pub fn create_doctor(
        &self,
        name: String,
        specialty: Option<String>,
        email: Option<String>,
        phone: Option<String>,
    ) -> ScreeningResult<Doctor> {
        if name.trim().is_empty() {
            return Err(RecordError::MissingField("name").into());
        }
        let doctor = Doctor::new(name, specialty, email, phone);
        self.entities
            .upsert(CollectionKey::Doctors, doctor.clone())?;
        info!(doctor_id = %doctor.id, "Created doctor profile");
        Ok(doctor)
    }

    pub fn list_doctors(&self) -> Vec<Doctor> {
        self.entities.load(CollectionKey::Doctors)
    }

    pub fn find_doctor(&self, id: &str) -> Option<Doctor> {
        self.entities.find(CollectionKey::Doctors, id)
    }

    /// Create an active camp run by `doctor_id`, listed first.
    pub fn create_camp(
        &self,
        name: String,
        location: String,
        date: String,
        doctor_id: String,
    ) -> ScreeningResult<Camp> {
        if name.trim().is_empty() {
            return Err(RecordError::MissingField("name").into());
        }
        let camp = Camp::new(name, location, date, doctor_id);
        self.entities.upsert(CollectionKey::Camps, camp.clone())?;
        info!(camp_id = %camp.id, doctor_id = %camp.doctor_id, "Created camp");
        Ok(camp)
    }

    pub fn list_camps(&self) -> Vec<Camp> {
        self.entities.load(CollectionKey::Camps)
    }

    pub fn find_camp(&self, id: &str) -> Option<Camp> {
        self.entities.find(CollectionKey::Camps, id)
    }

    // =========================================================================
    // Screening Records
    // =========================================================================

    /// Start a new, unsaved record for the context.
    pub fn create_draft(&self, context: &ScreeningContext) -> ScreeningRecord {
        ScreeningRecord::new_draft(context)
    }

    /// Persist a record, stamping the context's camp and doctor onto it.
    ///
    /// Only ids the context actually carries are stamped. A context without a
    /// camp or doctor leaves the record's own value in place, so re-saving a
    /// reopened record outside its camp does not detach it.
    ///
    /// Returns the record as stored. On failure nothing is written and the
    /// caller still holds its copy.
    pub fn save(
        &self,
        record: &ScreeningRecord,
        context: &ScreeningContext,
    ) -> ScreeningResult<ScreeningRecord> {
        record.validate_for_save()?;

        let mut stamped = record.clone();
        if context.camp_id.is_some() {
            stamped.camp_id = context.camp_id.clone();
        }
        if context.doctor_id.is_some() {
            stamped.doctor_id = context.doctor_id.clone();
        }

        self.entities
            .upsert(CollectionKey::Records, stamped.clone())?;
        info!(
            record_id = %stamped.id,
            camp_id = stamped.camp_id.as_deref().unwrap_or(""),
            "Saved screening record"
        );
        Ok(stamped)
    }

    /// Reload a stored record for editing.
    pub fn open_record(&self, id: &str) -> Option<ScreeningRecord> {
        self.entities.find(CollectionKey::Records, id)
    }

    pub fn list_records(&self) -> Vec<ScreeningRecord> {
        self.entities.load(CollectionKey::Records)
    }

    /// Records of one camp matching `query`, newest first.
    pub fn list_for_camp(&self, camp_id: &str, query: &str) -> Vec<RecordSummary> {
        filter_for_camp(self.list_records(), camp_id, query)
            .iter()
            .map(ScreeningRecord::summary)
            .collect()
    }

    // =========================================================================
    // Standalone Draft
    // =========================================================================

    pub fn save_current_draft(&self, record: &ScreeningRecord) -> ScreeningResult<()> {
        self.entities.save_current_draft(record)?;
        Ok(())
    }

    pub fn load_current_draft(&self) -> Option<ScreeningRecord> {
        self.entities.load_current_draft()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RECORDS_KEY;
    use crate::db::{Database, FaultyStore, MemoryStore};
    use crate::models::FindingCategory;

    fn date() -> String {
        "2024-04-20".into()
    }

    #[test]
    fn test_create_doctor_requires_name() {
        let store = MemoryStore::new();
        let service = ScreeningService::new(&store);

        let err = service.create_doctor("  ".into(), None, None, None).unwrap_err();
        assert!(matches!(
            err,
            ScreeningError::Invariant(RecordError::MissingField("name"))
        ));
        assert!(service.list_doctors().is_empty());
    }

    #[test]
    fn test_doctors_append_camps_prepend() {
        let store = MemoryStore::new();
        let service = ScreeningService::new(&store);

        let a = service.create_doctor("Dr. A".into(), None, None, None).unwrap();
        let b = service.create_doctor("Dr. B".into(), None, None, None).unwrap();
        let names: Vec<_> = service.list_doctors().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["Dr. A", "Dr. B"]);

        service
            .create_camp("First".into(), "".into(), date(), a.id.clone())
            .unwrap();
        service
            .create_camp("Second".into(), "Hall".into(), date(), b.id.clone())
            .unwrap();
        let camps: Vec<_> = service.list_camps().into_iter().map(|c| c.name).collect();
        assert_eq!(camps, vec!["Second", "First"]);
    }

    #[test]
    fn test_save_stamps_context() {
        let db = Database::open_in_memory().unwrap();
        let service = ScreeningService::new(&db);

        let record = service.create_draft(&ScreeningContext::default());
        let ctx = ScreeningContext::new(Some("camp-1".into()), Some("doc-1".into()));
        let saved = service.save(&record, &ctx).unwrap();

        assert_eq!(saved.id, record.id);
        assert_eq!(saved.camp_id.as_deref(), Some("camp-1"));
        assert_eq!(service.open_record(&record.id), Some(saved));
    }

    #[test]
    fn test_save_without_context_keeps_scope() {
        let store = MemoryStore::new();
        let service = ScreeningService::new(&store);

        let ctx = ScreeningContext::new(Some("camp-1".into()), None);
        let record = service.create_draft(&ctx);
        let saved = service.save(&record, &ScreeningContext::default()).unwrap();
        assert_eq!(saved.camp_id.as_deref(), Some("camp-1"));
    }

    #[test]
    fn test_save_rejects_empty_id() {
        let store = MemoryStore::new();
        let service = ScreeningService::new(&store);

        let mut record = service.create_draft(&ScreeningContext::default());
        record.id = String::new();
        let err = service.save(&record, &ScreeningContext::default()).unwrap_err();

        assert!(matches!(err, ScreeningError::Invariant(RecordError::EmptyId)));
        assert!(service.list_records().is_empty());
    }

    #[test]
    fn test_save_read_error_leaves_records() {
        let store = FaultyStore::default();
        let service = ScreeningService::new(&store);
        let ctx = ScreeningContext::new(Some("camp-1".into()), None);
        for _ in 0..3 {
            service.save(&service.create_draft(&ctx), &ctx).unwrap();
        }
        let before = store.raw(RECORDS_KEY);

        store.fail_reads(true);
        let draft = service.create_draft(&ctx);
        let err = service.save(&draft, &ctx).unwrap_err();
        assert!(matches!(err, ScreeningError::Storage(DbError::Poisoned)));
        assert_eq!(store.raw(RECORDS_KEY), before);

        store.fail_reads(false);
        assert_eq!(service.list_for_camp("camp-1", "").len(), 3);
        service.save(&draft, &ctx).unwrap();
        assert_eq!(service.list_records().len(), 4);
    }

    #[test]
    fn test_save_write_error_keeps_caller_record() {
        let store = FaultyStore::default();
        let service = ScreeningService::new(&store);
        let ctx = ScreeningContext::new(Some("camp-1".into()), None);
        let first = service.save(&service.create_draft(&ctx), &ctx).unwrap();

        store.fail_writes(true);
        let edited = first.toggle_tooth(Some(FindingCategory::Missing), "26".parse().unwrap());
        let err = service.save(&edited, &ctx).unwrap_err();
        assert!(matches!(err, ScreeningError::Storage(_)));
        assert_eq!(service.list_records(), vec![first.clone()]);

        // The caller's copy is untouched and can be saved once the medium recovers.
        store.fail_writes(false);
        assert_eq!(service.save(&edited, &ctx).unwrap(), edited);
        assert_eq!(service.list_records(), vec![edited]);
    }

    #[test]
    fn test_resave_replaces_in_place() {
        let store = MemoryStore::new();
        let service = ScreeningService::new(&store);
        let ctx = ScreeningContext::new(Some("camp-1".into()), None);

        let first = service.save(&service.create_draft(&ctx), &ctx).unwrap();
        let second = service.save(&service.create_draft(&ctx), &ctx).unwrap();

        let edited = first.toggle_tooth(Some(FindingCategory::RootPiece), "36".parse().unwrap());
        service.save(&edited, &ctx).unwrap();

        let records = service.list_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, second.id);
        assert_eq!(records[1], edited);
    }

    #[test]
    fn test_current_draft_round_trip() {
        let store = MemoryStore::new();
        let service = ScreeningService::new(&store);

        assert!(service.load_current_draft().is_none());
        let draft = service.create_draft(&ScreeningContext::default()).load_example();
        service.save_current_draft(&draft).unwrap();
        assert_eq!(service.load_current_draft(), Some(draft));
    }
}
