//! DentaCamp Core Library
//!
//! Local-first screening records for dental outreach camps.
//!
//! # Architecture
//!
//! ```text
//!   Doctor ──► Camp ──► New screening (draft, in memory)
//!                              │
//!                   section patches / tooth toggles
//!                              │
//!                        explicit save
//!                              │
//!             ┌────────────────▼────────────────┐
//!             │   Key-value store (SQLite)      │
//!             │   dental_doctors / dental_camps │
//!             │   dental_patients               │
//!             └────────────────┬────────────────┘
//!                              │
//!              ┌───────────────┼───────────────┐
//!              ▼                               ▼
//!      Camp list + search               Print document
//! ```
//!
//! # Consistency
//!
//! Single writer, last write wins. Every save rewrites the whole collection and
//! nothing is synced to a server: `synced` is only ever cleared.
//!
//! # Modules
//!
//! - [`db`]: key-value persistence and entity collections
//! - [`models`]: domain types (Doctor, Camp, ScreeningRecord, tooth findings)
//! - [`search`]: camp scoping and free-text search
//! - [`service`]: operations for the UI layer
//! - [`export`]: printable document projection

pub mod config;
pub mod db;
pub mod export;
pub mod models;
pub mod search;
pub mod service;

// Re-export commonly used types
pub use db::{Database, EntityStore, KeyValueStore, MemoryStore};
pub use export::{project, project_at, PrintDocument};
pub use models::{
    Camp, Dentition, Doctor, FindingCategory, FindingSets, RecordSummary, ScreeningContext,
    ScreeningRecord, SectionPatch, ToothId,
};
pub use service::{ScreeningError, ScreeningService};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use models::{AdvisedTreatment, CompletedTreatment};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum DentaCampError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for DentaCampError {
    fn from(e: db::DbError) -> Self {
        DentaCampError::DatabaseError(e.to_string())
    }
}

impl From<models::RecordError> for DentaCampError {
    fn from(e: models::RecordError) -> Self {
        DentaCampError::InvalidInput(e.to_string())
    }
}

impl From<ScreeningError> for DentaCampError {
    fn from(e: ScreeningError) -> Self {
        match e {
            ScreeningError::Storage(e) => e.into(),
            ScreeningError::Invariant(e) => e.into(),
        }
    }
}

impl From<serde_json::Error> for DentaCampError {
    fn from(e: serde_json::Error) -> Self {
        DentaCampError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for DentaCampError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        DentaCampError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Install a log subscriber. `RUST_LOG` wins over `filter`; later calls do nothing.
#[uniffi::export]
pub fn init_logging(filter: Option<String>) {
    let fallback = filter.unwrap_or_else(|| config::DEFAULT_LOG_FILTER.to_string());
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    if tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .is_ok()
    {
        tracing::info!("{} core v{} starting", config::APP_NAME, config::APP_VERSION);
    }
}

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<DentaCampCore>, DentaCampError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(DentaCampCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<DentaCampCore>, DentaCampError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(DentaCampCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

// =========================================================================
// Record Editing (stateless, records as JSON)
// =========================================================================

/// Apply a JSON patch to one section of a record.
#[uniffi::export]
pub fn patch_section(
    record_json: String,
    section: String,
    patch_json: String,
) -> Result<String, DentaCampError> {
    let record = parse_record(&record_json)?;
    let patched = record.patch_json(&section, &patch_json)?;
    Ok(patched.to_canonical_json()?)
}

/// Toggle a tooth in a finding category. A missing or unknown category changes nothing.
///
/// `mixed` selects the chart in use; primary teeth are rejected on a permanent chart.
#[uniffi::export]
pub fn toggle_tooth(
    record_json: String,
    category: Option<String>,
    tooth: String,
    mixed: bool,
) -> Result<String, DentaCampError> {
    let record = parse_record(&record_json)?;
    let tooth: ToothId = tooth.parse()?;
    let category = category.as_deref().and_then(FindingCategory::from_key);
    let toggled = record.toggle_chart_tooth(chart(mixed), category, tooth)?;
    Ok(toggled.to_canonical_json()?)
}

/// Toggle an advised treatment by its label.
#[uniffi::export]
pub fn toggle_advised(record_json: String, option: String) -> Result<String, DentaCampError> {
    let record = parse_record(&record_json)?;
    let option: AdvisedTreatment = option.parse()?;
    Ok(record.toggle_advised(option).to_canonical_json()?)
}

/// Toggle a completed treatment by its label.
#[uniffi::export]
pub fn toggle_done(record_json: String, option: String) -> Result<String, DentaCampError> {
    let record = parse_record(&record_json)?;
    let option: CompletedTreatment = option.parse()?;
    Ok(record.toggle_done(option).to_canonical_json()?)
}

/// Fresh record with a new id, keeping header and camp scope.
#[uniffi::export]
pub fn reset_draft(record_json: String) -> Result<String, DentaCampError> {
    let record = parse_record(&record_json)?;
    Ok(record.reset_draft().to_canonical_json()?)
}

/// Demonstration data, keeping the record's id.
#[uniffi::export]
pub fn load_example(record_json: String) -> Result<String, DentaCampError> {
    let record = parse_record(&record_json)?;
    Ok(record.load_example().to_canonical_json()?)
}

/// Print layout as JSON.
#[uniffi::export]
pub fn render_document_json(record_json: String) -> Result<String, DentaCampError> {
    let record = parse_record(&record_json)?;
    Ok(project(&record)?.to_json()?)
}

/// Print layout as plain text.
#[uniffi::export]
pub fn render_document_text(record_json: String) -> Result<String, DentaCampError> {
    let record = parse_record(&record_json)?;
    Ok(project(&record)?.to_text())
}

/// Chart teeth in display order.
#[uniffi::export]
pub fn dentition_teeth(mixed: bool) -> Vec<String> {
    chart(mixed).teeth().into_iter().map(String::from).collect()
}

/// Finding categories in display order.
#[uniffi::export]
pub fn finding_categories() -> Vec<FfiCategory> {
    FindingCategory::ALL
        .into_iter()
        .map(|c| FfiCategory {
            key: c.key().to_string(),
            label: c.label().to_string(),
        })
        .collect()
}

fn chart(mixed: bool) -> Dentition {
    if mixed {
        Dentition::Mixed
    } else {
        Dentition::Permanent
    }
}

fn parse_record(json: &str) -> Result<ScreeningRecord, DentaCampError> {
    Ok(serde_json::from_str(json)?)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct DentaCampCore {
    db: Arc<Mutex<Database>>,
}

#[uniffi::export]
impl DentaCampCore {
    // =========================================================================
    // Doctor & Camp Operations
    // =========================================================================

    /// Create a doctor profile.
    pub fn create_doctor(
        &self,
        name: String,
        specialty: Option<String>,
        email: Option<String>,
        phone: Option<String>,
    ) -> Result<FfiDoctor, DentaCampError> {
        let db = self.db.lock()?;
        let doctor = ScreeningService::new(&*db).create_doctor(name, specialty, email, phone)?;
        Ok(doctor.into())
    }

    pub fn list_doctors(&self) -> Result<Vec<FfiDoctor>, DentaCampError> {
        let db = self.db.lock()?;
        let doctors = ScreeningService::new(&*db).list_doctors();
        Ok(doctors.into_iter().map(|d| d.into()).collect())
    }

    /// Create a camp. `date` is `YYYY-MM-DD`.
    pub fn create_camp(
        &self,
        name: String,
        location: String,
        date: String,
        doctor_id: String,
    ) -> Result<FfiCamp, DentaCampError> {
        let db = self.db.lock()?;
        let camp = ScreeningService::new(&*db).create_camp(name, location, date, doctor_id)?;
        Ok(camp.into())
    }

    pub fn list_camps(&self) -> Result<Vec<FfiCamp>, DentaCampError> {
        let db = self.db.lock()?;
        let camps = ScreeningService::new(&*db).list_camps();
        Ok(camps.into_iter().map(|c| c.into()).collect())
    }

    // =========================================================================
    // Screening Operations
    // =========================================================================

    /// New draft record as JSON. Inside a known camp the header is prefilled.
    pub fn create_draft(
        &self,
        camp_id: Option<String>,
        doctor_id: Option<String>,
    ) -> Result<String, DentaCampError> {
        let db = self.db.lock()?;
        let service = ScreeningService::new(&*db);
        let context = self.context(&service, camp_id, doctor_id);
        Ok(service.create_draft(&context).to_canonical_json()?)
    }

    /// Save a record under the given camp/doctor; returns the stored JSON.
    pub fn save_record(
        &self,
        record_json: String,
        camp_id: Option<String>,
        doctor_id: Option<String>,
    ) -> Result<String, DentaCampError> {
        let record = parse_record(&record_json)?;
        let db = self.db.lock()?;
        let context = ScreeningContext::new(camp_id, doctor_id);
        let saved = ScreeningService::new(&*db).save(&record, &context)?;
        Ok(saved.to_canonical_json()?)
    }

    /// Load a stored record for editing.
    pub fn open_record(&self, record_id: String) -> Result<String, DentaCampError> {
        let db = self.db.lock()?;
        let record = ScreeningService::new(&*db)
            .open_record(&record_id)
            .ok_or(DentaCampError::NotFound(record_id))?;
        Ok(record.to_canonical_json()?)
    }

    /// Records of a camp matching `query`, newest first.
    pub fn list_for_camp(
        &self,
        camp_id: String,
        query: String,
    ) -> Result<Vec<FfiRecordSummary>, DentaCampError> {
        let db = self.db.lock()?;
        let summaries = ScreeningService::new(&*db).list_for_camp(&camp_id, &query);
        Ok(summaries.into_iter().map(|s| s.into()).collect())
    }

    // =========================================================================
    // Standalone Draft
    // =========================================================================

    pub fn save_current_draft(&self, record_json: String) -> Result<(), DentaCampError> {
        let record = parse_record(&record_json)?;
        let db = self.db.lock()?;
        ScreeningService::new(&*db).save_current_draft(&record)?;
        Ok(())
    }

    pub fn load_current_draft(&self) -> Result<Option<String>, DentaCampError> {
        let db = self.db.lock()?;
        let draft = ScreeningService::new(&*db).load_current_draft();
        Ok(draft.map(|d| d.to_canonical_json()).transpose()?)
    }
}

impl DentaCampCore {
    fn context(
        &self,
        service: &ScreeningService<'_, Database>,
        camp_id: Option<String>,
        doctor_id: Option<String>,
    ) -> ScreeningContext {
        let camp = camp_id.as_deref().and_then(|id| service.find_camp(id));
        let context = ScreeningContext::new(camp_id, doctor_id);
        match camp {
            Some(camp) => context.with_prefill(camp.location, models::today()),
            None => context,
        }
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe doctor profile.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoctor {
    pub id: String,
    pub name: String,
    pub specialty: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl From<Doctor> for FfiDoctor {
    fn from(doctor: Doctor) -> Self {
        Self {
            id: doctor.id,
            name: doctor.name,
            specialty: doctor.specialty,
            email: doctor.email,
            phone: doctor.phone,
        }
    }
}

/// FFI-safe camp.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCamp {
    pub id: String,
    pub name: String,
    pub location: String,
    pub date: String,
    pub doctor_id: String,
    pub active: bool,
}

impl From<Camp> for FfiCamp {
    fn from(camp: Camp) -> Self {
        Self {
            active: camp.is_active(),
            id: camp.id,
            name: camp.name,
            location: camp.location,
            date: camp.date,
            doctor_id: camp.doctor_id,
        }
    }
}

/// FFI-safe record list entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRecordSummary {
    pub id: String,
    pub name: String,
    pub age: String,
    pub gender: String,
    pub date: String,
    pub location: String,
    pub synced: bool,
}

impl From<RecordSummary> for FfiRecordSummary {
    fn from(summary: RecordSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.demographics.name,
            age: summary.demographics.age,
            gender: summary.demographics.gender.as_str().to_string(),
            date: summary.header.date,
            location: summary.header.location,
            synced: summary.synced,
        }
    }
}

/// FFI-safe finding category.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCategory {
    pub key: String,
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ffi_scenario() {
        let core = open_database_in_memory().unwrap();
        let doctor = core.create_doctor("Dr. A".into(), None, None, None).unwrap();
        let camp = core
            .create_camp("Camp1".into(), "School".into(), "2024-03-01".into(), doctor.id.clone())
            .unwrap();

        let draft = core
            .create_draft(Some(camp.id.clone()), Some(doctor.id.clone()))
            .unwrap();
        let marked = toggle_tooth(draft, Some("caries_dentinal".into()), "46".into(), true).unwrap();
        core.save_record(marked, Some(camp.id.clone()), Some(doctor.id.clone()))
            .unwrap();

        let listed = core.list_for_camp(camp.id.clone(), String::new()).unwrap();
        assert_eq!(listed.len(), 1);

        let stored: ScreeningRecord =
            serde_json::from_str(&core.open_record(listed[0].id.clone()).unwrap()).unwrap();
        assert_eq!(stored.dental.findings.caries_dentinal.len(), 1);
        assert_eq!(stored.header.location, "School");
    }

    #[test]
    fn test_ffi_rejects_bad_input() {
        let core = open_database_in_memory().unwrap();
        assert!(matches!(
            core.create_camp(" ".into(), "".into(), "2024-03-01".into(), "d".into()),
            Err(DentaCampError::InvalidInput(_))
        ));
        assert!(matches!(
            core.open_record("missing".into()),
            Err(DentaCampError::NotFound(_))
        ));

        let draft = core.create_draft(None, None).unwrap();
        assert!(matches!(
            patch_section(draft.clone(), "billing".into(), "{}".into()),
            Err(DentaCampError::InvalidInput(_))
        ));
        assert!(matches!(
            toggle_tooth(draft.clone(), None, "99".into(), true),
            Err(DentaCampError::InvalidInput(_))
        ));
        assert!(matches!(
            toggle_tooth(draft, Some("missing".into()), "51".into(), false),
            Err(DentaCampError::InvalidInput(_))
        ));
        assert!(matches!(
            reset_draft("{".into()),
            Err(DentaCampError::SerializationError(_))
        ));
    }

    #[test]
    fn test_ffi_unknown_category_is_noop() {
        let draft = open_database_in_memory()
            .unwrap()
            .create_draft(None, None)
            .unwrap();
        let same = toggle_tooth(draft.clone(), Some("plaque".into()), "11".into(), true).unwrap();
        let before: ScreeningRecord = serde_json::from_str(&draft).unwrap();
        let after: ScreeningRecord = serde_json::from_str(&same).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_dentition_teeth() {
        assert_eq!(dentition_teeth(false).len(), 32);
        assert_eq!(dentition_teeth(true).len(), 52);
        assert_eq!(finding_categories().len(), 7);
    }

    #[test]
    fn test_render_document() {
        let draft = open_database_in_memory()
            .unwrap()
            .create_draft(None, None)
            .unwrap();
        let example = load_example(draft).unwrap();
        let text = render_document_text(example.clone()).unwrap();
        assert!(text.contains("Patient Name: ABC"));
        assert!(render_document_json(example).unwrap().contains("Official Screening Record"));
    }
}
