//! Application-level constants.

/// Product name shown on printed documents and in logs.
pub const APP_NAME: &str = "DentaCamp";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Filter used by `init_logging` when neither `RUST_LOG` nor an explicit filter is given.
pub const DEFAULT_LOG_FILTER: &str = "dentacamp_core=info";

// Storage keys. Values are plain JSON arrays (or a single record for the draft)
// with no envelope or schema version.
pub const DOCTORS_KEY: &str = "dental_doctors";
pub const CAMPS_KEY: &str = "dental_camps";
pub const RECORDS_KEY: &str = "dental_patients";
pub const CURRENT_DRAFT_KEY: &str = "current_screening";

/// Specialty recorded for a doctor profile created without one.
pub const DEFAULT_SPECIALTY: &str = "General Dentist";

/// Location recorded for a camp created without one.
pub const DEFAULT_CAMP_LOCATION: &str = "Unknown";
