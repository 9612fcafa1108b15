//! Domain models for the screening system.

mod camp;
mod context;
mod dentition;
mod doctor;
mod patch;
mod screening;

pub use camp::*;
pub use context::*;
pub use dentition::*;
pub use doctor::*;
pub use patch::*;
pub use screening::*;

use thiserror::Error;

/// Errors raised when a record operation would break one of its invariants.
///
/// These are programming errors on the caller's side and are rejected before
/// anything reaches storage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("Unknown section: {0}")]
    UnknownSection(String),

    #[error("Unknown finding category: {0}")]
    UnknownCategory(String),

    #[error("Invalid tooth identifier: {0}")]
    InvalidTooth(String),

    #[error("Unknown treatment option: {0}")]
    UnknownTreatment(String),

    #[error("Invalid patch for {section}: {reason}")]
    InvalidPatch { section: String, reason: String },

    #[error("Record id must not be empty")]
    EmptyId,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

pub type RecordResult<T> = Result<T, RecordError>;
