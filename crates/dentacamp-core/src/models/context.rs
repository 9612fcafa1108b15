//! Explicit screening context: which camp and doctor new records belong to.

use super::camp::Camp;
use super::doctor::Doctor;
use super::screening::today;

/// Header values copied into a new draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderPrefill {
    pub location: String,
    pub date: String,
}

/// The current doctor/camp selection, passed to every scoped operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreeningContext {
    pub camp_id: Option<String>,
    pub doctor_id: Option<String>,
    pub prefill: Option<HeaderPrefill>,
}

impl ScreeningContext {
    pub fn new(camp_id: Option<String>, doctor_id: Option<String>) -> Self {
        Self {
            camp_id,
            doctor_id,
            prefill: None,
        }
    }

    /// Screening inside a camp: header location from the camp, dated today.
    pub fn for_camp(camp: &Camp, doctor: &Doctor) -> Self {
        Self::new(Some(camp.id.clone()), Some(doctor.id.clone()))
            .with_prefill(camp.location.clone(), today())
    }

    pub fn with_prefill(mut self, location: impl Into<String>, date: impl Into<String>) -> Self {
        self.prefill = Some(HeaderPrefill {
            location: location.into(),
            date: date.into(),
        });
        self
    }
}
