//! Screening camps.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_CAMP_LOCATION;

/// Camp status. Nothing moves a camp between states automatically.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CampStatus {
    #[default]
    Active,
    Completed,
}

/// A screening camp run by one doctor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Camp {
    pub id: String,
    /// e.g. "City School Camp 2024"
    pub name: String,
    pub location: String,
    /// As entered; not parsed.
    pub date: String,
    /// Weak reference; the doctor may not exist in the store.
    #[serde(rename = "doctorId")]
    pub doctor_id: String,
    #[serde(default)]
    pub status: CampStatus,
}

impl Camp {
    /// Create a new active camp. A blank location is recorded as "Unknown".
    pub fn new(name: String, location: String, date: String, doctor_id: String) -> Self {
        let location = if location.trim().is_empty() {
            DEFAULT_CAMP_LOCATION.to_string()
        } else {
            location
        };
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            location,
            date,
            doctor_id,
            status: CampStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == CampStatus::Active
    }
}
