//! Doctor profiles.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_SPECIALTY;

/// A doctor profile. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Doctor {
    /// Create a new profile. A blank specialty falls back to the default one.
    pub fn new(
        name: String,
        specialty: Option<String>,
        email: Option<String>,
        phone: Option<String>,
    ) -> Self {
        let specialty = specialty
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SPECIALTY.to_string());
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            specialty: Some(specialty),
            email: non_blank(email),
            phone: non_blank(phone),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
