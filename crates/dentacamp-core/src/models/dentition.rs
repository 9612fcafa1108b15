//! Tooth universe (FDI notation) and finding-category classification.
//!
//! A tooth may sit in any number of finding categories at once. Within one
//! category it appears at most once, and toggling flips its membership.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::{RecordError, RecordResult};

/// A two-digit FDI tooth identifier.
///
/// Permanent teeth use quadrants 1-4 with positions 1-8, primary teeth use
/// quadrants 5-8 with positions 1-5. Serialised as its two-digit string ("46").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ToothId(u8);

impl ToothId {
    /// Validate an FDI code.
    pub fn new(code: u8) -> RecordResult<Self> {
        let quadrant = code / 10;
        let position = code % 10;
        let max_position = match quadrant {
            1..=4 => 8,
            5..=8 => 5,
            _ => 0,
        };
        if position == 0 || position > max_position {
            return Err(RecordError::InvalidTooth(code.to_string()));
        }
        Ok(Self(code))
    }

    pub fn code(self) -> u8 {
        self.0
    }

    /// Quadrant digit: 1-4 permanent, 5-8 primary.
    pub fn quadrant(self) -> u8 {
        self.0 / 10
    }

    /// Position from the midline (1 = central incisor).
    pub fn position(self) -> u8 {
        self.0 % 10
    }

    pub fn is_primary(self) -> bool {
        self.quadrant() >= 5
    }

    pub fn arch(self) -> Arch {
        match self.quadrant() {
            1 | 2 | 5 | 6 => Arch::Upper,
            _ => Arch::Lower,
        }
    }
}

impl fmt::Display for ToothId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ToothId {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.len() != 2 {
            return Err(RecordError::InvalidTooth(s.to_string()));
        }
        let code: u8 = trimmed
            .parse()
            .map_err(|_| RecordError::InvalidTooth(s.to_string()))?;
        Self::new(code)
    }
}

impl TryFrom<String> for ToothId {
    type Error = RecordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ToothId> for String {
    fn from(tooth: ToothId) -> Self {
        tooth.to_string()
    }
}

/// Upper (maxilla) or lower (mandible) arch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    Upper,
    Lower,
}

// Chart order, as seen facing the patient.
const UPPER_RIGHT: [u8; 8] = [18, 17, 16, 15, 14, 13, 12, 11];
const UPPER_LEFT: [u8; 8] = [21, 22, 23, 24, 25, 26, 27, 28];
const LOWER_RIGHT: [u8; 8] = [48, 47, 46, 45, 44, 43, 42, 41];
const LOWER_LEFT: [u8; 8] = [31, 32, 33, 34, 35, 36, 37, 38];

const PRIMARY_UPPER_RIGHT: [u8; 5] = [55, 54, 53, 52, 51];
const PRIMARY_UPPER_LEFT: [u8; 5] = [61, 62, 63, 64, 65];
const PRIMARY_LOWER_RIGHT: [u8; 5] = [85, 84, 83, 82, 81];
const PRIMARY_LOWER_LEFT: [u8; 5] = [71, 72, 73, 74, 75];

/// Which teeth the chart exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Dentition {
    /// Permanent teeth only (32).
    Permanent,
    /// Permanent plus primary teeth (52).
    #[default]
    Mixed,
}

impl Dentition {
    /// All addressable teeth in chart order: upper arch first, then lower.
    pub fn teeth(self) -> Vec<ToothId> {
        let mut codes: Vec<u8> = Vec::with_capacity(52);
        codes.extend(UPPER_RIGHT);
        codes.extend(UPPER_LEFT);
        if self == Dentition::Mixed {
            codes.extend(PRIMARY_UPPER_RIGHT);
            codes.extend(PRIMARY_UPPER_LEFT);
            codes.extend(PRIMARY_LOWER_RIGHT);
            codes.extend(PRIMARY_LOWER_LEFT);
        }
        codes.extend(LOWER_RIGHT);
        codes.extend(LOWER_LEFT);
        codes.into_iter().map(ToothId).collect()
    }

    pub fn contains(self, tooth: ToothId) -> bool {
        !tooth.is_primary() || self == Dentition::Mixed
    }
}

/// The closed vocabulary of per-tooth clinical findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    CariesGross,
    CariesDentinal,
    CariesPitFissure,
    CariesProximal,
    CariesSmooth,
    Missing,
    RootPiece,
}

impl FindingCategory {
    pub const ALL: [FindingCategory; 7] = [
        FindingCategory::CariesGross,
        FindingCategory::CariesDentinal,
        FindingCategory::CariesPitFissure,
        FindingCategory::CariesProximal,
        FindingCategory::CariesSmooth,
        FindingCategory::Missing,
        FindingCategory::RootPiece,
    ];

    /// Field name of the finding set in the stored record.
    pub fn key(self) -> &'static str {
        match self {
            FindingCategory::CariesGross => "caries_gross",
            FindingCategory::CariesDentinal => "caries_dentinal",
            FindingCategory::CariesPitFissure => "caries_pit_fissure",
            FindingCategory::CariesProximal => "caries_proximal",
            FindingCategory::CariesSmooth => "caries_smooth",
            FindingCategory::Missing => "missing",
            FindingCategory::RootPiece => "root_piece",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FindingCategory::CariesGross => "Grossly Carious",
            FindingCategory::CariesDentinal => "Dentinal Caries",
            FindingCategory::CariesPitFissure => "Pit & Fissure",
            FindingCategory::CariesProximal => "Proximal Caries",
            FindingCategory::CariesSmooth => "Smooth Surface",
            FindingCategory::Missing => "Missing",
            FindingCategory::RootPiece => "Root Piece",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }
}

impl FromStr for FindingCategory {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| RecordError::UnknownCategory(s.to_string()))
    }
}

/// The seven finding sets of a dental exam.
///
/// Equality ignores insertion order within a set.
#[derive(Debug, Clone, Default, Eq, Serialize, Deserialize)]
pub struct FindingSets {
    #[serde(default, deserialize_with = "deserialize_tooth_set")]
    pub caries_gross: Vec<ToothId>,
    #[serde(default, deserialize_with = "deserialize_tooth_set")]
    pub caries_dentinal: Vec<ToothId>,
    #[serde(default, deserialize_with = "deserialize_tooth_set")]
    pub caries_pit_fissure: Vec<ToothId>,
    #[serde(default, deserialize_with = "deserialize_tooth_set")]
    pub caries_proximal: Vec<ToothId>,
    #[serde(default, deserialize_with = "deserialize_tooth_set")]
    pub caries_smooth: Vec<ToothId>,
    #[serde(default, deserialize_with = "deserialize_tooth_set")]
    pub missing: Vec<ToothId>,
    #[serde(default, deserialize_with = "deserialize_tooth_set")]
    pub root_piece: Vec<ToothId>,
}

impl FindingSets {
    pub fn get(&self, category: FindingCategory) -> &[ToothId] {
        match category {
            FindingCategory::CariesGross => &self.caries_gross,
            FindingCategory::CariesDentinal => &self.caries_dentinal,
            FindingCategory::CariesPitFissure => &self.caries_pit_fissure,
            FindingCategory::CariesProximal => &self.caries_proximal,
            FindingCategory::CariesSmooth => &self.caries_smooth,
            FindingCategory::Missing => &self.missing,
            FindingCategory::RootPiece => &self.root_piece,
        }
    }

    fn get_mut(&mut self, category: FindingCategory) -> &mut Vec<ToothId> {
        match category {
            FindingCategory::CariesGross => &mut self.caries_gross,
            FindingCategory::CariesDentinal => &mut self.caries_dentinal,
            FindingCategory::CariesPitFissure => &mut self.caries_pit_fissure,
            FindingCategory::CariesProximal => &mut self.caries_proximal,
            FindingCategory::CariesSmooth => &mut self.caries_smooth,
            FindingCategory::Missing => &mut self.missing,
            FindingCategory::RootPiece => &mut self.root_piece,
        }
    }

    /// Replace one set wholesale, dropping duplicate teeth.
    pub fn set(&mut self, category: FindingCategory, teeth: Vec<ToothId>) {
        *self.get_mut(category) = dedup_teeth(teeth);
    }

    pub fn contains(&self, category: FindingCategory, tooth: ToothId) -> bool {
        self.get(category).contains(&tooth)
    }

    /// Every category the tooth is currently marked in.
    pub fn categories_for(&self, tooth: ToothId) -> Vec<FindingCategory> {
        FindingCategory::ALL
            .into_iter()
            .filter(|c| self.contains(*c, tooth))
            .collect()
    }

    /// Number of teeth per category, in `FindingCategory::ALL` order.
    pub fn counts(&self) -> Vec<(FindingCategory, usize)> {
        FindingCategory::ALL
            .into_iter()
            .map(|c| (c, self.get(c).len()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        FindingCategory::ALL.iter().all(|c| self.get(*c).is_empty())
    }
}

impl PartialEq for FindingSets {
    fn eq(&self, other: &Self) -> bool {
        FindingCategory::ALL
            .iter()
            .all(|c| same_members(self.get(*c), other.get(*c)))
    }
}

/// Flip membership of `tooth` in the set for `category`.
///
/// An absent category leaves the sets unchanged. Other categories are never
/// touched, so a tooth can be marked in several at once.
pub fn toggle(
    category: Option<FindingCategory>,
    tooth: ToothId,
    sets: &FindingSets,
) -> FindingSets {
    let mut updated = sets.clone();
    if let Some(category) = category {
        let list = updated.get_mut(category);
        *list = toggle_member(list, tooth);
    }
    updated
}

/// Same as [`toggle`] with the category given by its stored key; unknown keys are a no-op.
pub fn toggle_by_key(key: &str, tooth: ToothId, sets: &FindingSets) -> FindingSets {
    toggle(FindingCategory::from_key(key), tooth, sets)
}

/// [`toggle`] for a tooth tapped on a chart. Teeth the chart does not show are rejected.
pub fn toggle_on_chart(
    dentition: Dentition,
    category: Option<FindingCategory>,
    tooth: ToothId,
    sets: &FindingSets,
) -> RecordResult<FindingSets> {
    if !dentition.contains(tooth) {
        return Err(RecordError::InvalidTooth(tooth.to_string()));
    }
    Ok(toggle(category, tooth, sets))
}

/// Remove `item` if present, else append it.
pub(crate) fn toggle_member<T: PartialEq + Copy>(list: &[T], item: T) -> Vec<T> {
    if list.contains(&item) {
        list.iter().copied().filter(|x| *x != item).collect()
    } else {
        let mut out = list.to_vec();
        out.push(item);
        out
    }
}

/// Keep the first occurrence of each element.
pub(crate) fn dedup_members<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

fn dedup_teeth(teeth: Vec<ToothId>) -> Vec<ToothId> {
    dedup_members(teeth)
}

fn same_members<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && a.iter().all(|x| b.contains(x))
}

fn deserialize_tooth_set<'de, D>(deserializer: D) -> Result<Vec<ToothId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<ToothId>::deserialize(deserializer)?;
    Ok(dedup_teeth(raw))
}
