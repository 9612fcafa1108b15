//! Camp scoping and free-text search over loaded records.
//!
//! Both filters keep the incoming order and compose in either order.

use crate::models::ScreeningRecord;

pub fn belongs_to_camp(record: &ScreeningRecord, camp_id: &str) -> bool {
    record.camp_id.as_deref() == Some(camp_id)
}

/// Case-insensitive match on the patient name, or case-sensitive match on the id.
/// An empty query matches everything.
pub fn matches_query(record: &ScreeningRecord, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    record
        .demographics
        .name
        .to_lowercase()
        .contains(&query.to_lowercase())
        || record.id.contains(query)
}

/// Keep only records owned by `camp_id`.
pub fn scope_to_camp(records: Vec<ScreeningRecord>, camp_id: &str) -> Vec<ScreeningRecord> {
    records
        .into_iter()
        .filter(|r| belongs_to_camp(r, camp_id))
        .collect()
}

/// Keep only records matching `query`.
pub fn search(records: Vec<ScreeningRecord>, query: &str) -> Vec<ScreeningRecord> {
    records
        .into_iter()
        .filter(|r| matches_query(r, query))
        .collect()
}

/// Both filters at once: the list shown for one camp.
pub fn filter_for_camp(
    records: Vec<ScreeningRecord>,
    camp_id: &str,
    query: &str,
) -> Vec<ScreeningRecord> {
    records
        .into_iter()
        .filter(|r| belongs_to_camp(r, camp_id) && matches_query(r, query))
        .collect()
}
