//! The screening record aggregate.
//!
//! A record is edited in memory through section patches and only becomes
//! durable when the caller saves it. Every patch clears `synced`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::context::ScreeningContext;
use super::dentition::{
    dedup_members, toggle, toggle_member, toggle_on_chart, Dentition, FindingCategory, FindingSets,
    ToothId,
};
use super::patch::{DentalPatch, SectionPatch, TreatmentPatch};
use super::{RecordError, RecordResult};

/// Today's calendar date (UTC) as `YYYY-MM-DD`, used for fresh headers.
pub fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

/// Where and when the screening took place.
///
/// The date is kept exactly as the form entered it; a cleared date input is `""`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Header {
    pub location: String,
    #[serde(default)]
    pub date: String,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            location: String::new(),
            date: today(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Gender {
    Male,
    Female,
    #[default]
    #[serde(rename = "")]
    Unset,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Unset => "",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Demographics {
    pub name: String,
    /// Free text from the form; numeric format is not enforced here.
    pub age: String,
    #[serde(default)]
    pub gender: Gender,
    /// Class / section at school
    pub class: String,
    /// Parent contact
    pub contact: String,
    pub teacher_contact: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct GeneralExam {
    pub chief_complaint: String,
    pub med_dental_history: String,
    pub personal_history: String,
}

/// Stains / calculus rating.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    #[serde(rename = "")]
    Absent,
    #[serde(rename = "+")]
    Mild,
    #[serde(rename = "++")]
    Moderate,
    #[serde(rename = "+++")]
    Severe,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Absent => "",
            Severity::Mild => "+",
            Severity::Moderate => "++",
            Severity::Severe => "+++",
        }
    }
}

/// Dental examination: per-tooth finding sets plus auxiliary observations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DentalExam {
    #[serde(flatten)]
    pub findings: FindingSets,
    #[serde(default)]
    pub stains: Severity,
    #[serde(default)]
    pub calculus: Severity,
    pub tmj: String,
    pub soft_tissue: String,
    pub malocclusion: String,
    pub additional: String,
}

/// Treatments that can be advised.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AdvisedTreatment {
    #[serde(rename = "X-Ray (IOPA/OPG)")]
    XRay,
    #[serde(rename = "RCT")]
    RootCanal,
    Extraction,
    Scaling,
    #[serde(rename = "Ortho Consultation")]
    OrthoConsultation,
    Restoration,
    Other,
}

impl AdvisedTreatment {
    pub const ALL: [AdvisedTreatment; 7] = [
        AdvisedTreatment::XRay,
        AdvisedTreatment::RootCanal,
        AdvisedTreatment::Extraction,
        AdvisedTreatment::Scaling,
        AdvisedTreatment::OrthoConsultation,
        AdvisedTreatment::Restoration,
        AdvisedTreatment::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AdvisedTreatment::XRay => "X-Ray (IOPA/OPG)",
            AdvisedTreatment::RootCanal => "RCT",
            AdvisedTreatment::Extraction => "Extraction",
            AdvisedTreatment::Scaling => "Scaling",
            AdvisedTreatment::OrthoConsultation => "Ortho Consultation",
            AdvisedTreatment::Restoration => "Restoration",
            AdvisedTreatment::Other => "Other",
        }
    }
}

impl FromStr for AdvisedTreatment {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.label() == s)
            .ok_or_else(|| RecordError::UnknownTreatment(s.to_string()))
    }
}

/// Treatments performed on site.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CompletedTreatment {
    #[serde(rename = "Scaling (Ultrasonic/Hand)")]
    Scaling,
    #[serde(rename = "GIC Restoration")]
    GicRestoration,
    #[serde(rename = "Fluoride Gel")]
    FluorideGel,
    #[serde(rename = "Pit/Fissure Sealant")]
    PitFissureSealant,
    Counselling,
}

impl CompletedTreatment {
    pub const ALL: [CompletedTreatment; 5] = [
        CompletedTreatment::Scaling,
        CompletedTreatment::GicRestoration,
        CompletedTreatment::FluorideGel,
        CompletedTreatment::PitFissureSealant,
        CompletedTreatment::Counselling,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CompletedTreatment::Scaling => "Scaling (Ultrasonic/Hand)",
            CompletedTreatment::GicRestoration => "GIC Restoration",
            CompletedTreatment::FluorideGel => "Fluoride Gel",
            CompletedTreatment::PitFissureSealant => "Pit/Fissure Sealant",
            CompletedTreatment::Counselling => "Counselling",
        }
    }
}

impl FromStr for CompletedTreatment {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.label() == s)
            .ok_or_else(|| RecordError::UnknownTreatment(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Treatment {
    #[serde(default)]
    pub advised: Vec<AdvisedTreatment>,
    #[serde(default)]
    pub done: Vec<CompletedTreatment>,
}

/// A patient's screening record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScreeningRecord {
    /// Stable identity and sole upsert key.
    pub id: String,
    #[serde(rename = "campId", default, skip_serializing_if = "Option::is_none")]
    pub camp_id: Option<String>,
    #[serde(rename = "doctorId", default, skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<String>,
    pub header: Header,
    pub demographics: Demographics,
    pub general: GeneralExam,
    pub dental: DentalExam,
    pub treatment: Treatment,
    /// Never set automatically; cleared by every patch.
    #[serde(default)]
    pub synced: bool,
}

/// The slice of a record shown in list views.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordSummary {
    pub id: String,
    pub header: Header,
    pub demographics: Demographics,
    pub synced: bool,
}

impl ScreeningRecord {
    fn blank(id: String) -> Self {
        Self {
            id,
            camp_id: None,
            doctor_id: None,
            header: Header::default(),
            demographics: Demographics::default(),
            general: GeneralExam::default(),
            dental: DentalExam::default(),
            treatment: Treatment::default(),
            synced: false,
        }
    }

    /// Start a new screening with a fresh id, scoped and prefilled from `context`.
    pub fn new_draft(context: &ScreeningContext) -> Self {
        let mut record = Self::blank(new_record_id());
        record.camp_id = context.camp_id.clone();
        record.doctor_id = context.doctor_id.clone();
        if let Some(prefill) = &context.prefill {
            record.header = Header {
                location: prefill.location.clone(),
                date: prefill.date.clone(),
            };
        }
        record
    }

    /// Apply a section patch. The id never changes and `synced` is always cleared.
    pub fn patch_section(&self, patch: &SectionPatch) -> Self {
        let mut next = self.clone();
        patch.apply_to(&mut next);
        next.synced = false;
        next
    }

    /// Parse and apply a JSON patch for the named section.
    pub fn patch_json(&self, section: &str, json: &str) -> RecordResult<Self> {
        let patch = SectionPatch::parse(section, json)?;
        Ok(self.patch_section(&patch))
    }

    /// Flip a tooth in one finding category. With no category this is a no-op.
    pub fn toggle_tooth(&self, category: Option<FindingCategory>, tooth: ToothId) -> Self {
        if category.is_none() {
            return self.clone();
        }
        let findings = toggle(category, tooth, &self.dental.findings);
        self.patch_section(&SectionPatch::Dental(DentalPatch::from_findings(findings)))
    }

    /// [`Self::toggle_tooth`] for a tap on a chart showing `dentition`.
    pub fn toggle_chart_tooth(
        &self,
        dentition: Dentition,
        category: Option<FindingCategory>,
        tooth: ToothId,
    ) -> RecordResult<Self> {
        let findings = toggle_on_chart(dentition, category, tooth, &self.dental.findings)?;
        if category.is_none() {
            return Ok(self.clone());
        }
        Ok(self.patch_section(&SectionPatch::Dental(DentalPatch::from_findings(findings))))
    }

    pub fn toggle_advised(&self, option: AdvisedTreatment) -> Self {
        let advised = toggle_member(&self.treatment.advised, option);
        self.patch_section(&SectionPatch::Treatment(TreatmentPatch {
            advised: Some(advised),
            done: None,
        }))
    }

    pub fn toggle_done(&self, option: CompletedTreatment) -> Self {
        let done = toggle_member(&self.treatment.done, option);
        self.patch_section(&SectionPatch::Treatment(TreatmentPatch {
            advised: None,
            done: Some(done),
        }))
    }

    /// Start over with a new id and empty sections, keeping header and camp scope.
    pub fn reset_draft(&self) -> Self {
        let mut fresh = Self::blank(new_record_id());
        fresh.camp_id = self.camp_id.clone();
        fresh.doctor_id = self.doctor_id.clone();
        fresh.header = self.header.clone();
        fresh
    }

    /// Canned, fully populated record for demonstration. Keeps this record's id and scope.
    pub fn load_example(&self) -> Self {
        let mut example = Self::blank(self.id.clone());
        example.camp_id = self.camp_id.clone();
        example.doctor_id = self.doctor_id.clone();
        example.header = Header {
            location: "Central High Camp".into(),
            date: today(),
        };
        example.demographics = Demographics {
            name: "ABC".into(),
            age: "12".into(),
            gender: Gender::Male,
            class: "6-B".into(),
            contact: "555-0123".into(),
            teacher_contact: "555-0987".into(),
        };
        example.general = GeneralExam {
            chief_complaint: "Pain in lower right back tooth".into(),
            med_dental_history: "None".into(),
            personal_history: "Brushes once daily".into(),
        };
        if let Ok(tooth) = ToothId::new(46) {
            example.dental.findings.caries_dentinal = vec![tooth];
        }
        example.dental.stains = Severity::Moderate;
        example.dental.calculus = Severity::Mild;
        example.treatment = Treatment {
            advised: vec![AdvisedTreatment::Restoration],
            done: vec![CompletedTreatment::FluorideGel],
        };
        example
    }

    pub fn summary(&self) -> RecordSummary {
        RecordSummary {
            id: self.id.clone(),
            header: self.header.clone(),
            demographics: self.demographics.clone(),
            synced: self.synced,
        }
    }

    /// Reject records that must never reach storage.
    pub fn validate_for_save(&self) -> RecordResult<()> {
        if self.id.trim().is_empty() {
            return Err(RecordError::EmptyId);
        }
        Ok(())
    }

    /// Serialize to the stored JSON form.
    pub fn to_canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Drop repeated treatment options, keeping first occurrences.
pub(crate) fn dedup_options<T: PartialEq>(options: Vec<T>) -> Vec<T> {
    dedup_members(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DemographicsPatch, HeaderPatch};

    fn tooth(s: &str) -> ToothId {
        s.parse().unwrap()
    }

    #[test]
    fn test_new_draft_defaults() {
        let draft = ScreeningRecord::new_draft(&ScreeningContext::default());
        assert_eq!(draft.id.len(), 36);
        assert!(!draft.synced);
        assert!(draft.dental.findings.is_empty());
        assert_eq!(draft.dental.stains, Severity::Absent);
        assert_eq!(draft.demographics.gender, Gender::Unset);
        assert!(draft.camp_id.is_none());
    }

    #[test]
    fn test_new_draft_prefill() {
        let ctx = ScreeningContext::new(Some("camp-1".into()), Some("doc-1".into()))
            .with_prefill("School Hall", "2024-05-01");
        let draft = ScreeningRecord::new_draft(&ctx);
        assert_eq!(draft.camp_id.as_deref(), Some("camp-1"));
        assert_eq!(draft.doctor_id.as_deref(), Some("doc-1"));
        assert_eq!(draft.header.location, "School Hall");
        assert_eq!(draft.header.date, "2024-05-01");
    }

    #[test]
    fn test_patch_merges_and_marks_dirty() {
        let mut record = ScreeningRecord::new_draft(&ScreeningContext::default());
        record.synced = true;
        record.demographics.age = "9".into();

        let patched = record.patch_section(&SectionPatch::Demographics(DemographicsPatch {
            name: Some("Asha".into()),
            ..Default::default()
        }));

        assert_eq!(patched.id, record.id);
        assert!(!patched.synced);
        assert_eq!(patched.demographics.name, "Asha");
        assert_eq!(patched.demographics.age, "9");
    }

    #[test]
    fn test_empty_patch_still_marks_dirty() {
        let mut record = ScreeningRecord::new_draft(&ScreeningContext::default());
        record.synced = true;
        let patched = record.patch_section(&SectionPatch::Header(HeaderPatch::default()));
        assert!(!patched.synced);
        assert_eq!(patched.header, record.header);
    }

    #[test]
    fn test_patch_json_rejects_unknown_section() {
        let record = ScreeningRecord::new_draft(&ScreeningContext::default());
        let err = record.patch_json("billing", "{}").unwrap_err();
        assert_eq!(err, RecordError::UnknownSection("billing".into()));

        assert!(record.patch_json("id", r#"{"id":"x"}"#).is_err());
    }

    #[test]
    fn test_patch_json_rejects_unknown_field() {
        let record = ScreeningRecord::new_draft(&ScreeningContext::default());
        let err = record.patch_json("demographics", r#"{"nmae":"typo"}"#).unwrap_err();
        assert!(matches!(err, RecordError::InvalidPatch { .. }));
    }

    #[test]
    fn test_toggle_tooth_through_record() {
        let record = ScreeningRecord::new_draft(&ScreeningContext::default());
        let marked = record.toggle_tooth(Some(FindingCategory::CariesDentinal), tooth("46"));
        assert_eq!(marked.dental.findings.caries_dentinal, vec![tooth("46")]);

        let untouched = marked.toggle_tooth(None, tooth("46"));
        assert_eq!(untouched, marked);
    }

    #[test]
    fn test_toggle_treatments() {
        let record = ScreeningRecord::new_draft(&ScreeningContext::default());
        let record = record.toggle_advised(AdvisedTreatment::Scaling);
        let record = record.toggle_done(CompletedTreatment::Counselling);
        assert_eq!(record.treatment.advised, vec![AdvisedTreatment::Scaling]);
        assert_eq!(record.treatment.done, vec![CompletedTreatment::Counselling]);

        let record = record.toggle_advised(AdvisedTreatment::Scaling);
        assert!(record.treatment.advised.is_empty());
    }

    #[test]
    fn test_reset_keeps_header_and_scope() {
        let ctx =
            ScreeningContext::new(Some("camp-1".into()), None).with_prefill("Hall", "2024-01-02");
        let record = ScreeningRecord::new_draft(&ctx).load_example();
        let reset = record.reset_draft();

        assert_ne!(reset.id, record.id);
        assert_eq!(reset.header, record.header);
        assert_eq!(reset.camp_id.as_deref(), Some("camp-1"));
        assert_eq!(reset.demographics, Demographics::default());
        assert!(reset.dental.findings.is_empty());
    }

    #[test]
    fn test_load_example_preserves_id() {
        let record = ScreeningRecord::new_draft(&ScreeningContext::default());
        let example = record.load_example();
        assert_eq!(example.id, record.id);
        assert_eq!(example.demographics.name, "ABC");
        assert_eq!(example.dental.findings.caries_dentinal, vec![tooth("46")]);
        assert_eq!(example.dental.stains, Severity::Moderate);
        assert_eq!(example.treatment.done, vec![CompletedTreatment::FluorideGel]);
    }

    #[test]
    fn test_chart_toggle_rejects_hidden_tooth() {
        let record = ScreeningRecord::new_draft(&ScreeningContext::default());
        assert_eq!(
            record.toggle_chart_tooth(Dentition::Permanent, Some(FindingCategory::Missing), tooth("74")),
            Err(RecordError::InvalidTooth("74".into()))
        );

        let mut synced = record.clone();
        synced.synced = true;
        let marked = synced
            .toggle_chart_tooth(Dentition::Mixed, Some(FindingCategory::Missing), tooth("74"))
            .unwrap();
        assert_eq!(marked.dental.findings.missing, vec![tooth("74")]);
        assert!(!marked.synced);
    }

    #[test]
    fn test_header_date_kept_as_entered() {
        let record = ScreeningRecord::new_draft(&ScreeningContext::default());
        assert_eq!(record.header.date.len(), 10);

        let cleared = record.patch_json("header", r#"{"date":""}"#).unwrap();
        assert_eq!(cleared.header.date, "");
        let free_text = record.patch_json("header", r#"{"date":"next Tuesday"}"#).unwrap();
        assert_eq!(free_text.header.date, "next Tuesday");

        let json = cleared.to_canonical_json().unwrap();
        let reloaded: ScreeningRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, cleared);
    }

    #[test]
    fn test_validate_rejects_empty_id() {
        let mut record = ScreeningRecord::new_draft(&ScreeningContext::default());
        assert!(record.validate_for_save().is_ok());
        record.id = String::new();
        assert_eq!(record.validate_for_save(), Err(RecordError::EmptyId));
    }

    #[test]
    fn test_stored_json_shape() {
        let record = ScreeningRecord::new_draft(&ScreeningContext::new(Some("c1".into()), None))
            .load_example();
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["campId"], "c1");
        assert!(value.get("doctorId").is_none());
        assert_eq!(value["demographics"]["gender"], "Male");
        assert_eq!(value["dental"]["caries_dentinal"][0], "46");
        assert_eq!(value["dental"]["missing"], serde_json::json!([]));
        assert_eq!(value["dental"]["stains"], "++");
        assert_eq!(value["treatment"]["advised"][0], "Restoration");
        assert_eq!(value["synced"], false);
    }

    #[test]
    fn test_parse_stored_shape() {
        let json = r#"{
            "header": {"location": "Hall", "date": "2024-02-10"},
            "demographics": {"name": "Ravi", "age": "11", "gender": "", "class": "5-A",
                             "contact": "", "teacher_contact": ""},
            "general": {"chief_complaint": "", "med_dental_history": "", "personal_history": ""},
            "dental": {"caries_gross": [], "caries_dentinal": ["46"], "caries_pit_fissure": [],
                       "caries_proximal": [], "caries_smooth": [], "missing": ["11"],
                       "root_piece": [], "stains": "", "calculus": "+++", "tmj": "",
                       "soft_tissue": "", "malocclusion": "", "additional": ""},
            "treatment": {"advised": ["RCT", "X-Ray (IOPA/OPG)"], "done": []},
            "id": "abc",
            "synced": true,
            "campId": "camp-9"
        }"#;
        let record: ScreeningRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "abc");
        assert_eq!(record.camp_id.as_deref(), Some("camp-9"));
        assert!(record.synced);
        assert_eq!(record.dental.calculus, Severity::Severe);
        assert_eq!(
            record.treatment.advised,
            vec![AdvisedTreatment::RootCanal, AdvisedTreatment::XRay]
        );
    }

    #[test]
    fn test_treatment_labels_parse() {
        for option in AdvisedTreatment::ALL {
            assert_eq!(option.label().parse::<AdvisedTreatment>(), Ok(option));
        }
        for option in CompletedTreatment::ALL {
            assert_eq!(option.label().parse::<CompletedTreatment>(), Ok(option));
        }
        assert!("Braces".parse::<AdvisedTreatment>().is_err());
    }
}
