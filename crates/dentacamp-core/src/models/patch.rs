//! Section-scoped partial updates.
//!
//! Each section has an explicit patch type listing the fields it may change.
//! Patch bodies reject unknown keys, and there is no patch for `id` or `synced`.

use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::dentition::{FindingCategory, FindingSets, ToothId};
use super::screening::{
    dedup_options, AdvisedTreatment, CompletedTreatment, Gender, ScreeningRecord, Severity,
};
use super::{RecordError, RecordResult};

/// Top-level record sections that accept patches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Header,
    Demographics,
    General,
    Dental,
    Treatment,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Header,
        Section::Demographics,
        Section::General,
        Section::Dental,
        Section::Treatment,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Section::Header => "header",
            Section::Demographics => "demographics",
            Section::General => "general",
            Section::Dental => "dental",
            Section::Treatment => "treatment",
        }
    }
}

impl FromStr for Section {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|section| section.name() == s)
            .ok_or_else(|| RecordError::UnknownSection(s.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderPatch {
    pub location: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DemographicsPatch {
    pub name: Option<String>,
    pub age: Option<String>,
    pub gender: Option<Gender>,
    pub class: Option<String>,
    pub contact: Option<String>,
    pub teacher_contact: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralPatch {
    pub chief_complaint: Option<String>,
    pub med_dental_history: Option<String>,
    pub personal_history: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DentalPatch {
    pub caries_gross: Option<Vec<ToothId>>,
    pub caries_dentinal: Option<Vec<ToothId>>,
    pub caries_pit_fissure: Option<Vec<ToothId>>,
    pub caries_proximal: Option<Vec<ToothId>>,
    pub caries_smooth: Option<Vec<ToothId>>,
    pub missing: Option<Vec<ToothId>>,
    pub root_piece: Option<Vec<ToothId>>,
    pub stains: Option<Severity>,
    pub calculus: Option<Severity>,
    pub tmj: Option<String>,
    pub soft_tissue: Option<String>,
    pub malocclusion: Option<String>,
    pub additional: Option<String>,
}

impl DentalPatch {
    /// A patch replacing all seven finding sets.
    pub fn from_findings(findings: FindingSets) -> Self {
        Self {
            caries_gross: Some(findings.caries_gross),
            caries_dentinal: Some(findings.caries_dentinal),
            caries_pit_fissure: Some(findings.caries_pit_fissure),
            caries_proximal: Some(findings.caries_proximal),
            caries_smooth: Some(findings.caries_smooth),
            missing: Some(findings.missing),
            root_piece: Some(findings.root_piece),
            ..Default::default()
        }
    }

    fn finding(&self, category: FindingCategory) -> Option<&Vec<ToothId>> {
        match category {
            FindingCategory::CariesGross => self.caries_gross.as_ref(),
            FindingCategory::CariesDentinal => self.caries_dentinal.as_ref(),
            FindingCategory::CariesPitFissure => self.caries_pit_fissure.as_ref(),
            FindingCategory::CariesProximal => self.caries_proximal.as_ref(),
            FindingCategory::CariesSmooth => self.caries_smooth.as_ref(),
            FindingCategory::Missing => self.missing.as_ref(),
            FindingCategory::RootPiece => self.root_piece.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TreatmentPatch {
    pub advised: Option<Vec<AdvisedTreatment>>,
    pub done: Option<Vec<CompletedTreatment>>,
}

/// A partial update to exactly one section.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionPatch {
    Header(HeaderPatch),
    Demographics(DemographicsPatch),
    General(GeneralPatch),
    Dental(DentalPatch),
    Treatment(TreatmentPatch),
}

impl SectionPatch {
    pub fn section(&self) -> Section {
        match self {
            SectionPatch::Header(_) => Section::Header,
            SectionPatch::Demographics(_) => Section::Demographics,
            SectionPatch::General(_) => Section::General,
            SectionPatch::Dental(_) => Section::Dental,
            SectionPatch::Treatment(_) => Section::Treatment,
        }
    }

    /// Parse a JSON object as a patch for the named section.
    pub fn parse(section: &str, json: &str) -> RecordResult<Self> {
        let section: Section = section.parse()?;
        let patch = match section {
            Section::Header => SectionPatch::Header(parse_body(section, json)?),
            Section::Demographics => SectionPatch::Demographics(parse_body(section, json)?),
            Section::General => SectionPatch::General(parse_body(section, json)?),
            Section::Dental => SectionPatch::Dental(parse_body(section, json)?),
            Section::Treatment => SectionPatch::Treatment(parse_body(section, json)?),
        };
        Ok(patch)
    }

    /// Shallow-merge the present fields into the record's section.
    pub(crate) fn apply_to(&self, record: &mut ScreeningRecord) {
        match self {
            SectionPatch::Header(p) => {
                let header = &mut record.header;
                merge(&mut header.location, &p.location);
                merge(&mut header.date, &p.date);
            }
            SectionPatch::Demographics(p) => {
                let demographics = &mut record.demographics;
                merge(&mut demographics.name, &p.name);
                merge(&mut demographics.age, &p.age);
                merge(&mut demographics.gender, &p.gender);
                merge(&mut demographics.class, &p.class);
                merge(&mut demographics.contact, &p.contact);
                merge(&mut demographics.teacher_contact, &p.teacher_contact);
            }
            SectionPatch::General(p) => {
                let general = &mut record.general;
                merge(&mut general.chief_complaint, &p.chief_complaint);
                merge(&mut general.med_dental_history, &p.med_dental_history);
                merge(&mut general.personal_history, &p.personal_history);
            }
            SectionPatch::Dental(p) => {
                let dental = &mut record.dental;
                for category in FindingCategory::ALL {
                    if let Some(teeth) = p.finding(category) {
                        dental.findings.set(category, teeth.clone());
                    }
                }
                merge(&mut dental.stains, &p.stains);
                merge(&mut dental.calculus, &p.calculus);
                merge(&mut dental.tmj, &p.tmj);
                merge(&mut dental.soft_tissue, &p.soft_tissue);
                merge(&mut dental.malocclusion, &p.malocclusion);
                merge(&mut dental.additional, &p.additional);
            }
            SectionPatch::Treatment(p) => {
                if let Some(advised) = &p.advised {
                    record.treatment.advised = dedup_options(advised.clone());
                }
                if let Some(done) = &p.done {
                    record.treatment.done = dedup_options(done.clone());
                }
            }
        }
    }
}

fn merge<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *target = v.clone();
    }
}

fn parse_body<T: DeserializeOwned>(section: Section, json: &str) -> RecordResult<T> {
    serde_json::from_str(json).map_err(|e| RecordError::InvalidPatch {
        section: section.name().to_string(),
        reason: e.to_string(),
    })
}
