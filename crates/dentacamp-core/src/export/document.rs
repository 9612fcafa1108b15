//! Print layout for a single screening record.
//!
//! The projection reads a record and nothing else. Apart from the footer's
//! print date, the same record always produces the same document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::{FindingCategory, Gender, ScreeningRecord, Severity};

pub const DOCUMENT_TITLE: &str = "DENTAL ASSESSMENT FORM";
pub const DOCUMENT_SUBTITLE: &str = "Official Screening Record";
pub const PRODUCT_NAME: &str = "DentaCamp FastScreen";

/// Shown for a finding category with no teeth.
pub const NO_FINDINGS: &str = "None";
/// Shown for an empty advised/done list.
pub const NONE_RECORDED: &str = "None Recorded";
/// Shown for an unrated stains/calculus score.
pub const UNRATED: &str = "-";

/// A complete printable document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrintDocument {
    pub title: String,
    pub subtitle: String,
    pub header: DocumentHeader,
    pub demographics: Vec<Field>,
    pub gender: Vec<Checkbox>,
    pub history: Vec<Field>,
    pub findings: Vec<FindingLine>,
    pub ratings: Vec<Field>,
    pub observations: Vec<Field>,
    pub advised: Entries,
    pub done: Entries,
    pub footer: Footer,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentHeader {
    pub date: String,
    pub location: String,
}

/// A labelled value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checkbox {
    pub label: String,
    pub checked: bool,
}

/// Teeth marked in one finding category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FindingLine {
    pub category: FindingCategory,
    pub label: String,
    pub teeth: Entries,
}

/// A list that is never silently empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Entries {
    Listed(Vec<String>),
    Placeholder(String),
}

impl Entries {
    fn from_items(items: Vec<String>, placeholder: &str) -> Self {
        if items.is_empty() {
            Entries::Placeholder(placeholder.to_string())
        } else {
            Entries::Listed(items)
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Entries::Placeholder(_))
    }

    /// Single-line rendering.
    pub fn display(&self) -> String {
        match self {
            Entries::Listed(items) => items.join(", "),
            Entries::Placeholder(text) => text.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Footer {
    pub product: String,
    /// Not part of the record's content; varies between prints.
    pub printed_on: String,
    /// Hex SHA-256 of the record's stored JSON.
    pub fingerprint: String,
}

/// Project a record for printing now.
pub fn project(record: &ScreeningRecord) -> Result<PrintDocument, serde_json::Error> {
    project_at(record, Utc::now())
}

/// Project a record with an explicit print time.
pub fn project_at(
    record: &ScreeningRecord,
    printed_at: DateTime<Utc>,
) -> Result<PrintDocument, serde_json::Error> {
    let demographics = &record.demographics;
    let general = &record.general;
    let dental = &record.dental;

    let findings = FindingCategory::ALL
        .into_iter()
        .map(|category| FindingLine {
            category,
            label: category.label().to_string(),
            teeth: Entries::from_items(
                dental
                    .findings
                    .get(category)
                    .iter()
                    .map(|t| t.to_string())
                    .collect(),
                NO_FINDINGS,
            ),
        })
        .collect();

    let advised = record
        .treatment
        .advised
        .iter()
        .map(|t| t.label().to_string())
        .collect();
    let done = record
        .treatment
        .done
        .iter()
        .map(|t| t.label().to_string())
        .collect();

    Ok(PrintDocument {
        title: DOCUMENT_TITLE.to_string(),
        subtitle: DOCUMENT_SUBTITLE.to_string(),
        header: DocumentHeader {
            date: record.header.date.clone(),
            location: record.header.location.clone(),
        },
        demographics: vec![
            field("Patient Name", &demographics.name),
            field("Age", &demographics.age),
            field("Class / Section", &demographics.class),
            field("Parent Contact", &demographics.contact),
            field("Teacher Contact", &demographics.teacher_contact),
        ],
        gender: [Gender::Male, Gender::Female]
            .into_iter()
            .map(|g| Checkbox {
                label: g.as_str().to_string(),
                checked: demographics.gender == g,
            })
            .collect(),
        history: vec![
            field("*Chief Complaint", &general.chief_complaint),
            field("Medical History", &general.med_dental_history),
            field("Personal History", &general.personal_history),
        ],
        findings,
        ratings: vec![
            field("Stains", rating(dental.stains)),
            field("Calculus", rating(dental.calculus)),
        ],
        observations: vec![
            field("Soft Tissues", &dental.soft_tissue),
            field("Malocclusion", &dental.malocclusion),
            field("TMJ", &dental.tmj),
            field("Other", &dental.additional),
        ],
        advised: Entries::from_items(advised, NONE_RECORDED),
        done: Entries::from_items(done, NONE_RECORDED),
        footer: Footer {
            product: PRODUCT_NAME.to_string(),
            printed_on: printed_at.format("%Y-%m-%d").to_string(),
            fingerprint: fingerprint(record)?,
        },
    })
}

/// Hex SHA-256 of the record's stored JSON.
pub fn fingerprint(record: &ScreeningRecord) -> Result<String, serde_json::Error> {
    let json = record.to_canonical_json()?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

fn field(label: &str, value: &str) -> Field {
    Field {
        label: label.to_string(),
        value: value.to_string(),
    }
}

fn rating(severity: Severity) -> &'static str {
    match severity {
        Severity::Absent => UNRATED,
        other => other.as_str(),
    }
}

impl PrintDocument {
    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Plain-text rendering, one labelled line per field.
    pub fn to_text(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!("{}\n{}\n", self.title, self.subtitle));
        out.push_str(&format!(
            "Date: {}\nLocation: {}\n\n",
            self.header.date, self.header.location
        ));

        for f in &self.demographics {
            push_field(&mut out, f);
        }
        let gender: Vec<String> = self
            .gender
            .iter()
            .map(|c| format!("[{}] {}", if c.checked { "x" } else { " " }, c.label))
            .collect();
        out.push_str(&format!("Gender: {}\n\n", gender.join("  ")));

        for f in &self.history {
            push_field(&mut out, f);
        }

        out.push_str("\nORAL EXAMINATION\n");
        for line in &self.findings {
            out.push_str(&format!("{}: {}\n", line.label, line.teeth.display()));
        }
        for f in self.ratings.iter().chain(&self.observations) {
            push_field(&mut out, f);
        }

        out.push_str("\nTREATMENT PLAN\n");
        out.push_str(&format!(
            "Investigations & Procedures Advised: {}\n",
            self.advised.display()
        ));
        out.push_str(&format!(
            "Treatment Done (Camp Site): {}\n",
            self.done.display()
        ));

        out.push_str(&format!(
            "\nPrinted via {} \u{2022} {}\nRef: {}\nExaminer Signature: ____________________\n",
            self.footer.product, self.footer.printed_on, self.footer.fingerprint
        ));
        out
    }
}

fn push_field(out: &mut String, f: &Field) {
    out.push_str(&format!("{}: {}\n", f.label, f.value));
}
