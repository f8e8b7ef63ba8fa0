//! Trial record types flowing through the annotation pipeline.
//!
//! A `TrialRecord` is built once from one input row. Its raw fields are never
//! touched again; the derived slots (`normalized`, `classification`,
//! `innovation`) are filled in that order, each exactly once.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TrialMoaError};

/// Target label reported when no classification rule matched.
pub const UNCLASSIFIED_TARGET: &str = "UNCLASSIFIED_TARGET";
/// MOA label reported when no classification rule matched.
pub const UNCLASSIFIED_MOA: &str = "UNCLASSIFIED_MOA";
/// Rendering of a missing normalised field in tabular output.
pub const MISSING: &str = "MISSING";

// ---------------------------------------------------------------------------
// Loader input
// ---------------------------------------------------------------------------

/// One input row as handed over by the loader: 1-based row number plus
/// header → cell value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub row_number: usize,
    pub columns: BTreeMap<String, String>,
}

impl RawRow {
    pub fn new(row_number: usize) -> Self {
        Self { row_number, columns: BTreeMap::new() }
    }

    /// Builder-style column insert.
    pub fn with(mut self, column: &str, value: &str) -> Self {
        self.columns.insert(column.to_string(), value.to_string());
        self
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns.get(column).map(String::as_str)
    }
}

/// Header names for each raw field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    #[serde(default = "default_id_column")]
    pub id: String,
    #[serde(default = "default_drug_column")]
    pub drug_name: String,
    #[serde(default = "default_description_column")]
    pub description: String,
    #[serde(default = "default_condition_column")]
    pub condition: String,
    #[serde(default = "default_phase_column")]
    pub phase: String,
    #[serde(default = "default_sponsor_column")]
    pub sponsor: String,
    #[serde(default = "default_title_column")]
    pub title: String,
    #[serde(default = "default_treatment_plan_column")]
    pub treatment_plan: String,
}

fn default_id_column() -> String { "id".to_string() }
fn default_drug_column() -> String { "drug_name".to_string() }
fn default_description_column() -> String { "description".to_string() }
fn default_condition_column() -> String { "condition".to_string() }
fn default_phase_column() -> String { "phase".to_string() }
fn default_sponsor_column() -> String { "sponsor".to_string() }
fn default_title_column() -> String { "title".to_string() }
fn default_treatment_plan_column() -> String { "treatment_plan".to_string() }

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            id: default_id_column(),
            drug_name: default_drug_column(),
            description: default_description_column(),
            condition: default_condition_column(),
            phase: default_phase_column(),
            sponsor: default_sponsor_column(),
            title: default_title_column(),
            treatment_plan: default_treatment_plan_column(),
        }
    }
}

// ---------------------------------------------------------------------------
// Raw and normalised fields
// ---------------------------------------------------------------------------

/// Raw text fields of one trial, byte-for-byte as read.
/// An absent column is stored as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFields {
    pub drug_name: String,
    pub description: String,
    pub condition: String,
    pub phase: String,
    pub sponsor: String,
    pub title: String,
    pub treatment_plan: String,
}

/// A normalised text field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Field {
    /// `display` keeps the original case, `key` is lower-cased for matching.
    Present { display: String, key: String },
    Missing,
}

impl Field {
    pub fn key(&self) -> Option<&str> {
        match self {
            Field::Present { key, .. } => Some(key),
            Field::Missing => None,
        }
    }

    pub fn display(&self) -> Option<&str> {
        match self {
            Field::Present { display, .. } => Some(display),
            Field::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Field::Missing)
    }

    /// Display text, or the `MISSING` marker.
    pub fn display_or_marker(&self) -> &str {
        self.display().unwrap_or(MISSING)
    }

    /// Lower-case key, or the `MISSING` marker.
    pub fn key_or_marker(&self) -> &str {
        self.key().unwrap_or(MISSING)
    }
}

/// Where the normalised drug name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrugNameSource {
    Column,
    Synonym,
    ExtractedFromTitle,
    ExtractedFromTreatmentPlan,
    Missing,
}

impl DrugNameSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrugNameSource::Column                     => "column",
            DrugNameSource::Synonym                    => "synonym",
            DrugNameSource::ExtractedFromTitle         => "extracted_from_title",
            DrugNameSource::ExtractedFromTreatmentPlan => "extracted_from_treatment_plan",
            DrugNameSource::Missing                    => "missing",
        }
    }
}

/// Canonical clinical-trial phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    EarlyPhase1,
    Phase1,
    Phase1Phase2,
    Phase2,
    Phase2Phase3,
    Phase3,
    Phase4,
    NotApplicable,
    Unrecognised,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::EarlyPhase1   => "EARLY_PHASE1",
            Phase::Phase1        => "PHASE1",
            Phase::Phase1Phase2  => "PHASE1/PHASE2",
            Phase::Phase2        => "PHASE2",
            Phase::Phase2Phase3  => "PHASE2/PHASE3",
            Phase::Phase3        => "PHASE3",
            Phase::Phase4        => "PHASE4",
            Phase::NotApplicable => "NA",
            Phase::Unrecognised  => "UNRECOGNISED",
        }
    }
}

/// Output of the normaliser: same shape as `RawFields`, with sentinels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedFields {
    pub drug_name: Field,
    pub drug_name_source: DrugNameSource,
    pub description: Field,
    pub condition: Field,
    pub phase: Field,
    /// `None` when the phase field is missing.
    pub phase_normalized: Option<Phase>,
    pub sponsor: Field,
    pub title: Field,
    pub treatment_plan: Field,
    /// Canonical names of the vocabulary targets mentioned (directly or by
    /// alias) in the free-text fields, in vocabulary order.
    #[serde(default)]
    pub target_mentions: Vec<String>,
}

impl NormalizedFields {
    /// Lower-cased free text the classifier matches against: drug name,
    /// title, description and treatment plan (missing ones skipped),
    /// followed by the canonical names of mentioned targets.
    pub fn match_text(&self) -> String {
        let mut parts: Vec<String> = self
            .source_text_parts()
            .map(str::to_string)
            .collect();
        parts.extend(
            self.target_mentions
                .iter()
                .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()),
        );
        parts.join(" ")
    }

    /// Free text as written, without resolved target names.
    pub fn source_text(&self) -> String {
        self.source_text_parts().collect::<Vec<_>>().join(" ")
    }

    fn source_text_parts(&self) -> impl Iterator<Item = &str> {
        [&self.drug_name, &self.title, &self.description, &self.treatment_plan]
            .into_iter()
            .filter_map(|f| f.key())
    }
}

// ---------------------------------------------------------------------------
// Classification and innovation
// ---------------------------------------------------------------------------

/// Result of the target/MOA classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classification {
    Matched {
        target: String,
        moa: String,
        /// Position of the winning rule in the ordered rule list.
        rule_index: usize,
        rule_name: String,
    },
    Unclassified,
}

impl Classification {
    pub fn target(&self) -> &str {
        match self {
            Classification::Matched { target, .. } => target,
            Classification::Unclassified => UNCLASSIFIED_TARGET,
        }
    }

    pub fn moa(&self) -> &str {
        match self {
            Classification::Matched { moa, .. } => moa,
            Classification::Unclassified => UNCLASSIFIED_MOA,
        }
    }

    pub fn rule_name(&self) -> Option<&str> {
        match self {
            Classification::Matched { rule_name, .. } => Some(rule_name),
            Classification::Unclassified => None,
        }
    }

    pub fn is_unclassified(&self) -> bool {
        matches!(self, Classification::Unclassified)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InnovationStatus {
    Novel,
    Established,
    Unknown,
}

impl InnovationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InnovationStatus::Novel       => "NOVEL",
            InnovationStatus::Established => "ESTABLISHED",
            InnovationStatus::Unknown     => "UNKNOWN",
        }
    }
}

impl fmt::Display for InnovationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which signal decided the innovation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InnovationBasis {
    Unclassified,
    BiosimilarEvidence,
    FirstInClassRegistry,
    MechanismTable,
    TargetTable,
    ApprovalHistory,
    NoveltyEvidence,
    Default,
}

impl InnovationBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            InnovationBasis::Unclassified         => "unclassified",
            InnovationBasis::BiosimilarEvidence   => "biosimilar_evidence",
            InnovationBasis::FirstInClassRegistry => "first_in_class_registry",
            InnovationBasis::MechanismTable       => "mechanism_table",
            InnovationBasis::TargetTable          => "target_table",
            InnovationBasis::ApprovalHistory      => "approval_history",
            InnovationBasis::NoveltyEvidence      => "novelty_evidence",
            InnovationBasis::Default              => "default",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnovationAssessment {
    pub status: InnovationStatus,
    pub basis: InnovationBasis,
}

// ---------------------------------------------------------------------------
// Trial record
// ---------------------------------------------------------------------------

/// One clinical trial moving through normalise → classify → assess.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialRecord {
    id: String,
    row_number: usize,
    raw: RawFields,
    normalized: Option<NormalizedFields>,
    classification: Option<Classification>,
    innovation: Option<InnovationAssessment>,
}

impl TrialRecord {
    pub fn new(id: impl Into<String>, raw: RawFields) -> Self {
        Self {
            id: id.into(),
            row_number: 0,
            raw,
            normalized: None,
            classification: None,
            innovation: None,
        }
    }

    /// Build a record from a loader row. Fails only when the identifier is
    /// absent or blank; any other absent column becomes an empty raw field.
    pub fn from_row(row: &RawRow, columns: &ColumnMap) -> Result<Self> {
        let id = row
            .get(&columns.id)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| TrialMoaError::MalformedRecord {
                row: row.row_number,
                reason: format!("missing identifier (column '{}')", columns.id),
            })?;

        let cell = |column: &str| -> String {
            match row.get(column) {
                Some(value) => value.to_string(),
                None => {
                    debug!(row = row.row_number, column, "Column absent; field treated as missing");
                    String::new()
                }
            }
        };

        let raw = RawFields {
            drug_name:      cell(&columns.drug_name),
            description:    cell(&columns.description),
            condition:      cell(&columns.condition),
            phase:          cell(&columns.phase),
            sponsor:        cell(&columns.sponsor),
            title:          cell(&columns.title),
            treatment_plan: cell(&columns.treatment_plan),
        };

        let mut record = Self::new(id, raw);
        record.row_number = row.row_number;
        Ok(record)
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn row_number(&self) -> usize { self.row_number }
    pub fn raw(&self) -> &RawFields { &self.raw }
    pub fn normalized(&self) -> Option<&NormalizedFields> { self.normalized.as_ref() }
    pub fn classification(&self) -> Option<&Classification> { self.classification.as_ref() }
    pub fn innovation(&self) -> Option<&InnovationAssessment> { self.innovation.as_ref() }

    pub fn record_normalized(&mut self, fields: NormalizedFields) -> Result<()> {
        set_once(&mut self.normalized, fields, &self.id, "normalized")
    }

    /// Requires the normalised fields to be present.
    pub fn record_classification(&mut self, classification: Classification) -> Result<()> {
        if self.normalized.is_none() {
            return Err(self.incomplete("normalized"));
        }
        set_once(&mut self.classification, classification, &self.id, "classification")
    }

    /// Requires the classification to be present.
    pub fn record_innovation(&mut self, assessment: InnovationAssessment) -> Result<()> {
        if self.classification.is_none() {
            return Err(self.incomplete("classification"));
        }
        set_once(&mut self.innovation, assessment, &self.id, "innovation")
    }

    /// Freeze a fully derived record.
    pub fn finalize(self) -> Result<AnnotatedTrial> {
        let normalized = match self.normalized {
            Some(n) => n,
            None => return Err(TrialMoaError::IncompleteRecord { trial_id: self.id, field: "normalized" }),
        };
        let classification = match self.classification {
            Some(c) => c,
            None => return Err(TrialMoaError::IncompleteRecord { trial_id: self.id, field: "classification" }),
        };
        let innovation = match self.innovation {
            Some(i) => i,
            None => return Err(TrialMoaError::IncompleteRecord { trial_id: self.id, field: "innovation" }),
        };
        Ok(AnnotatedTrial {
            id: self.id,
            row_number: self.row_number,
            raw: self.raw,
            normalized,
            classification,
            innovation,
        })
    }

    fn incomplete(&self, field: &'static str) -> TrialMoaError {
        TrialMoaError::IncompleteRecord { trial_id: self.id.clone(), field }
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, trial_id: &str, field: &'static str) -> Result<()> {
    if slot.is_some() {
        return Err(TrialMoaError::DerivedFieldAlreadySet { trial_id: trial_id.to_string(), field });
    }
    *slot = Some(value);
    Ok(())
}

/// A finalised, fully annotated trial.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedTrial {
    pub id: String,
    pub row_number: usize,
    pub raw: RawFields,
    pub normalized: NormalizedFields,
    pub classification: Classification,
    pub innovation: InnovationAssessment,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
