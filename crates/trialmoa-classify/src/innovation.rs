//! Innovation assessment: NOVEL vs ESTABLISHED mechanism.
//!
//! Decision order for a classified record:
//! 1. biosimilar / equivalence wording → ESTABLISHED
//! 2. first-in-class registry hit (drug or target) → NOVEL
//! 3. exact (target, MOA) table entry
//! 4. target-wide table entry
//! 5. approval history for the target → ESTABLISHED
//! 6. novelty wording → NOVEL
//! 7. configured default
//!
//! Steps 1, 2, 5 and 6 need `AuxiliarySignals`; without them only the table
//! and the default apply. An unclassified record is always UNKNOWN.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use trialmoa_common::{
    Classification, InnovationAssessment, InnovationBasis, InnovationConfig, InnovationStatus,
    NormalizedFields, Vocabulary,
};

use crate::normalise::fold;

/// Lookup tables built once from `InnovationConfig`.
#[derive(Debug, Clone)]
pub struct InnovationTable {
    exact: HashMap<(String, String), InnovationStatus>,
    target_wide: HashMap<String, InnovationStatus>,
    first_in_class_drugs: HashSet<String>,
    first_in_class_targets: HashSet<String>,
    approvals: HashMap<String, u16>,
    reference_year: Option<u16>,
    default_status: InnovationStatus,
}

impl InnovationTable {
    /// Earlier entries win over later duplicates.
    pub fn new(config: &InnovationConfig) -> Self {
        let mut exact = HashMap::new();
        let mut target_wide = HashMap::new();
        for entry in &config.entries {
            match &entry.moa {
                Some(moa) => {
                    exact.entry((entry.target.clone(), moa.clone())).or_insert(entry.status);
                }
                None => {
                    target_wide.entry(entry.target.clone()).or_insert(entry.status);
                }
            }
        }

        Self {
            exact,
            target_wide,
            first_in_class_drugs: config
                .first_in_class
                .drugs
                .iter()
                .map(|d| fold(d))
                .filter(|d| !d.is_empty())
                .collect(),
            first_in_class_targets: config.first_in_class.targets.iter().cloned().collect(),
            approvals: config.approvals.iter().map(|(t, y)| (t.clone(), *y)).collect(),
            reference_year: config.reference_year,
            default_status: config.default_status,
        }
    }

    pub fn from_vocabulary(vocabulary: &Vocabulary) -> Self {
        Self::new(&vocabulary.innovation)
    }

    /// Table status for (target, moa): exact entry first, then target-wide.
    pub fn lookup(&self, target: &str, moa: &str) -> Option<(InnovationStatus, InnovationBasis)> {
        if let Some(status) = self.exact.get(&(target.to_string(), moa.to_string())) {
            return Some((*status, InnovationBasis::MechanismTable));
        }
        self.target_wide
            .get(target)
            .map(|status| (*status, InnovationBasis::TargetTable))
    }

    /// First approval year for the target, ignoring years past the reference year.
    pub fn first_approval(&self, target: &str) -> Option<u16> {
        let year = *self.approvals.get(target)?;
        match self.reference_year {
            Some(reference) if year > reference => None,
            _ => Some(year),
        }
    }

    pub fn is_first_in_class(&self, drug_key: Option<&str>, target: &str) -> bool {
        drug_key.is_some_and(|d| self.first_in_class_drugs.contains(d))
            || self.first_in_class_targets.contains(target)
    }

    pub fn default_status(&self) -> InnovationStatus { self.default_status }
}

/// Evidence beyond the (target, MOA) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuxiliarySignals {
    pub first_in_class: bool,
    pub first_approval_year: Option<u16>,
    pub biosimilar_evidence: bool,
    pub novelty_evidence: bool,
}

fn biosimilar_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?:biosimilar|non[-\s]?inferiority|(?:therapeutic\s+)?equivalence|bioequivalence|reference\s+product)\b",
        )
        .expect("valid biosimilar regex")
    })
}

fn novelty_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:novel|first[-\s]in[-\s](?:human|class)|dose[-\s]escalation)\b")
            .expect("valid novelty regex")
    })
}

impl AuxiliarySignals {
    /// Gather signals for one record from its text and the registries.
    pub fn collect(
        fields: &NormalizedFields,
        classification: &Classification,
        table: &InnovationTable,
    ) -> Self {
        let text = fields.source_text();
        let target = classification.target();
        Self {
            first_in_class: table.is_first_in_class(fields.drug_name.key(), target),
            first_approval_year: table.first_approval(target),
            biosimilar_evidence: biosimilar_regex().is_match(&text),
            novelty_evidence: novelty_regex().is_match(&text),
        }
    }
}

/// Derive the innovation status for a classified mechanism.
pub fn assess_innovation(
    classification: &Classification,
    signals: Option<&AuxiliarySignals>,
    table: &InnovationTable,
) -> InnovationAssessment {
    let (target, moa) = match classification {
        Classification::Unclassified => {
            return assessed(InnovationStatus::Unknown, InnovationBasis::Unclassified)
        }
        Classification::Matched { target, moa, .. } => (target.as_str(), moa.as_str()),
    };

    if let Some(s) = signals {
        if s.biosimilar_evidence {
            return assessed(InnovationStatus::Established, InnovationBasis::BiosimilarEvidence);
        }
        if s.first_in_class {
            return assessed(InnovationStatus::Novel, InnovationBasis::FirstInClassRegistry);
        }
    }

    if let Some((status, basis)) = table.lookup(target, moa) {
        return assessed(status, basis);
    }

    if let Some(s) = signals {
        if s.first_approval_year.is_some() {
            return assessed(InnovationStatus::Established, InnovationBasis::ApprovalHistory);
        }
        if s.novelty_evidence {
            return assessed(InnovationStatus::Novel, InnovationBasis::NoveltyEvidence);
        }
    }

    assessed(table.default_status(), InnovationBasis::Default)
}

fn assessed(status: InnovationStatus, basis: InnovationBasis) -> InnovationAssessment {
    InnovationAssessment { status, basis }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
