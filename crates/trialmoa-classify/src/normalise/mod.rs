//! Field normalisation.
//!
//! - `Normaliser`: trims, case-folds and resolves drug and target aliases for one record
//! - `drug_name`: fallback drug-name extraction from title / treatment plan
//! - `phase`: canonical trial phase

pub mod drug_name;
pub mod phase;

use std::collections::HashMap;

use regex::Regex;
use trialmoa_common::{DrugNameSource, Field, NormalizedFields, RawFields, Result, TrialMoaError, Vocabulary};

pub use drug_name::extract_drug_name;
pub use phase::canonical_phase;

/// In-memory drug and target alias resolver.
/// Build once from the vocabulary; `normalize` is pure afterwards.
#[derive(Debug, Clone, Default)]
pub struct Normaliser {
    /// Lower-cased synonym → canonical drug name.
    drug_synonyms: HashMap<String, String>,
    /// Canonical target name with a word-bounded pattern over its aliases.
    targets: Vec<(String, Regex)>,
}

impl Normaliser {
    pub fn new(vocabulary: &Vocabulary) -> Result<Self> {
        let mut drug_synonyms = HashMap::new();
        for (alias, canonical) in &vocabulary.drug_synonyms {
            let key = match normalize_text(alias) {
                Field::Present { key, .. } => key,
                Field::Missing => continue,
            };
            drug_synonyms.entry(key).or_insert_with(|| canonical.trim().to_string());
        }

        let mut targets = Vec::with_capacity(vocabulary.targets.len());
        for (canonical, synonyms) in &vocabulary.targets {
            let pattern = Regex::new(&synonym_pattern(canonical, synonyms)).map_err(|e| {
                TrialMoaError::InvalidPattern {
                    rule: format!("target '{canonical}'"),
                    reason: e.to_string(),
                }
            })?;
            targets.push((canonical.trim().to_string(), pattern));
        }

        Ok(Self { drug_synonyms, targets })
    }

    /// Normalise every raw field of one record. Never fails; unresolvable
    /// values pass through unchanged.
    pub fn normalize(&self, raw: &RawFields) -> NormalizedFields {
        let phase = normalize_text(&raw.phase);
        let phase_normalized = phase.key().map(canonical_phase);
        let (drug_name, drug_name_source) = self.resolve_drug_name(raw);

        let mut fields = NormalizedFields {
            drug_name,
            drug_name_source,
            description: normalize_text(&raw.description),
            condition: normalize_text(&raw.condition),
            phase,
            phase_normalized,
            sponsor: normalize_text(&raw.sponsor),
            title: normalize_text(&raw.title),
            treatment_plan: normalize_text(&raw.treatment_plan),
            target_mentions: Vec::new(),
        };
        fields.target_mentions = self.resolve_targets(&fields.source_text());
        fields
    }

    /// Canonical name for a drug alias, case-insensitive.
    pub fn canonical_drug(&self, name: &str) -> Option<&str> {
        let key = normalize_text(name);
        self.drug_synonyms.get(key.key()?).map(String::as_str)
    }

    /// Canonical names of every target whose name or alias occurs in `text`.
    pub fn resolve_targets(&self, text: &str) -> Vec<String> {
        let text = fold(text);
        self.targets
            .iter()
            .filter(|(_, pattern)| pattern.is_match(&text))
            .map(|(canonical, _)| canonical.clone())
            .collect()
    }

    pub fn n_synonyms(&self) -> usize { self.drug_synonyms.len() }
    pub fn n_targets(&self) -> usize { self.targets.len() }

    fn resolve_drug_name(&self, raw: &RawFields) -> (Field, DrugNameSource) {
        let (field, source) = match normalize_text(&raw.drug_name) {
            Field::Missing => match extract_drug_name(&raw.title, &raw.treatment_plan) {
                Some((name, source)) => (normalize_text(&name), source),
                None => return (Field::Missing, DrugNameSource::Missing),
            },
            present => (present, DrugNameSource::Column),
        };

        match field.key().and_then(|k| self.drug_synonyms.get(k)) {
            Some(canonical) => (
                Field::Present { display: canonical.clone(), key: fold(canonical) },
                DrugNameSource::Synonym,
            ),
            None => (field, source),
        }
    }
}

/// Trim and case-fold one value. Empty or whitespace-only text is `Missing`.
pub fn normalize_text(raw: &str) -> Field {
    let display = raw.trim();
    if display.is_empty() {
        return Field::Missing;
    }
    Field::Present { display: display.to_string(), key: fold(display) }
}

/// Lower-case with inner whitespace runs collapsed to one space.
pub fn fold(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// `\b(?:syn1|syn2)\b` with `-` and spaces inside a synonym matching
/// `-`, whitespace or nothing ("IL-17" ~ "il17" ~ "il 17").
/// The canonical name is always included. Matches folded text.
pub fn synonym_pattern(target: &str, synonyms: &[String]) -> String {
    let mut names: Vec<String> = std::iter::once(target)
        .chain(synonyms.iter().map(String::as_str))
        .map(fold)
        .filter(|s| !s.is_empty())
        .collect();
    // Longest first so the alternation prefers "il-17a" over "il-17".
    names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    names.dedup();

    let alternatives: Vec<String> = names
        .iter()
        .map(|name| {
            name.split(|c: char| c == '-' || c.is_whitespace())
                .filter(|part| !part.is_empty())
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"[-\s]?")
        })
        .collect();
    format!(r"\b(?:{})\b", alternatives.join("|"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
