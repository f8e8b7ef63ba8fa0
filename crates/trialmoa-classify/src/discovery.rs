//! Candidate target discovery from free trial text.
//!
//! Mines phrases such as `anti-CD20`, `JAK inhibitor`, `targeting BCMA`,
//! bare biological codes and a few full protein names, keeps those that look
//! like real molecular targets and counts them across the batch. Output is a
//! starting point for writing a vocabulary; classification never reads it.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Regex, RegexSet};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredTarget {
    /// Upper-cased name with separators normalised (`IL 17A` → `IL-17A`).
    pub name: String,
    pub mentions: usize,
    /// Case-insensitive pattern tolerant of `-`/space variants.
    pub pattern: String,
}

const NOISE_WORDS: &[&str] = &[
    "BODY", "INJECTION", "MONOCLONAL", "HUMANIZED", "RECOMBINANT", "ANTIBODY", "PROTEIN",
    "THERAPY", "TREATMENT", "DRUG", "AGENT", "ACTIVITY", "TARGETING", "AGAINST", "FUSION",
    "RECEPTOR ALPHA", "CHARACTERISTICS", "AND", "THE", "OF", "IN", "ON", "AT",
];

fn valid_target_set() -> &'static RegexSet {
    static SET: OnceLock<RegexSet> = OnceLock::new();
    SET.get_or_init(|| {
        RegexSet::new([
            r"^IL[-\s]?\d+",
            r"^INTERLEUKIN[-\s]?\d+",
            r"^TNF",
            r"^TUMOR NECROSIS FACTOR",
            r"^PD[-\s]?L?1",
            r"^PROGRAMMED DEATH",
            r"^CD\d+",
            r"^HER[-\s]?\d",
            r"^VEGF",
            r"^VASCULAR ENDOTHELIAL",
            r"^EGFR",
            r"^EPIDERMAL GROWTH FACTOR",
            r"^HUMAN EPIDERMAL",
            r"^BCMA",
            r"^CTLA",
            r"^JAK",
            r"^BTK",
            r"^PCSK\d",
            r"^CGRP",
            r"^GLP",
            r"^RANKL",
            r"ERYTHROPOIETIN",
            r"^BDCA\d+",
            r"^TACI\b",
            r"^BAFF",
            r"^APRIL\b",
            r"^TIGIT\b",
            r"^LAG[-\s]?\d+",
        ])
        .expect("valid target patterns")
    })
}

/// Phrase extractors; capture group 1 is the candidate.
fn candidate_regexes() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            // anti-X
            r"(?i)anti[-\s]?([a-z]{2,}[-\s]?\d*[a-z]*(?:\s+(?:alpha|beta|receptor|α|β))?)",
            // X inhibitor / antagonist / blocker
            r"(?i)([a-z]{2,}[-\s]?\d*[a-z]*(?:\s+(?:alpha|beta|α|β))?)\s+(?:inhibit(?:or|ion)|antagonist|blocker)",
            // targeting X
            r"(?i)targeting\s+([a-z]{2,}[-\s]?\d*[a-z]*)",
            // bare biological codes
            r"(?i)\b((?:rh)?il[-\s]?\d+[a-z]*|tnf[-\s]?(?:alpha|α)?|pd[-\s]?l?\d|cd\d+|her[-\s]?\d|vegfr?|egfr|bcma|ctla[-\s]?\d|jak[-\s]?\d*|btk|pcsk\d|cgrp|glp[-\s]?\d|rankl)\b",
            // full protein names
            r"(?i)\b(erythropoietin|interferon|insulin|tumor necrosis factor[-\s]?(?:alpha|α)?|epidermal growth factor receptor|interleukin[-\s]?\d+)\b",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid candidate regex"))
        .collect()
    })
}

fn dash_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*-\s*").expect("valid dash regex"))
}

/// Space between a letter and a digit (`IL 17`).
fn split_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([A-Z])\s+(\d)").expect("valid code regex"))
}

/// Heuristic check that a candidate names a molecular target rather than a
/// generic pharmaceutical term.
pub fn is_valid_target(candidate: &str) -> bool {
    let target = collapse(candidate).to_uppercase();
    if NOISE_WORDS.contains(&target.as_str()) {
        return false;
    }

    let words: Vec<&str> = target.split(' ').collect();
    if words.len() > 1 {
        let noise = words.iter().filter(|w| NOISE_WORDS.contains(*w)).count();
        if noise + 1 >= words.len() {
            return false;
        }
    }

    let len = target.chars().count();
    if !(2..=30).contains(&len) {
        return false;
    }

    valid_target_set().is_match(&target)
}

/// Count plausible targets across `texts`, keeping those mentioned at least
/// `min_frequency` times. Sorted by mentions (descending), then name.
pub fn discover_targets<'a, I>(texts: I, min_frequency: usize) -> Vec<DiscoveredTarget>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut n_texts = 0usize;

    for text in texts {
        n_texts += 1;
        for re in candidate_regexes() {
            for cap in re.captures_iter(text) {
                let Some(m) = cap.get(1) else { continue };
                let cleaned = collapse(m.as_str());
                if !is_valid_target(&cleaned) {
                    continue;
                }
                let upper = cleaned.to_uppercase();
                let dashed = dash_regex().replace_all(&upper, "-");
                let name = split_code_regex().replace_all(&dashed, "$1-$2").into_owned();
                *counts.entry(name).or_insert(0) += 1;
            }
        }
    }

    debug!(texts = n_texts, candidates = counts.len(), "Target candidates counted");

    let mut found: Vec<DiscoveredTarget> = counts
        .into_iter()
        .filter(|(_, n)| *n >= min_frequency)
        .map(|(name, mentions)| DiscoveredTarget { pattern: separator_tolerant(&name), name, mentions })
        .collect();
    found.sort_by(|a, b| b.mentions.cmp(&a.mentions).then_with(|| a.name.cmp(&b.name)));

    info!(discovered = found.len(), min_frequency, "Target discovery complete");
    found
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `IL-17A` → `IL[-\s]?17A`.
fn separator_tolerant(name: &str) -> String {
    name.split(|c: char| c == '-' || c == ' ')
        .filter(|part| !part.is_empty())
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"[-\s]?")
}
