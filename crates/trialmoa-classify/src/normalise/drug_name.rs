//! Drug-name extraction for rows without a drug column.
//!
//! Order: monoclonal antibody names (`-mab`) in the title, drug codes such as
//! `ABC-123` in the title, then the first `Drug:` entry of the treatment plan.

use std::sync::OnceLock;

use regex::Regex;
use trialmoa_common::DrugNameSource;

fn mab_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b([a-z][a-z]+mab)\b").expect("valid mab regex"))
}

fn code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Case-sensitive: codes are upper-case letters followed by digits.
    RE.get_or_init(|| Regex::new(r"\b([A-Z]{2,}[-\s]?\d{2,})\b").expect("valid code regex"))
}

fn plan_drug_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)drug:\s*([^\n,;]+)").expect("valid plan regex"))
}

fn arm_prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(placebo|experimental:|active comparator:)\s*").expect("valid prefix regex")
    })
}

/// Extract a drug name from the title or treatment plan.
/// Returns `None` when nothing usable is found.
pub fn extract_drug_name(title: &str, treatment_plan: &str) -> Option<(String, DrugNameSource)> {
    if let Some(m) = mab_regex().captures(title).and_then(|c| c.get(1)) {
        return Some((m.as_str().to_string(), DrugNameSource::ExtractedFromTitle));
    }
    if let Some(m) = code_regex().captures(title).and_then(|c| c.get(1)) {
        return Some((m.as_str().to_string(), DrugNameSource::ExtractedFromTitle));
    }

    let entry = plan_drug_regex().captures(treatment_plan)?.get(1)?.as_str().trim();
    let name = arm_prefix_regex().replace(entry, "");
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some((name.to_string(), DrugNameSource::ExtractedFromTreatmentPlan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mab_in_title_wins() {
        let got = extract_drug_name("Adalimumab versus ABT-123 in Psoriasis", "");
        assert_eq!(got, Some(("Adalimumab".to_string(), DrugNameSource::ExtractedFromTitle)));
    }

    #[test]
    fn test_code_in_title() {
        let got = extract_drug_name("Phase 1 study of LY 3009120 in solid tumours", "");
        assert_eq!(got.map(|(n, _)| n), Some("LY 3009120".to_string()));
    }

    #[test]
    fn test_lowercase_code_not_matched() {
        assert_eq!(extract_drug_name("study of abc-123", ""), None);
    }

    #[test]
    fn test_treatment_plan_strips_arm_prefix() {
        let got = extract_drug_name("", "Drug: Experimental: ZX-7 tablets, daily");
        assert_eq!(got, Some(("ZX-7 tablets".to_string(), DrugNameSource::ExtractedFromTreatmentPlan)));
    }

    #[test]
    fn test_placebo_only_plan_yields_nothing() {
        assert_eq!(extract_drug_name("", "drug: Placebo"), None);
    }

    #[test]
    fn test_nothing_found() {
        assert_eq!(extract_drug_name("An observational registry", "Behavioral: diet"), None);
    }
}
