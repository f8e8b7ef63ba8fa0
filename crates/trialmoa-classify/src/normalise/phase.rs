//! Trial phase canonicalisation.
//!
//! Accepts arabic or roman numerals with or without a "phase" prefix,
//! ClinicalTrials.gov enums (`PHASE2`, `EARLY_PHASE1`), combined phases
//! (`1/2`, `II-III`, `PHASE1, PHASE2`) and a trailing sub-phase letter (`Ib`).

use trialmoa_common::Phase;

/// Map a lower-cased phase key to a `Phase`. Unknown text is `Unrecognised`.
pub fn canonical_phase(key: &str) -> Phase {
    let compact: String = key
        .to_lowercase()
        .replace("phase", "")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .collect();

    match lookup(&compact) {
        Phase::Unrecognised => {
            // "1b", "iia": retry without the sub-phase letter
            match compact.strip_suffix('a').or_else(|| compact.strip_suffix('b')) {
                Some(stem) if !stem.is_empty() => lookup(stem),
                _ => Phase::Unrecognised,
            }
        }
        phase => phase,
    }
}

fn lookup(compact: &str) -> Phase {
    match compact {
        "na" | "n/a" | "notapplicable" => Phase::NotApplicable,
        "0" | "early1" | "earlyi" => Phase::EarlyPhase1,
        "1" | "i" => Phase::Phase1,
        "1/2" | "1-2" | "1,2" | "i/ii" | "i-ii" => Phase::Phase1Phase2,
        "2" | "ii" => Phase::Phase2,
        "2/3" | "2-3" | "2,3" | "ii/iii" | "ii-iii" => Phase::Phase2Phase3,
        "3" | "iii" => Phase::Phase3,
        "4" | "iv" => Phase::Phase4,
        _ => Phase::Unrecognised,
    }
}
