//! Target / MOA classification.

use trialmoa_common::{Classification, NormalizedFields};

use crate::rules::Ruleset;

/// Assign a target and MOA category to one record.
///
/// The rules see the concatenated drug name, title, description and treatment
/// plan. The first rule that matches decides; when none does the result is
/// `Classification::Unclassified`. Pure: same fields and rules, same answer.
pub fn classify(fields: &NormalizedFields, ruleset: &Ruleset) -> Classification {
    let text = fields.match_text();
    match ruleset.first_match(&text) {
        Some((rule_index, rule)) => Classification::Matched {
            target: rule.target.clone(),
            moa: rule.moa.clone(),
            rule_index,
            rule_name: rule.name.clone(),
        },
        None => Classification::Unclassified,
    }
}
