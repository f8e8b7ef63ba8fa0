//! Compiled classification rules.
//!
//! A `Ruleset` is a plain ordered list of (predicate, label) pairs built once
//! from the vocabulary. Evaluation walks the list top to bottom and the first
//! predicate that matches decides; there is no scoring and no specificity
//! ordering, so moving a rule up or down changes results.

use regex::{Regex, RegexBuilder};
use tracing::debug;
use trialmoa_common::{PatternSpec, Result, TrialMoaError, Vocabulary};

use crate::normalise::{fold, synonym_pattern};

/// Test applied to the lower-cased match text.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Substring match.
    Keyword(String),
    /// Any keyword present.
    Any(Vec<String>),
    /// Every keyword present.
    All(Vec<String>),
    /// Case-insensitive regular expression.
    Regex(Regex),
    /// Word-bounded match on any synonym of a vocabulary target.
    MentionsTarget { target: String, pattern: Regex },
}

impl Predicate {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Predicate::Keyword(k) => text.contains(k.as_str()),
            Predicate::Any(ks) => ks.iter().any(|k| text.contains(k.as_str())),
            Predicate::All(ks) => ks.iter().all(|k| text.contains(k.as_str())),
            Predicate::Regex(re) => re.is_match(text),
            Predicate::MentionsTarget { pattern, .. } => pattern.is_match(text),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassificationRule {
    pub name: String,
    pub predicate: Predicate,
    pub target: String,
    pub moa: String,
}

/// Ordered, immutable rule list.
#[derive(Debug, Clone)]
pub struct Ruleset {
    rules: Vec<ClassificationRule>,
}

impl Ruleset {
    /// Validate the vocabulary and compile every rule. Any failure is a
    /// configuration error and no record should be processed.
    pub fn compile(vocabulary: &Vocabulary) -> Result<Self> {
        vocabulary.validate()?;

        let mut rules = Vec::with_capacity(vocabulary.rules.len());
        for spec in &vocabulary.rules {
            let predicate = match spec.pattern()? {
                PatternSpec::Keyword(k) => Predicate::Keyword(fold(&k)),
                PatternSpec::Any(ks) => Predicate::Any(ks.iter().map(|k| fold(k)).collect()),
                PatternSpec::All(ks) => Predicate::All(ks.iter().map(|k| fold(k)).collect()),
                PatternSpec::Regex(p) => Predicate::Regex(build_regex(&spec.name, &p)?),
                PatternSpec::MentionsTarget(target) => {
                    let synonyms = vocabulary.targets.get(&target).cloned().unwrap_or_default();
                    let pattern = build_regex(&spec.name, &synonym_pattern(&target, &synonyms))?;
                    Predicate::MentionsTarget { target, pattern }
                }
            };
            debug!(rule = %spec.name, index = rules.len(), "Compiled classification rule");
            rules.push(ClassificationRule {
                name: spec.name.clone(),
                predicate,
                target: spec.target.clone(),
                moa: spec.moa.clone(),
            });
        }
        Ok(Self { rules })
    }

    /// Build directly from compiled rules (tests, programmatic use).
    pub fn from_rules(rules: Vec<ClassificationRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ClassificationRule] { &self.rules }
    pub fn len(&self) -> usize { self.rules.len() }
    pub fn is_empty(&self) -> bool { self.rules.is_empty() }

    /// First rule whose predicate matches, with its position.
    pub fn first_match(&self, text: &str) -> Option<(usize, &ClassificationRule)> {
        self.rules.iter().enumerate().find(|(_, rule)| rule.predicate.matches(text))
    }
}

fn build_regex(rule: &str, pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| TrialMoaError::InvalidPattern { rule: rule.to_string(), reason: e.to_string() })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use trialmoa_common::RuleSpec;
    use trialmoa_test_utils::sample_vocabulary;

    #[test]
    fn test_compile_sample_keeps_order() {
        let rs = Ruleset::compile(&sample_vocabulary()).unwrap();
        let names: Vec<&str> = rs.rules().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names.first(), Some(&"egfr-tki"));
        assert_eq!(names.last(), Some(&"generic-kinase"));
        assert_eq!(rs.len(), 12);
    }

    #[test]
    fn test_keywords_are_case_folded() {
        let mut v = sample_vocabulary();
        v.rules[0].all = vec!["EGFR".into(), "Tyrosine  Kinase Inhibitor".into()];
        let rs = Ruleset::compile(&v).unwrap();
        assert!(rs.rules()[0].predicate.matches("egfr tyrosine kinase inhibitor"));
    }

    #[test]
    fn test_all_requires_every_keyword() {
        let p = Predicate::All(vec!["egfr".into(), "tyrosine kinase inhibitor".into()]);
        assert!(p.matches("egfr tyrosine kinase inhibitor"));
        assert!(!p.matches("egfr antibody"));
    }

    #[test]
    fn test_mentions_target_is_word_bounded() {
        let rs = Ruleset::compile(&sample_vocabulary()).unwrap();
        let jak = rs.rules().iter().find(|r| r.name == "jak-mention").unwrap();
        assert!(jak.predicate.matches("selective jak1 inhibitor"));
        assert!(!jak.predicate.matches("jakarta cohort"));
    }

    #[test]
    fn test_invalid_regex_is_configuration_error() {
        let mut v = sample_vocabulary();
        v.rules[3].regex = Some("(unclosed".into());
        let err = Ruleset::compile(&v).unwrap_err();
        assert!(matches!(err, TrialMoaError::InvalidPattern { ref rule, .. } if rule == "bcma-car-t"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_compile_rejects_invalid_vocabulary() {
        let mut v = sample_vocabulary();
        v.rules.push(RuleSpec {
            name: "orphan".into(),
            keyword: Some("zeta".into()),
            target: "Target Z".into(),
            moa: "kinase inhibitor".into(),
            ..Default::default()
        });
        assert!(matches!(Ruleset::compile(&v), Err(TrialMoaError::Config(_))));
    }

    #[test]
    fn test_first_match_reports_index() {
        let rs = Ruleset::compile(&sample_vocabulary()).unwrap();
        let (idx, rule) = rs.first_match("covalent btk inhibitor").unwrap();
        assert_eq!(rule.name, "btk-mention");
        assert_eq!(idx, 9);
        assert!(rs.first_match("allosteric modulator of target z").is_none());
    }
}
