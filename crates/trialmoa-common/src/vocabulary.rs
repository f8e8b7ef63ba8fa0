//! Classification vocabulary.
//!
//! Static configuration supplied by the analyst as YAML or JSON: drug
//! synonyms, target aliases, the fixed MOA vocabulary, the ordered rule list
//! and the innovation lookup table. Loaded once at start-up and passed by
//! reference into every stage; nothing mutates it afterwards.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrialMoaError};
use crate::record::{InnovationStatus, UNCLASSIFIED_MOA, UNCLASSIFIED_TARGET};

/// Complete vocabulary and rule configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Raw drug name (brand, code, alias) → canonical generic name.
    #[serde(default)]
    pub drug_synonyms: BTreeMap<String, String>,

    /// Canonical target name → recognised synonyms.
    #[serde(default)]
    pub targets: BTreeMap<String, Vec<String>>,

    /// The fixed MOA vocabulary; every rule label must use one of these.
    #[serde(default)]
    pub moa_categories: Vec<String>,

    /// Ordered rule list. First match wins.
    #[serde(default)]
    pub rules: Vec<RuleSpec>,

    #[serde(default)]
    pub innovation: InnovationConfig,
}

// ── Rules ────────────────────────────────────────────────────────────────────

/// One configured rule. Exactly one of the pattern keys
/// (`keyword`, `any`, `all`, `regex`, `mentions_target`) must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    /// Matches any synonym of the named vocabulary target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentions_target: Option<String>,

    /// Resulting target label.
    pub target: String,
    /// Resulting MOA label.
    pub moa: String,
}

/// The pattern part of a rule, once the exactly-one check has passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSpec {
    Keyword(String),
    Any(Vec<String>),
    All(Vec<String>),
    Regex(String),
    MentionsTarget(String),
}

impl RuleSpec {
    pub fn pattern(&self) -> Result<PatternSpec> {
        let mut found = Vec::new();
        if let Some(k) = &self.keyword { found.push(PatternSpec::Keyword(k.clone())); }
        if !self.any.is_empty() { found.push(PatternSpec::Any(self.any.clone())); }
        if !self.all.is_empty() { found.push(PatternSpec::All(self.all.clone())); }
        if let Some(r) = &self.regex { found.push(PatternSpec::Regex(r.clone())); }
        if let Some(t) = &self.mentions_target { found.push(PatternSpec::MentionsTarget(t.clone())); }

        if found.len() != 1 {
            return Err(TrialMoaError::InvalidPattern {
                rule: self.name.clone(),
                reason: format!(
                    "expected exactly one of keyword/any/all/regex/mentions_target, found {}",
                    found.len()
                ),
            });
        }
        let pattern = found.remove(0);

        let blank = match &pattern {
            PatternSpec::Keyword(k) | PatternSpec::Regex(k) | PatternSpec::MentionsTarget(k) => k.trim().is_empty(),
            PatternSpec::Any(ks) | PatternSpec::All(ks) => ks.iter().any(|k| k.trim().is_empty()),
        };
        if blank {
            return Err(TrialMoaError::InvalidPattern {
                rule: self.name.clone(),
                reason: "empty keyword".to_string(),
            });
        }
        Ok(pattern)
    }
}

// ── Innovation table ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InnovationConfig {
    /// (target, moa) → status. An entry without `moa` covers every MOA of
    /// that target and is consulted after exact entries.
    #[serde(default)]
    pub entries: Vec<InnovationEntry>,

    #[serde(default)]
    pub first_in_class: FirstInClassRegistry,

    /// Target → year of first regulatory approval of a drug on that target.
    #[serde(default)]
    pub approvals: BTreeMap<String, u16>,

    /// Approvals after this year are ignored. `None` accepts every entry.
    #[serde(default)]
    pub reference_year: Option<u16>,

    /// Status for classified mechanisms no signal or entry covers.
    #[serde(default = "default_status")]
    pub default_status: InnovationStatus,
}

fn default_status() -> InnovationStatus { InnovationStatus::Unknown }

impl Default for InnovationConfig {
    fn default() -> Self {
        Self {
            entries: vec![],
            first_in_class: FirstInClassRegistry::default(),
            approvals: BTreeMap::new(),
            reference_year: None,
            default_status: default_status(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InnovationEntry {
    pub target: String,
    #[serde(default)]
    pub moa: Option<String>,
    pub status: InnovationStatus,
}

/// Drugs and targets known to be first-in-class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FirstInClassRegistry {
    #[serde(default)]
    pub drugs: Vec<String>,
    #[serde(default)]
    pub targets: Vec<String>,
}

// ── Loading ──────────────────────────────────────────────────────────────────

impl Vocabulary {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load from a `.yaml`/`.yml` or `.json` file and validate it.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let vocabulary = match ext.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&content)?,
            "json" => Self::from_json_str(&content)?,
            other => {
                return Err(TrialMoaError::Config(format!(
                    "unsupported vocabulary format '{other}' for {} (expected .yaml, .yml or .json)",
                    path.display()
                )))
            }
        };
        vocabulary.validate()?;
        tracing::info!(
            path = %path.display(),
            rules = vocabulary.rules.len(),
            targets = vocabulary.targets.len(),
            drug_synonyms = vocabulary.drug_synonyms.len(),
            "Vocabulary loaded"
        );
        Ok(vocabulary)
    }

    /// Structural checks. Pattern compilation happens when the rule set is built.
    pub fn validate(&self) -> Result<()> {
        if self.rules.is_empty() {
            return Err(TrialMoaError::Config("vocabulary defines no rules".to_string()));
        }
        if self.moa_categories.is_empty() {
            return Err(TrialMoaError::Config("vocabulary defines no moa_categories".to_string()));
        }

        let moas: BTreeSet<&str> = self.moa_categories.iter().map(String::as_str).collect();
        let mut names = BTreeSet::new();

        for rule in &self.rules {
            if rule.name.trim().is_empty() {
                return Err(TrialMoaError::Config("rule with empty name".to_string()));
            }
            if !names.insert(rule.name.as_str()) {
                return Err(TrialMoaError::Config(format!("duplicate rule name '{}'", rule.name)));
            }
            if rule.target == UNCLASSIFIED_TARGET || rule.moa == UNCLASSIFIED_MOA {
                return Err(TrialMoaError::Config(format!(
                    "rule '{}' uses a reserved unclassified label",
                    rule.name
                )));
            }
            if !self.targets.contains_key(&rule.target) {
                return Err(TrialMoaError::Config(format!(
                    "rule '{}' assigns unknown target '{}'",
                    rule.name, rule.target
                )));
            }
            if !moas.contains(rule.moa.as_str()) {
                return Err(TrialMoaError::Config(format!(
                    "rule '{}' assigns MOA '{}' outside moa_categories",
                    rule.name, rule.moa
                )));
            }
            if let PatternSpec::MentionsTarget(t) = rule.pattern()? {
                if !self.targets.contains_key(&t) {
                    return Err(TrialMoaError::Config(format!(
                        "rule '{}' mentions unknown target '{}'",
                        rule.name, t
                    )));
                }
            }
        }

        for entry in &self.innovation.entries {
            if !self.targets.contains_key(&entry.target) {
                return Err(TrialMoaError::Config(format!(
                    "innovation entry references unknown target '{}'",
                    entry.target
                )));
            }
            if let Some(moa) = &entry.moa {
                if !moas.contains(moa.as_str()) {
                    return Err(TrialMoaError::Config(format!(
                        "innovation entry references unknown MOA '{moa}'"
                    )));
                }
            }
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
drug_synonyms:
  Tarceva: erlotinib
targets:
  EGFR: [egfr, erbb1, epidermal growth factor receptor]
  CD20: [cd20, ms4a1]
moa_categories:
  - tyrosine kinase inhibitor
  - monoclonal antibody
rules:
  - name: egfr-tki
    all: [egfr, tyrosine kinase inhibitor]
    target: EGFR
    moa: tyrosine kinase inhibitor
  - name: anti-cd20
    mentions_target: CD20
    target: CD20
    moa: monoclonal antibody
innovation:
  entries:
    - target: EGFR
      moa: tyrosine kinase inhibitor
      status: ESTABLISHED
  approvals:
    CD20: 1997
"#;

    #[test]
    fn test_yaml_parses_and_validates() {
        let v = Vocabulary::from_yaml_str(SAMPLE).unwrap();
        v.validate().unwrap();
        assert_eq!(v.rules.len(), 2);
        assert_eq!(v.rules[0].pattern().unwrap(), PatternSpec::All(vec!["egfr".into(), "tyrosine kinase inhibitor".into()]));
        assert_eq!(v.innovation.default_status, InnovationStatus::Unknown);
        assert_eq!(v.innovation.approvals.get("CD20"), Some(&1997));
    }

    #[test]
    fn test_json_matches_yaml() {
        let v = Vocabulary::from_yaml_str(SAMPLE).unwrap();
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(Vocabulary::from_json_str(&json).unwrap(), v);
    }

    #[test]
    fn test_rule_needs_exactly_one_pattern() {
        let rule = RuleSpec {
            name: "two".into(),
            keyword: Some("egfr".into()),
            regex: Some("egfr".into()),
            target: "EGFR".into(),
            moa: "x".into(),
            ..Default::default()
        };
        assert!(matches!(rule.pattern(), Err(TrialMoaError::InvalidPattern { .. })));

        let none = RuleSpec { name: "none".into(), ..Default::default() };
        assert!(none.pattern().is_err());
    }

    #[test]
    fn test_blank_keyword_rejected() {
        let rule = RuleSpec { name: "blank".into(), any: vec!["egfr".into(), " ".into()], ..Default::default() };
        assert!(rule.pattern().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_moa() {
        let mut v = Vocabulary::from_yaml_str(SAMPLE).unwrap();
        v.rules[0].moa = "gene therapy".into();
        let err = v.validate().unwrap_err();
        assert!(err.to_string().contains("outside moa_categories"));
    }

    #[test]
    fn test_validate_rejects_reserved_labels() {
        let mut v = Vocabulary::from_yaml_str(SAMPLE).unwrap();
        v.rules[1].target = UNCLASSIFIED_TARGET.into();
        assert!(v.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_rules() {
        let mut v = Vocabulary::from_yaml_str(SAMPLE).unwrap();
        v.rules.clear();
        assert!(v.validate().unwrap_err().is_fatal());
    }

    #[test]
    fn test_validate_rejects_duplicate_rule_names() {
        let mut v = Vocabulary::from_yaml_str(SAMPLE).unwrap();
        let dup = v.rules[0].clone();
        v.rules.push(dup);
        assert!(v.validate().unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn test_from_path_by_extension() {
        let mut f = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        f.write_all(SAMPLE.as_bytes()).unwrap();
        let v = Vocabulary::from_path(f.path()).unwrap();
        assert_eq!(v.drug_synonyms.get("Tarceva").map(String::as_str), Some("erlotinib"));

        let mut txt = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        txt.write_all(SAMPLE.as_bytes()).unwrap();
        assert!(matches!(Vocabulary::from_path(txt.path()), Err(TrialMoaError::Config(_))));
    }

    #[test]
    fn test_unparseable_yaml_is_fatal() {
        let err = Vocabulary::from_yaml_str("rules: [unterminated").unwrap_err();
        assert!(err.is_fatal());
    }
}
