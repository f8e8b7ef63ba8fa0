//! Run summary: counts and distributions over a `BatchOutcome`.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;
use trialmoa_common::Result;
use uuid::Uuid;

use crate::pipeline::BatchOutcome;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub run_id: Uuid,
    pub total_processed: usize,
    pub skipped: usize,
    pub unclassified: usize,
    pub by_innovation: BTreeMap<String, usize>,
    pub by_target: BTreeMap<String, usize>,
    pub by_moa: BTreeMap<String, usize>,
    pub by_phase: BTreeMap<String, usize>,
}

impl Summary {
    pub fn from_outcome(outcome: &BatchOutcome) -> Self {
        let mut summary = Summary {
            run_id: outcome.run_id,
            total_processed: outcome.records.len(),
            skipped: outcome.skipped.len(),
            unclassified: 0,
            by_innovation: BTreeMap::new(),
            by_target: BTreeMap::new(),
            by_moa: BTreeMap::new(),
            by_phase: BTreeMap::new(),
        };

        for trial in &outcome.records {
            if trial.classification.is_unclassified() {
                summary.unclassified += 1;
            }
            bump(&mut summary.by_innovation, trial.innovation.status.as_str());
            bump(&mut summary.by_target, trial.classification.target());
            bump(&mut summary.by_moa, trial.classification.moa());
            let phase = trial
                .normalized
                .phase_normalized
                .map(|p| p.as_str())
                .unwrap_or(trialmoa_common::MISSING);
            bump(&mut summary.by_phase, phase);
        }
        summary
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn log(&self) {
        info!(
            run_id       = %self.run_id,
            processed    = self.total_processed,
            skipped      = self.skipped,
            unclassified = self.unclassified,
            novel        = self.count("NOVEL"),
            established  = self.count("ESTABLISHED"),
            "Run summary"
        );
    }

    fn count(&self, status: &str) -> usize {
        self.by_innovation.get(status).copied().unwrap_or(0)
    }
}

fn bump(map: &mut BTreeMap<String, usize>, key: &str) {
    *map.entry(key.to_string()).or_insert(0) += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use trialmoa_common::{ColumnMap, UNCLASSIFIED_TARGET};
    use trialmoa_test_utils::{batch_with_malformed_fifth, sample_vocabulary};

    use crate::pipeline::Annotator;

    fn outcome() -> BatchOutcome {
        let rows = batch_with_malformed_fifth().into_iter().map(Ok);
        Annotator::new(&sample_vocabulary()).unwrap().run_batch(rows, &ColumnMap::default())
    }

    #[test]
    fn test_counts() {
        let s = Summary::from_outcome(&outcome());
        assert_eq!(s.total_processed, 9);
        assert_eq!(s.skipped, 1);
        assert_eq!(s.unclassified, 1);
        assert_eq!(s.by_target.get(UNCLASSIFIED_TARGET), Some(&1));
        assert_eq!(s.by_innovation.get("ESTABLISHED"), Some(&7));
        assert_eq!(s.by_innovation.get("NOVEL"), Some(&1));
        assert_eq!(s.by_innovation.get("UNKNOWN"), Some(&1));
        assert_eq!(s.by_phase.get("PHASE2"), Some(&9));
        assert_eq!(s.by_innovation.values().sum::<usize>(), s.total_processed);
    }

    #[test]
    fn test_json_is_sorted_and_stable() {
        let s = Summary::from_outcome(&outcome());
        let json = s.to_json_pretty().unwrap();
        let established = json.find("\"ESTABLISHED\"").unwrap();
        let novel = json.find("\"NOVEL\"").unwrap();
        assert!(established < novel);
        assert_eq!(json, s.to_json_pretty().unwrap());
    }
}
