//! Batch annotation pipeline.
//!
//! Per row:
//!   1. Build a `TrialRecord` from the loader's `RawRow`
//!   2. Normalise raw fields
//!   3. Classify target / MOA (first match wins)
//!   4. Collect auxiliary signals and assess innovation
//!   5. Finalise into an `AnnotatedTrial`
//!
//! A row that cannot become a record is skipped and reported; the rest of
//! the batch carries on. Vocabulary problems surface from `Annotator::new`
//! before any row is looked at.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use trialmoa_common::{
    AnnotatedTrial, ColumnMap, RawRow, Result, TrialMoaError, TrialRecord, Vocabulary,
};
use uuid::Uuid;

use crate::classifier::classify;
use crate::innovation::{assess_innovation, AuxiliarySignals, InnovationTable};
use crate::normalise::Normaliser;
use crate::rules::Ruleset;

// ── Row errors and skips ──────────────────────────────────────────────────────

/// A row the loader could not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub row_number: usize,
    pub reason: String,
}

/// One entry of the skip report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    pub row_number: usize,
    pub identifier: Option<String>,
    pub reason: String,
}

// ── Result summary ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Annotated trials in input order.
    pub records: Vec<AnnotatedTrial>,
    pub skipped: Vec<SkippedRow>,
    pub duration_ms: u64,
}

// ── Annotator ─────────────────────────────────────────────────────────────────

/// Compiled, read-only state shared by every record of a run.
#[derive(Debug, Clone)]
pub struct Annotator {
    normaliser: Normaliser,
    ruleset: Ruleset,
    table: InnovationTable,
    use_signals: bool,
}

impl Annotator {
    /// Validate the vocabulary and compile rules and lookup tables.
    pub fn new(vocabulary: &Vocabulary) -> Result<Self> {
        let ruleset = Ruleset::compile(vocabulary)?;
        let normaliser = Normaliser::new(vocabulary)?;
        let table = InnovationTable::from_vocabulary(vocabulary);
        info!(
            rules = ruleset.len(),
            synonyms = normaliser.n_synonyms(),
            targets = normaliser.n_targets(),
            "Annotator ready"
        );
        Ok(Self { normaliser, ruleset, table, use_signals: true })
    }

    /// Assess innovation from the mechanism table and default only.
    pub fn without_signals(mut self) -> Self {
        self.use_signals = false;
        self
    }

    pub fn ruleset(&self) -> &Ruleset { &self.ruleset }

    /// Run every stage on one record and finalise it.
    pub fn annotate(&self, mut record: TrialRecord) -> Result<AnnotatedTrial> {
        let fields = self.normaliser.normalize(record.raw());
        let classification = classify(&fields, &self.ruleset);
        let signals = self
            .use_signals
            .then(|| AuxiliarySignals::collect(&fields, &classification, &self.table));
        let assessment = assess_innovation(&classification, signals.as_ref(), &self.table);

        debug!(
            trial = record.id(),
            target = classification.target(),
            moa = classification.moa(),
            rule = classification.rule_name().unwrap_or("-"),
            status = %assessment.status,
            "Trial annotated"
        );

        record.record_normalized(fields)?;
        record.record_classification(classification)?;
        record.record_innovation(assessment)?;
        record.finalize()
    }

    /// Annotate a batch. Rows that fail are reported in `skipped`.
    #[instrument(skip_all, fields(run_id = tracing::field::Empty))]
    pub fn run_batch<I>(&self, rows: I, columns: &ColumnMap) -> BatchOutcome
    where
        I: IntoIterator<Item = std::result::Result<RawRow, RowError>>,
    {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));
        let started_at = Utc::now();
        let t0 = std::time::Instant::now();
        info!(run_id = %run_id, "Starting annotation run");

        let mut outcome = BatchOutcome {
            run_id,
            started_at,
            records: Vec::new(),
            skipped: Vec::new(),
            duration_ms: 0,
        };
        let mut seen: HashSet<String> = HashSet::new();

        for row in rows {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    warn!(row = e.row_number, reason = %e.reason, "Skipping unreadable row");
                    outcome.skipped.push(SkippedRow {
                        row_number: e.row_number,
                        identifier: None,
                        reason: e.reason,
                    });
                    continue;
                }
            };

            match self.annotate_row(&row, columns, &mut seen) {
                Ok(trial) => outcome.records.push(trial),
                Err((identifier, e)) => {
                    warn!(row = row.row_number, error = %e, "Skipping malformed record");
                    outcome.skipped.push(SkippedRow {
                        row_number: row.row_number,
                        identifier,
                        reason: e.to_string(),
                    });
                }
            }
        }

        outcome.duration_ms = t0.elapsed().as_millis() as u64;
        info!(
            run_id      = %run_id,
            annotated   = outcome.records.len(),
            skipped     = outcome.skipped.len(),
            duration_ms = outcome.duration_ms,
            "Annotation run complete"
        );
        outcome
    }

    fn annotate_row(
        &self,
        row: &RawRow,
        columns: &ColumnMap,
        seen: &mut HashSet<String>,
    ) -> std::result::Result<AnnotatedTrial, (Option<String>, TrialMoaError)> {
        let record = TrialRecord::from_row(row, columns).map_err(|e| (None, e))?;
        let id = record.id().to_string();
        if !seen.insert(id.clone()) {
            let e = TrialMoaError::MalformedRecord {
                row: row.row_number,
                reason: format!("duplicate identifier '{id}'"),
            };
            return Err((Some(id), e));
        }
        self.annotate(record).map_err(|e| (Some(id), e))
    }
}

/// Compile the vocabulary and annotate `rows`. Configuration errors are
/// returned before any row is consumed.
pub fn run_batch<I>(rows: I, vocabulary: &Vocabulary, columns: &ColumnMap) -> Result<BatchOutcome>
where
    I: IntoIterator<Item = std::result::Result<RawRow, RowError>>,
{
    let annotator = Annotator::new(vocabulary)?;
    Ok(annotator.run_batch(rows, columns))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use trialmoa_common::{InnovationBasis, InnovationStatus, RawFields};
    use trialmoa_test_utils::{erlotinib_row, sample_vocabulary, unmatched_row, RowBuilder};

    fn annotator() -> Annotator {
        Annotator::new(&sample_vocabulary()).unwrap()
    }

    fn ok_rows(rows: Vec<RawRow>) -> Vec<std::result::Result<RawRow, RowError>> {
        rows.into_iter().map(Ok).collect()
    }

    #[test]
    fn test_annotate_single_record() {
        let record = TrialRecord::new(
            "NCT1",
            RawFields {
                drug_name: "Tarceva".into(),
                description: "EGFR tyrosine kinase inhibitor".into(),
                phase: "III".into(),
                ..Default::default()
            },
        );
        let trial = annotator().annotate(record).unwrap();
        assert_eq!(trial.normalized.drug_name.key(), Some("erlotinib"));
        assert_eq!(trial.classification.target(), "EGFR");
        assert_eq!(trial.innovation.status, InnovationStatus::Established);
        assert_eq!(trial.raw.drug_name, "Tarceva");
    }

    #[test]
    fn test_annotate_rejects_already_annotated_record() {
        let a = annotator();
        let mut record = TrialRecord::new("NCT1", RawFields::default());
        record.record_normalized(Normaliser::default().normalize(&RawFields::default())).unwrap();
        let err = a.annotate(record).unwrap_err();
        assert!(matches!(err, TrialMoaError::DerivedFieldAlreadySet { field: "normalized", .. }));
    }

    #[test]
    fn test_run_batch_keeps_input_order() {
        let outcome = annotator().run_batch(
            ok_rows(vec![unmatched_row(1), erlotinib_row(2)]),
            &ColumnMap::default(),
        );
        let ids: Vec<&str> = outcome.records.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["NCT00000002", "NCT00000001"]);
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn test_loader_errors_are_skipped() {
        let rows = vec![
            Ok(erlotinib_row(1)),
            Err(RowError { row_number: 2, reason: "unequal field count".into() }),
            Ok(unmatched_row(3)),
        ];
        let outcome = annotator().run_batch(rows, &ColumnMap::default());
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(
            outcome.skipped,
            vec![SkippedRow { row_number: 2, identifier: None, reason: "unequal field count".into() }]
        );
    }

    #[test]
    fn test_duplicate_identifier_is_skipped() {
        let outcome = annotator().run_batch(
            ok_rows(vec![erlotinib_row(1), erlotinib_row(2)]),
            &ColumnMap::default(),
        );
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].row_number, 1);
        assert_eq!(outcome.skipped[0].row_number, 2);
        assert_eq!(outcome.skipped[0].identifier.as_deref(), Some("NCT00000001"));
        assert!(outcome.skipped[0].reason.contains("duplicate identifier"));
    }

    #[test]
    fn test_without_signals_uses_table_only() {
        let row = RowBuilder::new(1)
            .id("NCT9")
            .drug("Secukinumab")
            .description("anti-IL-17A antibody")
            .build();
        let with = annotator().run_batch(ok_rows(vec![row.clone()]), &ColumnMap::default());
        let without = annotator()
            .without_signals()
            .run_batch(ok_rows(vec![row]), &ColumnMap::default());

        assert_eq!(with.records[0].innovation.basis, InnovationBasis::FirstInClassRegistry);
        assert_eq!(without.records[0].innovation.status, InnovationStatus::Unknown);
        assert_eq!(without.records[0].innovation.basis, InnovationBasis::Default);
    }

    #[test]
    fn test_invalid_vocabulary_fails_before_rows() {
        let mut v = sample_vocabulary();
        v.rules.clear();
        let consumed = std::cell::Cell::new(0);
        let rows = (1..=3).map(|n| {
            consumed.set(consumed.get() + 1);
            Ok(erlotinib_row(n))
        });
        let err = run_batch(rows, &v, &ColumnMap::default()).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(consumed.get(), 0);
    }
}
