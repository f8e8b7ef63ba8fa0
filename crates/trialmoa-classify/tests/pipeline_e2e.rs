//! End-to-end annotation over the sample vocabulary.

use pretty_assertions::assert_eq;
use trialmoa_classify::pipeline::run_batch;
use trialmoa_classify::Annotator;
use trialmoa_common::{
    ColumnMap, DrugNameSource, InnovationBasis, InnovationStatus, Phase, RawRow,
    UNCLASSIFIED_MOA, UNCLASSIFIED_TARGET,
};
use trialmoa_test_utils::{batch_with_malformed_fifth, erlotinib_row, sample_vocabulary, unmatched_row};

fn annotate(rows: Vec<RawRow>) -> trialmoa_classify::BatchOutcome {
    Annotator::new(&sample_vocabulary())
        .unwrap()
        .run_batch(rows.into_iter().map(Ok), &ColumnMap::default())
}

#[test]
fn erlotinib_is_established_egfr_tki() {
    let outcome = annotate(vec![erlotinib_row(1)]);
    let trial = &outcome.records[0];

    assert_eq!(trial.id, "NCT00000001");
    assert_eq!(trial.normalized.drug_name.key(), Some("erlotinib"));
    assert_eq!(trial.normalized.drug_name_source, DrugNameSource::Column);
    assert_eq!(trial.normalized.phase_normalized, Some(Phase::Phase3));
    assert_eq!(trial.classification.target(), "EGFR");
    assert_eq!(trial.classification.moa(), "tyrosine kinase inhibitor");
    assert_eq!(trial.innovation.status, InnovationStatus::Established);
}

#[test]
fn target_alias_in_description_classifies_as_canonical_target() {
    let row = RawRow::new(1)
        .with("id", "NCT00000011")
        .with("drug_name", "Erlotinib")
        .with("description", "ErbB1 tyrosine kinase inhibitor");
    let outcome = annotate(vec![row]);
    let trial = &outcome.records[0];

    assert_eq!(trial.classification.target(), "EGFR");
    assert_eq!(trial.classification.rule_name(), Some("egfr-tki"));
    assert_eq!(trial.normalized.description.display(), Some("ErbB1 tyrosine kinase inhibitor"));
    assert_eq!(trial.innovation.status, InnovationStatus::Established);
}

#[test]
fn unmatched_first_in_class_drug_stays_unknown() {
    // xr-9921 is in the first-in-class registry, but an unclassified
    // mechanism can never be judged.
    let outcome = annotate(vec![unmatched_row(1)]);
    let trial = &outcome.records[0];

    assert_eq!(trial.classification.target(), UNCLASSIFIED_TARGET);
    assert_eq!(trial.classification.moa(), UNCLASSIFIED_MOA);
    assert_eq!(trial.innovation.status, InnovationStatus::Unknown);
    assert_eq!(trial.innovation.basis, InnovationBasis::Unclassified);
    assert!(trial.normalized.phase.is_missing());
}

#[test]
fn malformed_row_is_skipped_and_order_kept() {
    let outcome = annotate(batch_with_malformed_fifth());

    assert_eq!(outcome.records.len(), 9);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].row_number, 5);
    assert_eq!(outcome.skipped[0].identifier, None);

    let rows: Vec<usize> = outcome.records.iter().map(|t| t.row_number).collect();
    assert_eq!(rows, vec![1, 2, 3, 4, 6, 7, 8, 9, 10]);
}

#[test]
fn batch_statuses_and_bases() {
    let outcome = annotate(batch_with_malformed_fifth());
    let got: Vec<(&str, &str, InnovationBasis)> = outcome
        .records
        .iter()
        .map(|t| (t.id.as_str(), t.classification.target(), t.innovation.basis))
        .collect();

    assert_eq!(
        got,
        vec![
            ("NCT00000001", "EGFR", InnovationBasis::MechanismTable),
            ("NCT00000002", "HER2", InnovationBasis::TargetTable),
            ("NCT00000003", "CD20", InnovationBasis::TargetTable),
            ("NCT00000004", "PD-1", InnovationBasis::TargetTable),
            ("NCT00000006", UNCLASSIFIED_TARGET, InnovationBasis::Unclassified),
            ("NCT00000007", "VEGF", InnovationBasis::TargetTable),
            ("NCT00000008", "BTK", InnovationBasis::TargetTable),
            ("NCT00000009", "IL-17", InnovationBasis::FirstInClassRegistry),
            ("NCT00000010", "JAK", InnovationBasis::ApprovalHistory),
        ]
    );
}

#[test]
fn raw_fields_are_preserved_byte_for_byte() {
    let row = RawRow::new(1)
        .with("id", "NCT123")
        .with("drug_name", "  Tarceva\t")
        .with("description", "EGFR  Tyrosine Kinase Inhibitor ")
        .with("phase", "Phase III");
    let outcome = annotate(vec![row]);
    let trial = &outcome.records[0];

    assert_eq!(trial.raw.drug_name, "  Tarceva\t");
    assert_eq!(trial.raw.description, "EGFR  Tyrosine Kinase Inhibitor ");
    assert_eq!(trial.raw.phase, "Phase III");
    assert_eq!(trial.normalized.drug_name.key(), Some("erlotinib"));
}

#[test]
fn configuration_error_aborts_before_any_record() {
    let mut vocabulary = sample_vocabulary();
    vocabulary.rules[0].target = "Nonexistent".into();

    let result = run_batch(batch_with_malformed_fifth().into_iter().map(Ok), &vocabulary, &ColumnMap::default());
    let err = result.unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn repeated_runs_are_identical() {
    let a = annotate(batch_with_malformed_fifth());
    let b = annotate(batch_with_malformed_fifth());
    assert_eq!(a.records, b.records);
    assert_eq!(a.skipped, b.skipped);
    assert_ne!(a.run_id, b.run_id);
}

#[test]
fn custom_column_names() {
    let columns = ColumnMap {
        id: "nct_id".into(),
        drug_name: "intervention".into(),
        ..ColumnMap::default()
    };
    let row = RawRow::new(1)
        .with("nct_id", "NCT777")
        .with("intervention", "Humira")
        .with("description", "anti-TNF therapy");
    let outcome = Annotator::new(&sample_vocabulary())
        .unwrap()
        .run_batch(std::iter::once(Ok(row)), &columns);

    assert_eq!(outcome.records[0].id, "NCT777");
    assert_eq!(outcome.records[0].classification.target(), "TNF");
}

#[test]
fn shipped_example_vocabulary_compiles() {
    let yaml = include_str!("../../../config/vocabulary.example.yaml");
    let vocabulary = trialmoa_common::Vocabulary::from_yaml_str(yaml).unwrap();
    let annotator = Annotator::new(&vocabulary).unwrap();
    assert_eq!(annotator.ruleset().rules()[0].name, "egfr-tki");

    let outcome = annotator.run_batch(std::iter::once(Ok(erlotinib_row(1))), &ColumnMap::default());
    assert_eq!(outcome.records[0].innovation.status, InnovationStatus::Established);
}
