//! CSV input and output.
//!
//! Input rows keep every column exactly as read; output repeats the input
//! columns in their original order and appends the derived columns.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{bail, Context};
use tracing::{debug, info};
use trialmoa_classify::{BatchOutcome, RowError, SkippedRow};
use trialmoa_common::{AnnotatedTrial, ColumnMap, RawRow, MISSING};

pub const DERIVED_COLUMNS: [&str; 8] = [
    "normalized_drug_name",
    "drug_name_source",
    "phase_normalized",
    "target",
    "moa_category",
    "matched_rule",
    "innovation_status",
    "innovation_basis",
];

/// A loaded input file.
#[derive(Debug, Clone)]
pub struct InputTable {
    pub headers: Vec<String>,
    /// One entry per data row, 1-based row numbers, in file order.
    pub rows: Vec<Result<RawRow, RowError>>,
}

impl InputTable {
    pub fn row(&self, row_number: usize) -> Option<&RawRow> {
        match self.rows.get(row_number.checked_sub(1)?) {
            Some(Ok(row)) => Some(row),
            _ => None,
        }
    }

    pub fn n_rows(&self) -> usize { self.rows.len() }

    /// Title, description and treatment plan of every readable row.
    pub fn texts(&self, columns: &ColumnMap) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .map(|row| {
                [&columns.title, &columns.description, &columns.treatment_plan]
                    .iter()
                    .filter_map(|c| row.get(c))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }
}

/// Read a CSV file. Fails when the header lacks the identifier column or
/// repeats a column name; unreadable data rows become `RowError`s.
pub fn read_input(path: &Path, columns: &ColumnMap) -> anyhow::Result<InputTable> {
    let file = std::fs::File::open(path).with_context(|| format!("opening input {}", path.display()))?;
    read_from(file, columns).with_context(|| format!("reading input {}", path.display()))
}

pub fn read_from<R: std::io::Read>(reader: R, columns: &ColumnMap) -> anyhow::Result<InputTable> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    if !headers.iter().any(|h| h == &columns.id) {
        bail!(
            "input header has no identifier column '{}' (found: {})",
            columns.id,
            headers.join(", ")
        );
    }

    // Cells are keyed by header name, so a repeated name would lose a cell.
    let mut seen = HashSet::new();
    for header in &headers {
        if !seen.insert(header.as_str()) {
            bail!("input header repeats column '{}'", header);
        }
    }

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let row_number = i + 1;
        let row = match record {
            Ok(record) => {
                let mut row = RawRow::new(row_number);
                for (header, value) in headers.iter().zip(record.iter()) {
                    row = row.with(header, value);
                }
                Ok(row)
            }
            Err(e) => Err(RowError { row_number, reason: e.to_string() }),
        };
        rows.push(row);
    }

    info!(rows = rows.len(), columns = headers.len(), "Input loaded");
    Ok(InputTable { headers, rows })
}

/// Derived column values for one trial, in `DERIVED_COLUMNS` order.
pub fn derived_values(trial: &AnnotatedTrial) -> [String; 8] {
    let n = &trial.normalized;
    [
        n.drug_name.display_or_marker().to_string(),
        n.drug_name_source.as_str().to_string(),
        n.phase_normalized.map(|p| p.as_str()).unwrap_or(MISSING).to_string(),
        trial.classification.target().to_string(),
        trial.classification.moa().to_string(),
        trial.classification.rule_name().unwrap_or_default().to_string(),
        trial.innovation.status.as_str().to_string(),
        trial.innovation.basis.as_str().to_string(),
    ]
}

/// Write annotated trials: input columns untouched, then derived columns.
pub fn write_output(path: &Path, input: &InputTable, outcome: &BatchOutcome) -> anyhow::Result<()> {
    let file = std::fs::File::create(path).with_context(|| format!("creating output {}", path.display()))?;
    write_to(file, input, outcome)?;
    info!(path = %path.display(), rows = outcome.records.len(), "Output written");
    Ok(())
}

pub fn write_to<W: std::io::Write>(writer: W, input: &InputTable, outcome: &BatchOutcome) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);

    let header = input
        .headers
        .iter()
        .map(String::as_str)
        .chain(DERIVED_COLUMNS.iter().copied());
    writer.write_record(header)?;

    let by_row: HashMap<usize, &RawRow> = input
        .rows
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .map(|row| (row.row_number, row))
        .collect();

    for trial in &outcome.records {
        let Some(raw) = by_row.get(&trial.row_number) else {
            debug!(row = trial.row_number, "Annotated trial has no input row; skipped in output");
            continue;
        };
        let mut record: Vec<String> = input
            .headers
            .iter()
            .map(|h| raw.get(h).unwrap_or_default().to_string())
            .collect();
        record.extend(derived_values(trial));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Skip report: row number, identifier (if known) and reason.
pub fn write_skipped(path: &Path, skipped: &[SkippedRow]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating skip report {}", path.display()))?;
    for row in skipped {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
