//! CSV bulk ingest.
//!
//! Parsing and key resolution only; the resulting records are applied by
//! [`DraftSession::bulk_ingest`](crate::draft::DraftSession::bulk_ingest)
//! through the same edit and add-row contracts as manual input.
use crate::draft::baseline::{Baseline, FieldMap};
use crate::draft::controller::IngestRecord;
use crate::draft::model::Draft;
use anyhow::{anyhow, Context, Result};
use std::collections::BTreeSet;
use std::io::Read;

/// Non-blank records read from one CSV upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvBatch {
    pub columns: Vec<String>,
    pub records: Vec<FieldMap>,
    /// Records skipped because every value was blank.
    pub blank: usize,
}

/// Read a CSV whose header row names column keys. Values are trimmed.
pub fn read_csv<R: Read>(reader: R, baseline: &Baseline) -> Result<CsvBatch> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);
    let columns = reader
        .headers()
        .context("read CSV header row")?
        .iter()
        .enumerate()
        .map(|(pos, header)| {
            let header = if pos == 0 {
                header.trim_start_matches('\u{feff}')
            } else {
                header
            };
            header.trim().to_string()
        })
        .collect::<Vec<_>>();
    validate_columns(&columns, baseline)?;

    let mut records = Vec::new();
    let mut blank = 0;
    for (pos, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("read CSV record {}", pos + 1))?;
        let values = columns
            .iter()
            .zip(record.iter())
            .map(|(column, value)| (column.clone(), value.trim().to_string()))
            .collect::<FieldMap>();
        if values.values().all(|value| value.is_empty()) {
            blank += 1;
            continue;
        }
        records.push(values);
    }
    Ok(CsvBatch {
        columns,
        records,
        blank,
    })
}

fn validate_columns(columns: &[String], baseline: &Baseline) -> Result<()> {
    if columns.is_empty() || columns.iter().any(String::is_empty) {
        return Err(anyhow!("CSV header row must name every column"));
    }
    let mut seen = BTreeSet::new();
    for column in columns {
        if !seen.insert(column.as_str()) {
            return Err(anyhow!("CSV header names column {column:?} more than once"));
        }
    }
    if !baseline.defines_columns() {
        return Ok(());
    }
    let undefined = columns
        .iter()
        .filter(|column| !baseline.defines_column(column))
        .map(String::as_str)
        .collect::<Vec<_>>();
    if undefined.len() == columns.len() {
        return Err(anyhow!(
            "CSV header shares no columns with {} (expected some of: {})",
            baseline.entity,
            baseline.column_keys().join(", ")
        ));
    }
    if !undefined.is_empty() {
        return Err(anyhow!(
            "CSV header names columns not defined for {}: {}",
            baseline.entity,
            undefined.join(", ")
        ));
    }
    Ok(())
}

/// Address each record at the single live row whose key columns match, or at
/// a new row.
pub fn resolve_targets(
    draft: &Draft,
    key_columns: &[String],
    records: Vec<FieldMap>,
) -> Vec<IngestRecord> {
    records
        .into_iter()
        .map(|values| IngestRecord {
            target: match_row(draft, key_columns, &values),
            values,
        })
        .collect()
}

fn match_row(draft: &Draft, key_columns: &[String], values: &FieldMap) -> Option<u32> {
    if key_columns.is_empty() {
        return None;
    }
    let keys = key_columns
        .iter()
        .map(|column| {
            values
                .get(column)
                .filter(|value| !value.is_empty())
                .map(|value| (column.as_str(), value.as_str()))
        })
        .collect::<Option<Vec<_>>>()?;
    let mut matches = draft.live_rows().filter(|row| {
        keys.iter()
            .all(|(column, value)| row.value(column).trim() == *value)
    });
    let first = matches.next()?;
    if matches.next().is_some() {
        tracing::warn!(keys = ?keys, "key columns match several rows; ingesting as new row");
        return None;
    }
    Some(first.row_index())
}
