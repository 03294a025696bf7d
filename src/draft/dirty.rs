//! Dirtiness tracking.
//!
//! Business fields and comments compare trimmed live values against the
//! baseline; new rows have no baseline, so any non-blank value is dirty.
//! Retired rows report clean business fields because their values are pinned
//! to the baseline while retired. Discarded rows report nothing dirty.
use super::baseline::{BaselineRow, RowIndex};
use super::header::HeaderField;
use super::model::{Draft, Row};
use std::collections::BTreeSet;

/// Field-level dirtiness of one row against its baseline counterpart.
pub fn is_field_dirty(row: &Row, baseline: Option<&BaselineRow>, column: &str) -> bool {
    if row.discarded || row.retire_flag {
        return false;
    }
    let live = row.value(column).trim();
    match baseline {
        Some(baseline) => live != baseline.value(column).trim(),
        None => !live.is_empty(),
    }
}

/// Comment dirtiness; tracked even while the row is retired.
pub fn is_comment_dirty(row: &Row, baseline: Option<&BaselineRow>) -> bool {
    if row.discarded {
        return false;
    }
    let live = row.comment.trim();
    match baseline {
        Some(baseline) => live != baseline.comment.trim(),
        None => !live.is_empty(),
    }
}

/// Columns that can differ: every column the row or its baseline carries.
pub fn compared_columns<'a>(row: &'a Row, baseline: Option<&'a BaselineRow>) -> BTreeSet<&'a str> {
    let mut columns: BTreeSet<&str> = row.fields.keys().map(String::as_str).collect();
    if let Some(baseline) = baseline {
        columns.extend(baseline.fields.keys().map(String::as_str));
    }
    columns
}

/// Any business field or the comment differs from the comparison reference.
pub fn is_content_dirty(row: &Row, baseline: Option<&BaselineRow>) -> bool {
    is_comment_dirty(row, baseline)
        || compared_columns(row, baseline)
            .into_iter()
            .any(|column| is_field_dirty(row, baseline, column))
}

/// Row-level state changed since open: row added, saved row discarded, or
/// the derived operation moved away from the one the row was opened with.
/// The last case covers reverting a saved edit back to the baseline.
pub fn is_lifecycle_dirty(row: &Row) -> bool {
    match row.opened_operation {
        None => !row.discarded,
        Some(opened) => row.discarded || row.operation() != opened,
    }
}

impl Draft {
    pub fn is_field_dirty(&self, row_index: RowIndex, column: &str) -> bool {
        self.row(row_index)
            .is_some_and(|row| is_field_dirty(row, self.baseline_row(row), column))
    }

    pub fn is_comment_dirty(&self, row_index: RowIndex) -> bool {
        self.row(row_index)
            .is_some_and(|row| is_comment_dirty(row, self.baseline_row(row)))
    }

    pub fn is_row_dirty(&self, row_index: RowIndex) -> bool {
        self.row(row_index).is_some_and(|row| self.row_dirty(row))
    }

    fn row_dirty(&self, row: &Row) -> bool {
        is_content_dirty(row, self.baseline_row(row)) || is_lifecycle_dirty(row)
    }

    /// Columns of one row that currently report dirty.
    pub fn dirty_columns(&self, row_index: RowIndex) -> Vec<String> {
        let Some(row) = self.row(row_index) else {
            return Vec::new();
        };
        let baseline = self.baseline_row(row);
        compared_columns(row, baseline)
            .into_iter()
            .filter(|column| is_field_dirty(row, baseline, column))
            .map(str::to_string)
            .collect()
    }

    pub fn is_header_dirty(&self, field: HeaderField) -> bool {
        self.header.is_field_dirty(field)
    }

    /// Draft-level aggregate gating save.
    pub fn is_dirty(&self) -> bool {
        self.header.is_dirty() || self.rows.iter().any(|row| self.row_dirty(row))
    }
}
