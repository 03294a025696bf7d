//! Review diffs: the proposed dataset against the approved baseline, and one
//! approved version against another.
use super::baseline::{Baseline, BaselineRow, FieldMap};
use super::model::Draft;
use super::operation::ChangeOperation;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellDiff {
    pub column: String,
    pub before: String,
    pub after: String,
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowDiff {
    /// Identity token, or `new:<row_index>` for rows without one.
    pub key: String,
    pub row_index: u32,
    pub operation: ChangeOperation,
    pub cells: Vec<CellDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<CellDiff>,
}

impl RowDiff {
    pub fn changed_cells(&self) -> impl Iterator<Item = &CellDiff> {
        self.cells.iter().filter(|cell| cell.changed)
    }
}

fn cell(column: &str, before: &str, after: &str) -> CellDiff {
    CellDiff {
        column: column.to_string(),
        before: before.to_string(),
        after: after.to_string(),
        changed: before.trim() != after.trim(),
    }
}

/// Cells for every defined column plus any extra key either side carries.
/// Extra keys on the `after` side count only when non-blank.
fn row_cells(
    defined: &[String],
    before: Option<&BaselineRow>,
    after: &FieldMap,
    after_comment: &str,
) -> (Vec<CellDiff>, Option<CellDiff>) {
    let mut columns: Vec<String> = defined.to_vec();
    let mut seen: BTreeSet<String> = defined.iter().cloned().collect();
    let extra = before
        .into_iter()
        .flat_map(|base| base.fields.keys())
        .chain(
            after
                .iter()
                .filter(|(_, value)| !value.trim().is_empty())
                .map(|(key, _)| key),
        );
    for key in extra {
        if seen.insert(key.clone()) {
            columns.push(key.clone());
        }
    }

    let cells = columns
        .iter()
        .map(|column| {
            let before = before.map(|base| base.value(column)).unwrap_or("");
            let after = after.get(column).map(String::as_str).unwrap_or("");
            cell(column, before, after)
        })
        .collect();
    let before_comment = before.map(|base| base.comment.as_str()).unwrap_or("");
    let comment = cell("comment", before_comment, after_comment);
    (cells, comment.changed.then_some(comment))
}

/// Diff every row still in the proposal, in draft order.
pub fn diff_draft(draft: &Draft) -> Vec<RowDiff> {
    let defined = draft.baseline().column_keys();
    draft
        .rows()
        .iter()
        .filter_map(|row| {
            let operation = row.operation().visible()?;
            let (cells, comment) = row_cells(
                &defined,
                draft.baseline_row(row),
                row.fields(),
                row.comment(),
            );
            Some(RowDiff {
                key: row
                    .identity()
                    .map(|identity| identity.to_string())
                    .unwrap_or_else(|| format!("new:{}", row.row_index())),
                row_index: row.row_index(),
                operation,
                cells,
                comment,
            })
        })
        .collect()
}

/// Diff two approved versions, matching rows by identity. Rows of `to` come
/// first in their order, tagged `KEEP`, `UPDATE`, or `INSERT`; rows only in
/// `from` follow as `RETIRE`. `row_index` is the 1-based position in the
/// version the row belongs to.
pub fn diff_baselines(from: &Baseline, to: &Baseline) -> Vec<RowDiff> {
    let mut defined = to.column_keys();
    for key in from.column_keys() {
        if !defined.contains(&key) {
            defined.push(key);
        }
    }
    let empty = FieldMap::new();
    let present = to
        .rows
        .iter()
        .zip(1..)
        .map(|(row, position)| {
            let before = from.row(&row.identity);
            let (cells, comment) = row_cells(&defined, before, &row.fields, &row.comment);
            let operation = match before {
                None => ChangeOperation::Insert,
                Some(_) if comment.is_some() || cells.iter().any(|cell| cell.changed) => {
                    ChangeOperation::Update
                }
                Some(_) => ChangeOperation::Keep,
            };
            RowDiff {
                key: row.identity.to_string(),
                row_index: position,
                operation,
                cells,
                comment,
            }
        });
    let removed = from
        .rows
        .iter()
        .zip(1..)
        .filter(|(row, _)| to.row(&row.identity).is_none())
        .map(|(row, position)| {
            let (cells, comment) = row_cells(&defined, Some(row), &empty, "");
            RowDiff {
                key: row.identity.to_string(),
                row_index: position,
                operation: ChangeOperation::Retire,
                cells,
                comment,
            }
        });
    present.chain(removed).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::baseline::RowIdentity;
    use crate::draft::test_support::{fields, open_session, two_row_baseline};

    #[test]
    fn diff_reports_changed_cells_per_row() {
        let mut session = open_session();
        session.edit(1, "A", " z ").expect("edit");
        session.set_comment(1, "why").expect("comment");
        session.toggle_retire(2).expect("retire");
        let added = session.add_row().expect("add");
        session.edit(added, "B", "fresh").expect("edit");
        let dropped = session.add_row().expect("add");
        session.toggle_retire(dropped).expect("discard");

        let diff = diff_draft(session.draft());
        assert_eq!(diff.len(), 3);

        assert_eq!(diff[0].key, "R1");
        assert_eq!(diff[0].operation, ChangeOperation::Update);
        let changed = diff[0].changed_cells().collect::<Vec<_>>();
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].before, "x");
        assert_eq!(changed[0].after, " z ");
        assert_eq!(
            diff[0].comment.as_ref().map(|cell| cell.after.as_str()),
            Some("why")
        );

        assert_eq!(diff[1].operation, ChangeOperation::Retire);
        assert_eq!(diff[1].changed_cells().count(), 0);

        assert_eq!(diff[2].key, format!("new:{added}"));
        assert_eq!(diff[2].operation, ChangeOperation::Insert);
        let columns = diff[2]
            .cells
            .iter()
            .map(|cell| cell.column.as_str())
            .collect::<Vec<_>>();
        assert_eq!(columns, vec!["A", "B"]);
        assert_eq!(diff[2].changed_cells().count(), 1);
    }

    #[test]
    fn versions_diff_by_identity() {
        let from = two_row_baseline();
        let mut to = from.clone();
        to.version = 4;
        to.rows[0].fields.insert("B".to_string(), "filled".to_string());
        to.rows.remove(1);
        to.rows.push(BaselineRow {
            identity: RowIdentity::new("R9").expect("identity"),
            fields: fields(&[("A", "w")]),
            comment: String::new(),
        });
        to.rows.swap(0, 1);

        let diff = diff_baselines(&from, &to);
        let summary = diff
            .iter()
            .map(|row| (row.key.as_str(), row.row_index, row.operation))
            .collect::<Vec<_>>();
        assert_eq!(
            summary,
            vec![
                ("R9", 1, ChangeOperation::Insert),
                ("R1", 2, ChangeOperation::Update),
                ("R2", 2, ChangeOperation::Retire),
            ]
        );
        let changed = diff[1].changed_cells().collect::<Vec<_>>();
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].column, "B");
        assert_eq!(diff[2].cells[0].before, "y");
        assert_eq!(diff[2].cells[0].after, "");

        assert!(diff_baselines(&from, &from)
            .iter()
            .all(|row| row.operation == ChangeOperation::Keep));
    }

    #[test]
    fn whitespace_only_edits_are_not_changes() {
        let mut session = open_session();
        session.edit(1, "A", "x  ").expect("edit");
        let diff = diff_draft(session.draft());
        assert_eq!(diff[0].operation, ChangeOperation::Keep);
        assert_eq!(diff[0].changed_cells().count(), 0);
        assert!(diff[0].comment.is_none());
    }
}
