//! Draft rows and the draft aggregate.
//!
//! A row's operation is cached but only ever written by [`Draft::refresh_row`],
//! which delegates to the intent engine.
use super::baseline::{Baseline, BaselineRow, FieldMap, RowIdentity, RowIndex};
use super::header::DraftHeader;
use super::intent::derive_operation;
use super::operation::RowOperation;
use std::collections::HashMap;

/// Live values captured when a baseline row is retired, restored on undo.
/// Transient: never serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RetireSnapshot {
    pub(crate) fields: FieldMap,
}

/// One authored record in the proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub(crate) row_index: RowIndex,
    pub(crate) identity: Option<RowIdentity>,
    pub(crate) fields: FieldMap,
    pub(crate) comment: String,
    pub(crate) retire_flag: bool,
    pub(crate) discarded: bool,
    pub(crate) retire_snapshot: Option<RetireSnapshot>,
    /// Operation at draft-open or last save; `None` for rows added since.
    pub(crate) opened_operation: Option<RowOperation>,
    operation: RowOperation,
}

impl Row {
    /// Materialize a baseline entry.
    pub(crate) fn from_baseline(row_index: RowIndex, baseline: &BaselineRow) -> Self {
        Self {
            row_index,
            identity: Some(baseline.identity.clone()),
            fields: baseline.fields.clone(),
            comment: baseline.comment.clone(),
            retire_flag: false,
            discarded: false,
            retire_snapshot: None,
            opened_operation: Some(RowOperation::Keep),
            operation: RowOperation::Keep,
        }
    }

    /// A row with no baseline counterpart and no values.
    pub(crate) fn new_insert(row_index: RowIndex) -> Self {
        Self {
            row_index,
            identity: None,
            fields: FieldMap::new(),
            comment: String::new(),
            retire_flag: false,
            discarded: false,
            retire_snapshot: None,
            opened_operation: None,
            operation: RowOperation::Insert,
        }
    }

    pub fn row_index(&self) -> RowIndex {
        self.row_index
    }

    pub fn identity(&self) -> Option<&RowIdentity> {
        self.identity.as_ref()
    }

    pub fn is_new(&self) -> bool {
        self.identity.is_none()
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Live value for a column; unset columns read as empty.
    pub fn value(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn is_retired(&self) -> bool {
        self.retire_flag
    }

    pub fn is_discarded(&self) -> bool {
        self.discarded
    }

    /// Business inputs accept edits only while neither retired nor discarded.
    pub fn is_read_only(&self) -> bool {
        self.retire_flag || self.discarded
    }

    pub fn operation(&self) -> RowOperation {
        self.operation
    }
}

/// Ordered rows of one proposal plus its header metadata and baseline.
#[derive(Debug, Clone)]
pub struct Draft {
    pub(crate) baseline: Baseline,
    baseline_lookup: HashMap<RowIdentity, usize>,
    pub(crate) rows: Vec<Row>,
    pub(crate) header: DraftHeader,
    pub(crate) next_row_index: RowIndex,
}

impl Draft {
    /// Open a draft whose rows mirror the baseline, all at `KEEP`.
    pub fn from_baseline(baseline: Baseline) -> Self {
        let rows = baseline
            .rows
            .iter()
            .zip(1..)
            .map(|(entry, row_index)| Row::from_baseline(row_index, entry))
            .collect::<Vec<_>>();
        let next_row_index = rows.len() as RowIndex + 1;
        Self::assemble(baseline, rows, DraftHeader::default(), next_row_index)
    }

    /// Build a draft from already-materialized rows and refresh every
    /// operation against the baseline.
    pub(crate) fn assemble(
        baseline: Baseline,
        rows: Vec<Row>,
        header: DraftHeader,
        next_row_index: RowIndex,
    ) -> Self {
        let baseline_lookup = baseline
            .rows
            .iter()
            .enumerate()
            .map(|(pos, row)| (row.identity.clone(), pos))
            .collect();
        let mut draft = Self {
            baseline,
            baseline_lookup,
            rows,
            header,
            next_row_index,
        };
        let indices = draft.rows.iter().map(Row::row_index).collect::<Vec<_>>();
        for row_index in indices {
            draft.refresh_row(row_index);
        }
        draft
    }

    pub fn entity(&self) -> &str {
        &self.baseline.entity
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    pub fn header(&self) -> &DraftHeader {
        &self.header
    }

    /// Rows in display and serialization order, including discarded rows.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Rows still part of the proposal.
    pub fn live_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().filter(|row| !row.discarded)
    }

    pub fn row(&self, row_index: RowIndex) -> Option<&Row> {
        self.rows.iter().find(|row| row.row_index == row_index)
    }

    pub(crate) fn row_mut(&mut self, row_index: RowIndex) -> Option<&mut Row> {
        self.rows.iter_mut().find(|row| row.row_index == row_index)
    }

    pub fn next_row_index(&self) -> RowIndex {
        self.next_row_index
    }

    /// Baseline counterpart of a row, if it has one.
    pub fn baseline_row(&self, row: &Row) -> Option<&BaselineRow> {
        lookup(&self.baseline, &self.baseline_lookup, row.identity.as_ref())
    }

    /// Recompute the operation of one row. The only writer of `Row::operation`.
    pub(crate) fn refresh_row(&mut self, row_index: RowIndex) {
        let Some(pos) = self.rows.iter().position(|row| row.row_index == row_index) else {
            return;
        };
        let baseline_row = lookup(
            &self.baseline,
            &self.baseline_lookup,
            self.rows[pos].identity.as_ref(),
        );
        let operation = derive_operation(&self.rows[pos], baseline_row);
        self.rows[pos].operation = operation;
    }

    /// Append a freshly allocated, empty new row. `None` once the index
    /// space is exhausted.
    pub(crate) fn push_new_row(&mut self) -> Option<RowIndex> {
        let row_index = allocate_index(&mut self.next_row_index)?;
        self.rows.push(Row::new_insert(row_index));
        self.refresh_row(row_index);
        Some(row_index)
    }

    /// Forget discarded rows and treat the current state as the opened state.
    pub(crate) fn settle(&mut self) {
        self.rows.retain(|row| !row.discarded);
        for row in &mut self.rows {
            row.opened_operation = Some(row.operation);
        }
        self.header = DraftHeader::opened(&self.header.to_record());
    }
}

/// Hand out `*next` and advance it. `None` when the following index would
/// overflow, so an allocated index is never handed out twice.
pub(crate) fn allocate_index(next: &mut RowIndex) -> Option<RowIndex> {
    let row_index = *next;
    *next = row_index.checked_add(1)?;
    Some(row_index)
}

fn lookup<'a>(
    baseline: &'a Baseline,
    index: &HashMap<RowIdentity, usize>,
    identity: Option<&RowIdentity>,
) -> Option<&'a BaselineRow> {
    identity
        .and_then(|identity| index.get(identity))
        .and_then(|pos| baseline.rows.get(*pos))
}
