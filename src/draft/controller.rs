//! Draft mutation controller.
//!
//! `DraftSession` is the single writer of a draft. Every mutation runs to
//! completion, touches only the addressed row, and leaves each row's
//! operation re-derived by the intent engine.
use super::baseline::{FieldMap, RowIndex};
use super::changeset::{capture_rows, ChangeRow};
use super::gate;
use super::header::{is_placeholder_category, normalize_category, HeaderField, HeaderRecord};
use super::model::{Draft, RetireSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

/// External operations that suspend the session until they resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalOp {
    Save,
    Submit,
    BulkIngest,
    RowAllocation,
}

impl fmt::Display for ExternalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExternalOp::Save => "save",
            ExternalOp::Submit => "submit",
            ExternalOp::BulkIngest => "bulk ingest",
            ExternalOp::RowAllocation => "row allocation",
        })
    }
}

/// Mutations refused by the controller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("row {0} does not exist in this draft")]
    UnknownRow(RowIndex),
    #[error("column {0:?} is not defined for this entity")]
    UnknownColumn(String),
    #[error("change category {0:?} is not one of the configured categories")]
    UnknownCategory(String),
    #[error("a {0} is still pending; wait for it to finish")]
    Busy(ExternalOp),
    #[error("no row index is left to allocate in this draft")]
    RowIndexExhausted,
}

/// Result of an edit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    /// The row is read-only (retired or discarded); nothing changed.
    Ignored,
}

/// Result of a retire toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Retired,
    Unretired,
    Discarded,
    /// The row was already discarded.
    Ignored,
}

/// Row-level lifecycle actions recorded for the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowAction {
    Retire,
    Unretire,
    Discard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub row_index: RowIndex,
    pub action: RowAction,
}

/// Answer to a request to navigate away from the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveDecision {
    Leave,
    /// Unsaved edits would be lost; the caller must confirm.
    ConfirmRequired,
}

/// One ingested record handed to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestRecord {
    /// Existing row to update, or `None` for a new row.
    pub target: Option<RowIndex>,
    pub values: FieldMap,
}

/// Counts of how ingested records were applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub inserted: usize,
    pub updated: usize,
    pub ignored: usize,
}

/// Interactive editing session over one draft.
#[derive(Debug)]
pub struct DraftSession {
    draft: Draft,
    categories: Option<BTreeSet<String>>,
    pending: Option<ExternalOp>,
    actions: Vec<ActionRecord>,
    saved: SavedState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SavedState {
    header: HeaderRecord,
    rows: Vec<ChangeRow>,
}

impl SavedState {
    fn capture(draft: &Draft) -> Self {
        Self {
            header: draft.header().to_record(),
            rows: capture_rows(draft),
        }
    }
}

impl DraftSession {
    pub fn new(draft: Draft) -> Self {
        let saved = SavedState::capture(&draft);
        Self {
            draft,
            categories: None,
            pending: None,
            actions: Vec::new(),
            saved,
        }
    }

    /// Restrict category selections to the given identifiers (placeholders are
    /// always accepted).
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.categories = Some(
            categories
                .into_iter()
                .map(|category| normalize_category(category.as_ref()))
                .collect(),
        );
        self
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Lifecycle toggles applied since the session opened or last saved.
    pub fn actions(&self) -> &[ActionRecord] {
        &self.actions
    }

    pub fn pending(&self) -> Option<ExternalOp> {
        self.pending
    }

    fn ensure_idle(&self) -> Result<(), DraftError> {
        match self.pending {
            Some(op) => Err(DraftError::Busy(op)),
            None => Ok(()),
        }
    }

    /// Suspend mutations while an external operation runs.
    pub fn begin_external(&mut self, op: ExternalOp) -> Result<(), DraftError> {
        self.ensure_idle()?;
        self.pending = Some(op);
        Ok(())
    }

    pub fn end_external(&mut self) {
        self.pending = None;
    }

    /// Set one business field.
    pub fn edit(
        &mut self,
        row_index: RowIndex,
        column: &str,
        value: &str,
    ) -> Result<EditOutcome, DraftError> {
        self.ensure_idle()?;
        let baseline = self.draft.baseline();
        if baseline.defines_columns() && !baseline.defines_column(column) {
            return Err(DraftError::UnknownColumn(column.to_string()));
        }
        let row = self
            .draft
            .row_mut(row_index)
            .ok_or(DraftError::UnknownRow(row_index))?;
        if row.is_read_only() {
            debug!(row_index, column, "ignoring edit on read-only row");
            return Ok(EditOutcome::Ignored);
        }
        row.fields.insert(column.to_string(), value.to_string());
        self.draft.refresh_row(row_index);
        Ok(EditOutcome::Applied)
    }

    /// Set the change comment; allowed on retired rows.
    pub fn set_comment(
        &mut self,
        row_index: RowIndex,
        value: &str,
    ) -> Result<EditOutcome, DraftError> {
        self.ensure_idle()?;
        let row = self
            .draft
            .row_mut(row_index)
            .ok_or(DraftError::UnknownRow(row_index))?;
        if row.discarded {
            debug!(row_index, "ignoring comment on discarded row");
            return Ok(EditOutcome::Ignored);
        }
        row.comment = value.to_string();
        self.draft.refresh_row(row_index);
        Ok(EditOutcome::Applied)
    }

    /// Retire or restore a baseline row; discard a new row.
    pub fn toggle_retire(&mut self, row_index: RowIndex) -> Result<ToggleOutcome, DraftError> {
        self.ensure_idle()?;
        let baseline_fields = {
            let row = self
                .draft
                .row(row_index)
                .ok_or(DraftError::UnknownRow(row_index))?;
            self.draft.baseline_row(row).map(|base| base.fields.clone())
        };
        let Some(row) = self.draft.row_mut(row_index) else {
            return Err(DraftError::UnknownRow(row_index));
        };

        let outcome = match baseline_fields {
            None if row.discarded => return Ok(ToggleOutcome::Ignored),
            None => {
                row.fields.clear();
                row.comment.clear();
                row.retire_snapshot = None;
                row.discarded = true;
                ToggleOutcome::Discarded
            }
            Some(baseline_fields) if row.retire_flag => {
                let snapshot = row.retire_snapshot.take();
                let mut restored = baseline_fields;
                if let Some(snapshot) = snapshot {
                    restored.extend(snapshot.fields);
                }
                row.fields = restored;
                row.retire_flag = false;
                ToggleOutcome::Unretired
            }
            Some(baseline_fields) => {
                row.retire_snapshot = Some(RetireSnapshot {
                    fields: std::mem::replace(&mut row.fields, baseline_fields),
                });
                row.retire_flag = true;
                ToggleOutcome::Retired
            }
        };
        self.draft.refresh_row(row_index);

        let action = match outcome {
            ToggleOutcome::Retired => RowAction::Retire,
            ToggleOutcome::Unretired => RowAction::Unretire,
            ToggleOutcome::Discarded | ToggleOutcome::Ignored => RowAction::Discard,
        };
        self.actions.push(ActionRecord { row_index, action });
        Ok(outcome)
    }

    /// Append a new, empty row and return its index.
    pub fn add_row(&mut self) -> Result<RowIndex, DraftError> {
        self.ensure_idle()?;
        self.draft.push_new_row().ok_or(DraftError::RowIndexExhausted)
    }

    /// Apply ingested records through the same contracts as manual edits.
    pub fn bulk_ingest(
        &mut self,
        records: Vec<IngestRecord>,
    ) -> Result<IngestSummary, DraftError> {
        self.ensure_idle()?;
        let mut summary = IngestSummary::default();
        for record in records {
            let (row_index, is_new) = match record.target {
                Some(row_index) => (row_index, false),
                None => (self.add_row()?, true),
            };
            let mut applied = is_new;
            for (column, value) in &record.values {
                if self.edit(row_index, column, value)? == EditOutcome::Applied {
                    applied = true;
                }
            }
            match (is_new, applied) {
                (true, _) => summary.inserted += 1,
                (false, true) => summary.updated += 1,
                (false, false) => summary.ignored += 1,
            }
        }
        Ok(summary)
    }

    pub fn set_header(&mut self, field: HeaderField, value: &str) -> Result<(), DraftError> {
        self.ensure_idle()?;
        if field == HeaderField::Category && !is_placeholder_category(value) {
            if let Some(categories) = self.categories.as_ref() {
                if !categories.contains(&normalize_category(value)) {
                    return Err(DraftError::UnknownCategory(value.to_string()));
                }
            }
        }
        self.draft.header.field_mut(field).set(value);
        Ok(())
    }

    /// Cosmetic expanded/collapsed state, persisted for continuity only.
    pub fn set_expanded(&mut self, expanded: bool) -> Result<(), DraftError> {
        self.ensure_idle()?;
        self.draft.header.expanded = expanded;
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.draft.is_dirty()
    }

    pub fn can_save(&self) -> bool {
        self.pending.is_none() && gate::is_saveable(&self.draft)
    }

    pub fn missing_requirements(&self) -> BTreeSet<gate::RequirementId> {
        gate::compute_missing_requirements(&self.draft)
    }

    pub fn is_submittable(&self) -> bool {
        gate::is_submittable(&self.draft)
    }

    /// True when rows or header differ from what was last opened or saved.
    pub fn has_unsaved_changes(&self) -> bool {
        SavedState::capture(&self.draft) != self.saved
    }

    pub fn request_leave(&self, confirmed: bool) -> LeaveDecision {
        if confirmed || !self.has_unsaved_changes() {
            LeaveDecision::Leave
        } else {
            LeaveDecision::ConfirmRequired
        }
    }

    /// Record a successful save: discarded rows leave the draft, header and
    /// row lifecycle references move to the saved state, and the action log
    /// restarts.
    pub fn mark_saved(&mut self) {
        self.draft.settle();
        self.saved = SavedState::capture(&self.draft);
        self.actions.clear();
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
