//! Change-set serialization and replay.
//!
//! A change-set is the persisted form of a draft: header metadata plus every
//! row that is still part of the proposal, each tagged with its visible
//! operation. Replaying a change-set over the same baseline reconstructs the
//! draft it was captured from.
use super::baseline::{Baseline, FieldMap, RowIdentity, RowIndex};
use super::header::{DraftHeader, HeaderRecord};
use super::model::{allocate_index, Draft, Row};
use super::operation::{ChangeOperation, RowOperation};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use tracing::warn;

/// Current schema version for `draft/changeset.json`.
pub const CHANGESET_SCHEMA_VERSION: u32 = 1;

/// Lifecycle status of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl ChangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeStatus::Draft => "DRAFT",
            ChangeStatus::Submitted => "SUBMITTED",
            ChangeStatus::Approved => "APPROVED",
            ChangeStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted row. `identity` is empty for new rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRow {
    pub row_index: RowIndex,
    #[serde(default)]
    pub identity: String,
    #[serde(default)]
    pub fields: FieldMap,
    #[serde(default)]
    pub comment: String,
    pub operation: ChangeOperation,
}

/// Persisted proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub schema_version: u32,
    pub entity: String,
    pub status: ChangeStatus,
    pub lock_version: u64,
    #[serde(default)]
    pub baseline_version: u32,
    pub next_row_index: RowIndex,
    #[serde(default)]
    pub header: HeaderRecord,
    #[serde(default)]
    pub rows: Vec<ChangeRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at_epoch_ms: Option<u128>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at_epoch_ms: Option<u128>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_note: Option<String>,
}

impl ChangeSet {
    /// Capture a draft. Discarded rows are not representable and are skipped.
    pub fn capture(draft: &Draft, status: ChangeStatus, lock_version: u64) -> Self {
        Self {
            schema_version: CHANGESET_SCHEMA_VERSION,
            entity: draft.entity().to_string(),
            status,
            lock_version,
            baseline_version: draft.baseline().version,
            next_row_index: draft.next_row_index(),
            header: draft.header().to_record(),
            rows: capture_rows(draft),
            submitted_at_epoch_ms: None,
            decided_at_epoch_ms: None,
            decision_note: None,
        }
    }

    /// Operation counts for status and audit summaries.
    pub fn operation_counts(&self) -> BTreeMap<ChangeOperation, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            *counts.entry(row.operation).or_insert(0) += 1;
        }
        counts
    }
}

/// Rows of a draft in persisted form.
pub fn capture_rows(draft: &Draft) -> Vec<ChangeRow> {
    draft
        .rows()
        .iter()
        .filter_map(|row| {
            let operation = row.operation().visible()?;
            Some(ChangeRow {
                row_index: row.row_index(),
                identity: row
                    .identity()
                    .map(RowIdentity::to_string)
                    .unwrap_or_default(),
                fields: row.fields().clone(),
                comment: row.comment().to_string(),
                operation,
            })
        })
        .collect()
}

/// Reconstruct the draft a change-set was captured from.
///
/// Stored rows whose identity the baseline no longer knows become new rows,
/// except retirements of vanished rows, which are dropped. Baseline rows the
/// change-set does not mention are appended at `KEEP`.
pub fn replay(baseline: Baseline, changeset: &ChangeSet) -> Draft {
    let mut rows: Vec<Row> = Vec::with_capacity(changeset.rows.len());
    let mut used_indices: HashSet<RowIndex> = HashSet::new();
    let mut used_identities: HashSet<RowIdentity> = HashSet::new();
    let mut next_row_index = changeset
        .rows
        .iter()
        .filter_map(|row| row.row_index.checked_add(1))
        .max()
        .unwrap_or(1)
        .max(changeset.next_row_index);

    for stored in &changeset.rows {
        let usable = stored.row_index < RowIndex::MAX && used_indices.insert(stored.row_index);
        let row_index = if usable {
            stored.row_index
        } else {
            warn!(
                row_index = stored.row_index,
                "duplicate or out-of-range row index; reassigning"
            );
            let Some(reassigned) = allocate_index(&mut next_row_index) else {
                warn!(row_index = stored.row_index, "no row index left; dropping row");
                continue;
            };
            used_indices.insert(reassigned);
            reassigned
        };

        let base = RowIdentity::new(stored.identity.as_str())
            .filter(|identity| !used_identities.contains(identity))
            .and_then(|identity| baseline.row(&identity));
        let row = match base {
            Some(base) => {
                used_identities.insert(base.identity.clone());
                let mut row = Row::from_baseline(row_index, base);
                row.comment = stored.comment.clone();
                if stored.operation == ChangeOperation::Retire {
                    row.retire_flag = true;
                } else {
                    let mut fields = base
                        .fields
                        .keys()
                        .map(|key| (key.clone(), String::new()))
                        .collect::<FieldMap>();
                    fields.extend(stored.fields.clone());
                    row.fields = fields;
                }
                row
            }
            None if stored.operation == ChangeOperation::Retire => {
                warn!(
                    row_index,
                    identity = %stored.identity,
                    "retired row no longer in baseline; dropping"
                );
                continue;
            }
            None => {
                if !stored.identity.trim().is_empty() {
                    warn!(
                        row_index,
                        identity = %stored.identity,
                        "row identity not in baseline; treating as new"
                    );
                }
                let mut row = Row::new_insert(row_index);
                row.fields = stored.fields.clone();
                row.comment = stored.comment.clone();
                row
            }
        };
        rows.push(row);
    }

    for base in &baseline.rows {
        if used_identities.contains(&base.identity) {
            continue;
        }
        let Some(row_index) = allocate_index(&mut next_row_index) else {
            warn!(identity = %base.identity, "no row index left; dropping baseline row");
            continue;
        };
        warn!(identity = %base.identity, "baseline row missing from change-set; keeping");
        rows.push(Row::from_baseline(row_index, base));
    }

    let header = DraftHeader::opened(&changeset.header);
    let mut draft = Draft::assemble(baseline, rows, header, next_row_index);
    draft.settle();
    draft
}

/// Structural checks a stored change-set must pass before it can be
/// submitted. All failures are reported together.
pub fn integrity_errors(baseline: &Baseline, changeset: &ChangeSet) -> Vec<String> {
    let mut errors = Vec::new();
    let mut indices = BTreeSet::new();
    let mut identities = BTreeSet::new();

    for stored in &changeset.rows {
        let label = format!("row {}", stored.row_index);
        if stored.row_index == RowIndex::MAX {
            errors.push(format!("{label}: row index out of range"));
        }
        if !indices.insert(stored.row_index) {
            errors.push(format!("{label}: duplicate row index"));
        }
        let identity = RowIdentity::new(stored.identity.as_str());
        if let Some(identity) = identity.as_ref() {
            if !identities.insert(identity.clone()) {
                errors.push(format!("{label}: identity {identity} appears more than once"));
            }
        }
        match (stored.operation, identity.as_ref()) {
            (ChangeOperation::Insert, Some(_)) => {
                errors.push(format!("{label}: INSERT must not carry an identity"));
            }
            (op, None) if op.targets_baseline() => {
                errors.push(format!("{label}: {op} requires an identity"));
            }
            (op, Some(identity)) if baseline.row(identity).is_none() => {
                errors.push(format!(
                    "{label}: {op} targets {identity}, which is not in the latest approved version"
                ));
            }
            _ => {}
        }
        if baseline.defines_columns() {
            let undefined = stored
                .fields
                .iter()
                .filter(|(key, value)| !value.trim().is_empty() && !baseline.defines_column(key))
                .map(|(key, _)| key.as_str())
                .collect::<Vec<_>>();
            if !undefined.is_empty() {
                errors.push(format!(
                    "{label}: populates columns not defined for this entity: {}",
                    undefined.join(", ")
                ));
            }
        }
    }

    for base in &baseline.rows {
        if !identities.contains(&base.identity) {
            errors.push(format!(
                "baseline row {} is missing from the change-set",
                base.identity
            ));
        }
    }

    if errors.is_empty() {
        let draft = replay(baseline.clone(), changeset);
        for stored in &changeset.rows {
            let Some(derived) = draft.row(stored.row_index).map(Row::operation) else {
                continue;
            };
            if !stored_matches(stored.operation, derived) {
                errors.push(format!(
                    "row {}: stored operation {} does not match derived {}",
                    stored.row_index, stored.operation, derived
                ));
            }
        }
    }
    errors
}

fn stored_matches(stored: ChangeOperation, derived: RowOperation) -> bool {
    match stored {
        ChangeOperation::Unretire => {
            matches!(derived, RowOperation::Keep | RowOperation::Update)
        }
        other => RowOperation::from(other) == derived,
    }
}

/// Change-set rejected by the integrity checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("change-set failed integrity checks: {}", .errors.join("; "))]
pub struct ChangeSetInvalid {
    pub errors: Vec<String>,
}

#[cfg(test)]
#[path = "changeset_tests.rs"]
mod tests;
