//! Append-only audit trail of saves, submissions, and decisions.
use super::{StorePaths, HISTORY_REL, HISTORY_SCHEMA_VERSION};
use crate::draft::changeset::{ChangeSet, ChangeStatus};
use crate::draft::controller::ActionRecord;
use crate::draft::operation::ChangeOperation;
use crate::staging::StoreTxn;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, BufReader};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryStep {
    Init,
    Save,
    Submit,
    Approve,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub row_index: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub identity: String,
    pub operation: ChangeOperation,
}

/// One line of `history.jsonl`. Only substantive rows are listed; discarded
/// rows never reach a change-set, so they never reach the trail either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub schema_version: u32,
    pub at_epoch_ms: u128,
    pub step: HistoryStep,
    pub entity: String,
    pub lock_version: u64,
    pub status: ChangeStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionRecord>,
    #[serde(default)]
    pub rows: Vec<HistoryRow>,
}

impl HistoryEntry {
    pub fn for_changeset(
        step: HistoryStep,
        changeset: &ChangeSet,
        actions: &[ActionRecord],
    ) -> Result<Self> {
        Ok(Self {
            schema_version: HISTORY_SCHEMA_VERSION,
            at_epoch_ms: now_epoch_ms()?,
            step,
            entity: changeset.entity.clone(),
            lock_version: changeset.lock_version,
            status: changeset.status,
            actions: actions.to_vec(),
            rows: changeset
                .rows
                .iter()
                .filter(|row| row.operation.is_substantive())
                .map(|row| HistoryRow {
                    row_index: row.row_index,
                    identity: row.identity.clone(),
                    operation: row.operation,
                })
                .collect(),
        })
    }
}

pub fn now_epoch_ms() -> Result<u128> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("compute timestamp")?
        .as_millis())
}

/// Stage the trail with one more JSONL entry so it publishes together with
/// the change-set it describes. An unreadable trail fails the transaction.
pub fn stage_history(txn: &StoreTxn, paths: &StorePaths, entry: &HistoryEntry) -> Result<()> {
    let path = paths.history_path();
    let mut bytes = if path.exists() {
        fs::read(&path).with_context(|| format!("read {}", path.display()))?
    } else {
        Vec::new()
    };
    if bytes.last().is_some_and(|last| *last != b'\n') {
        bytes.push(b'\n');
    }
    serde_json::to_writer(&mut bytes, entry).context("serialize history entry")?;
    bytes.push(b'\n');
    txn.stage_bytes(HISTORY_REL, &bytes)
}

/// Read every history entry; unparsable lines are skipped with a warning.
pub fn load_history(paths: &StorePaths) -> Result<Vec<HistoryEntry>> {
    let path = paths.history_path();
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let file = fs::File::open(&path).with_context(|| format!("open {}", path.display()))?;
    let mut entries = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(entry) => entries.push(entry),
            Err(err) => {
                tracing::warn!(line = line_no + 1, %err, "skipping unreadable history entry");
            }
        }
    }
    Ok(entries)
}
