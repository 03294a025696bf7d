use super::{StorePaths, CHANGESET_REL};
use crate::draft::changeset::{ChangeSet, CHANGESET_SCHEMA_VERSION};
use crate::staging::StoreTxn;
use anyhow::{anyhow, Context, Result};
use std::fs;

/// The stored draft moved on since it was loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("draft was modified concurrently (expected lock_version {expected}, found {found})")]
pub struct SaveConflict {
    pub expected: u64,
    pub found: u64,
}

/// Load `draft/changeset.json`; `None` when no draft exists.
pub fn load_changeset(paths: &StorePaths) -> Result<Option<ChangeSet>> {
    let path = paths.changeset_path();
    if !path.is_file() {
        return Ok(None);
    }
    let bytes = fs::read(&path).with_context(|| format!("read {}", path.display()))?;
    let changeset: ChangeSet = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse change-set {}", path.display()))?;
    if changeset.schema_version != CHANGESET_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported change-set schema_version {} in {}",
            changeset.schema_version,
            path.display()
        ));
    }
    Ok(Some(changeset))
}

/// Like [`load_changeset`], but an unreadable file is logged and treated as
/// absent so a fresh draft can replace it.
pub fn load_changeset_lossy(paths: &StorePaths) -> Option<ChangeSet> {
    match load_changeset(paths) {
        Ok(changeset) => changeset,
        Err(err) => {
            tracing::warn!(
                error = %format!("{err:#}"),
                "change-set unreadable; treating draft as absent"
            );
            None
        }
    }
}

/// Optimistic concurrency check against the change-set currently on disk.
/// A missing or unreadable change-set counts as version 0.
pub fn check_lock_version(paths: &StorePaths, expected: u64) -> Result<()> {
    let found = load_changeset_lossy(paths).map_or(0, |changeset| changeset.lock_version);
    if found != expected {
        return Err(SaveConflict { expected, found }.into());
    }
    Ok(())
}

/// Stage a change-set for publication.
pub fn stage_changeset(txn: &StoreTxn, changeset: &ChangeSet) -> Result<()> {
    txn.stage_json(CHANGESET_REL, changeset)
}
