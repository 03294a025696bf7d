//! Workflow init step.
//!
//! Init creates the store on first use and opens a fresh draft over the
//! latest approved baseline. An existing config is kept; a baseline file
//! placed in the store before init is adopted as the approved snapshot.
use crate::cli::InitArgs;
use crate::draft::{Baseline, BaselineProvider, ChangeSet, ChangeStatus, Draft};
use crate::staging::StoreTxn;
use crate::store::{self, HistoryEntry, HistoryStep, StorePaths};
use anyhow::{anyhow, Context, Result};
use std::fs;

/// Run the init step.
pub fn run_init(args: &InitArgs) -> Result<()> {
    let entity = args.entity.trim();
    store::validate_entity_name(entity)?;
    fs::create_dir_all(&args.store)
        .with_context(|| format!("create store root {}", args.store.display()))?;
    let root = args
        .store
        .canonicalize()
        .with_context(|| format!("resolve store root {}", args.store.display()))?;
    let paths = StorePaths::new(root);

    let config = if paths.config_path().is_file() {
        let config = store::load_config(paths.root())?;
        store::validate_config(&config)?;
        if config.entity != entity {
            return Err(anyhow!(
                "store {} holds entity {:?}, not {:?}",
                paths.root().display(),
                config.entity,
                entity
            ));
        }
        config
    } else {
        store::default_config(entity)
    };

    let previous = store::load_changeset_lossy(&paths);
    if let Some(previous) = previous.as_ref() {
        let open = matches!(
            previous.status,
            ChangeStatus::Draft | ChangeStatus::Submitted
        );
        if open && !args.force {
            return Err(anyhow!(
                "a {} draft already exists at {} (use --force to supersede it)",
                previous.status,
                paths.changeset_path().display()
            ));
        }
        if open {
            tracing::warn!(status = %previous.status, "superseding open draft");
        }
    }

    let baseline_exists = paths.baseline_path().is_file();
    let baseline = if baseline_exists {
        store::FileBaselineProvider::new(paths.clone()).latest_approved(entity)
    } else {
        Baseline::empty(entity)
    };
    let lock_version = previous
        .as_ref()
        .map_or(0, |changeset| changeset.lock_version)
        + 1;
    let changeset = ChangeSet::capture(
        &Draft::from_baseline(baseline.clone()),
        ChangeStatus::Draft,
        lock_version,
    );

    let txn = StoreTxn::begin(&paths)?;
    store::stage_config(&txn, &config)?;
    if baseline_exists {
        store::stage_baseline_archive(&txn, &paths, &baseline)?;
    } else {
        store::stage_baseline(&txn, &baseline)?;
    }
    store::stage_changeset(&txn, &changeset)?;
    let entry = HistoryEntry::for_changeset(HistoryStep::Init, &changeset, &[])?;
    store::stage_history(&txn, &paths, &entry)?;
    let published = txn.publish()?;

    for path in published {
        println!("wrote {}", path.display());
    }
    tracing::info!(
        entity,
        baseline_version = baseline.version,
        rows = baseline.rows.len(),
        "opened draft"
    );
    Ok(())
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
