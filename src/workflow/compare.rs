//! Workflow compare step: one approved version against another.
use super::diff::{changes_only, print_rows};
use super::StoreContext;
use crate::cli::CompareArgs;
use crate::draft::{diff_baselines, RowDiff};
use crate::store;
use anyhow::{anyhow, Result};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct VersionComparison {
    pub entity: String,
    pub from: u32,
    pub to: u32,
    pub rows: Vec<RowDiff>,
}

/// Diff two kept approved versions. `to` defaults to the current baseline
/// and `from` to the version just before `to`.
pub(crate) fn compare_versions(
    ctx: &StoreContext,
    from: Option<u32>,
    to: Option<u32>,
    all: bool,
) -> Result<VersionComparison> {
    let entity = ctx.config.entity.as_str();
    let to = to.unwrap_or(ctx.baseline.version);
    let from = match from {
        Some(from) => from,
        None => to
            .checked_sub(1)
            .ok_or_else(|| anyhow!("v{to} has no earlier version; pass --from"))?,
    };
    let older = store::load_baseline_version(&ctx.paths, entity, from)?;
    let newer = store::load_baseline_version(&ctx.paths, entity, to)?;
    let rows = diff_baselines(&older, &newer);
    Ok(VersionComparison {
        entity: entity.to_string(),
        from,
        to,
        rows: if all { rows } else { changes_only(rows) },
    })
}

/// Run the compare command.
pub fn run_compare(args: &CompareArgs) -> Result<()> {
    let ctx = StoreContext::load(args.store.clone())?;
    let comparison = compare_versions(&ctx, args.from, args.to, args.all)?;
    if args.json {
        let text = serde_json::to_string_pretty(&comparison)?;
        println!("{text}");
        return Ok(());
    }
    if comparison.rows.is_empty() {
        println!("no changes between v{} and v{}", comparison.from, comparison.to);
        return Ok(());
    }
    println!("{} v{} -> v{}", comparison.entity, comparison.from, comparison.to);
    print_rows(&comparison.rows);
    Ok(())
}
