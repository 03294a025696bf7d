//! Workflow diff step: review the stored proposal against the baseline.
use super::StoreContext;
use crate::cli::DiffArgs;
use crate::draft::{diff_draft, ChangeOperation, RowDiff};
use crate::util::truncate_string;
use anyhow::Result;

const CELL_TEXT_CHARS: usize = 40;

/// Row diffs for the stored draft. Unless `all` is set, `KEEP` rows and
/// unchanged cells are dropped.
pub(crate) fn draft_diff(ctx: &StoreContext, all: bool) -> Result<Vec<RowDiff>> {
    let rows = diff_draft(&ctx.open_draft()?);
    Ok(if all { rows } else { changes_only(rows) })
}

pub(crate) fn changes_only(mut rows: Vec<RowDiff>) -> Vec<RowDiff> {
    rows.retain(|row| row.operation != ChangeOperation::Keep);
    for row in &mut rows {
        row.cells.retain(|cell| cell.changed);
        if row.comment.as_ref().is_some_and(|comment| !comment.changed) {
            row.comment = None;
        }
    }
    rows
}

/// Run the diff command.
pub fn run_diff(args: &DiffArgs) -> Result<()> {
    let ctx = StoreContext::load(args.store.clone())?;
    let rows = draft_diff(&ctx, args.all)?;
    if args.json {
        let text = serde_json::to_string_pretty(&rows)?;
        println!("{text}");
        return Ok(());
    }
    if rows.is_empty() {
        println!("no changes against baseline v{}", ctx.baseline.version);
        return Ok(());
    }
    print_rows(&rows);
    Ok(())
}

pub(crate) fn print_rows(rows: &[RowDiff]) {
    for row in rows {
        println!("{} row {} ({})", row.operation, row.row_index, row.key);
        for cell in row.cells.iter().chain(row.comment.as_ref()) {
            let marker = if cell.changed { "~" } else { " " };
            println!(
                "  {marker} {}: {:?} -> {:?}",
                cell.column,
                truncate_string(&cell.before, CELL_TEXT_CHARS),
                truncate_string(&cell.after, CELL_TEXT_CHARS)
            );
        }
    }
}
