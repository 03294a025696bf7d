//! Workflow decide step: the checker approves or rejects a submitted draft.
//!
//! Approval promotes the proposed dataset to the next baseline version.
//! The new baseline and its archive copy publish in one transaction with the
//! decided change-set and the audit entry.
use super::StoreContext;
use crate::cli::DecideArgs;
use crate::draft::{
    integrity_errors, replay, Baseline, BaselineRow, ChangeSet, ChangeSetInvalid, ChangeStatus,
    Draft, RowIdentity,
};
use crate::draft::operation::RowOperation;
use crate::staging::StoreTxn;
use crate::store::{self, HistoryEntry, HistoryStep};
use crate::util::sha256_hex;
use anyhow::{anyhow, Result};
use tracing::info;

const NEW_IDENTITY_CHARS: usize = 16;

/// Checker decision on a submitted draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn status(self) -> ChangeStatus {
        match self {
            Decision::Approve => ChangeStatus::Approved,
            Decision::Reject => ChangeStatus::Rejected,
        }
    }

    fn step(self) -> HistoryStep {
        match self {
            Decision::Approve => HistoryStep::Approve,
            Decision::Reject => HistoryStep::Reject,
        }
    }
}

/// Build the next approved snapshot from a replayed draft: every row that is
/// neither retired nor discarded, in draft order. Baseline rows keep their
/// identity; new rows get one derived from entity, version, and row index.
/// `KEEP` rows carry their baseline values verbatim, so whitespace-only
/// edits never reach the snapshot.
pub fn promote_draft(draft: &Draft) -> Baseline {
    let baseline = draft.baseline();
    let version = baseline.version + 1;
    let rows = draft
        .rows()
        .iter()
        .filter(|row| !row.is_retired() && !row.is_discarded())
        .filter_map(|row| {
            if row.operation() == RowOperation::Keep {
                if let Some(base) = draft.baseline_row(row) {
                    return Some(base.clone());
                }
            }
            let identity = match row.identity() {
                Some(identity) => Some(identity.clone()),
                None => RowIdentity::new(new_row_identity(
                    &baseline.entity,
                    version,
                    row.row_index(),
                )),
            }?;
            Some(BaselineRow {
                identity,
                fields: row.fields().clone(),
                comment: row.comment().to_string(),
            })
        })
        .collect();
    Baseline {
        entity: baseline.entity.clone(),
        version,
        columns: baseline.columns.clone(),
        rows,
    }
}

fn new_row_identity(entity: &str, version: u32, row_index: u32) -> String {
    sha256_hex(format!("{entity}:{version}:{row_index}").as_bytes())
        .chars()
        .take(NEW_IDENTITY_CHARS)
        .collect()
}

/// Record a decision on the stored draft, which must be `SUBMITTED`.
pub(crate) fn decide(
    ctx: &StoreContext,
    decision: Decision,
    note: Option<&str>,
) -> Result<ChangeSet> {
    let submitted = ctx.require_status(ChangeStatus::Submitted)?;
    let promoted = match decision {
        Decision::Approve => Some(promote_submitted(ctx, submitted)?),
        Decision::Reject => None,
    };

    let mut decided = submitted.clone();
    decided.status = decision.status();
    decided.lock_version = submitted.lock_version + 1;
    decided.decided_at_epoch_ms = Some(store::now_epoch_ms()?);
    decided.decision_note = note
        .map(str::trim)
        .filter(|note| !note.is_empty())
        .map(str::to_string);

    store::check_lock_version(&ctx.paths, submitted.lock_version)?;
    let txn = StoreTxn::begin(&ctx.paths)?;
    if let Some(baseline) = promoted.as_ref() {
        store::stage_baseline_archive(&txn, &ctx.paths, &ctx.baseline)?;
        store::stage_baseline(&txn, baseline)?;
    }
    store::stage_changeset(&txn, &decided)?;
    let entry = HistoryEntry::for_changeset(decision.step(), &decided, &[])?;
    store::stage_history(&txn, &ctx.paths, &entry)?;
    txn.publish()?;
    info!(
        status = %decided.status,
        lock_version = decided.lock_version,
        baseline_version = promoted.as_ref().map(|baseline| baseline.version),
        "recorded decision"
    );
    Ok(decided)
}

fn promote_submitted(ctx: &StoreContext, submitted: &ChangeSet) -> Result<Baseline> {
    if submitted.baseline_version != ctx.baseline.version {
        return Err(anyhow!(
            "draft was prepared against baseline v{} but the store holds v{}",
            submitted.baseline_version,
            ctx.baseline.version
        ));
    }
    let errors = integrity_errors(&ctx.baseline, submitted);
    if !errors.is_empty() {
        return Err(ChangeSetInvalid { errors }.into());
    }
    Ok(promote_draft(&replay(ctx.baseline.clone(), submitted)))
}

/// Run the decide command.
pub fn run_decide(args: &DecideArgs) -> Result<()> {
    let ctx = StoreContext::load(args.store.clone())?;
    let decision = if args.approve {
        Decision::Approve
    } else {
        Decision::Reject
    };
    let decided = decide(&ctx, decision, args.note.as_deref())?;
    match decision {
        Decision::Approve => println!(
            "approved {} draft; baseline is now v{}",
            decided.entity,
            ctx.baseline.version + 1
        ),
        Decision::Reject => println!("rejected {} draft", decided.entity),
    }
    Ok(())
}
