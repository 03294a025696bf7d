//! Authoritative processing boundary: save and submit.
//!
//! Both steps re-check the stored `lock_version` before publishing and stage
//! their audit entry in the same transaction as the change-set. Submit
//! re-derives everything from the stored change-set rather than trusting the
//! session that produced it.
use super::StoreContext;
use crate::cli::SubmitArgs;
use crate::draft::{
    ensure_submittable, integrity_errors, replay, BaselineProvider, ChangeSet, ChangeSetInvalid,
    ChangeStatus, DraftSession, ExternalOp,
};
use crate::staging::StoreTxn;
use crate::store::{self, HistoryEntry, HistoryStep};
use anyhow::{anyhow, Result};
use tracing::info;

/// Persist the session's draft as the next change-set version.
///
/// Refused when nothing is dirty. On success the session is marked saved and
/// `lock_version` advances to the published version.
pub(crate) fn save_session(
    ctx: &StoreContext,
    session: &mut DraftSession,
    lock_version: &mut u64,
) -> Result<ChangeSet> {
    if !session.can_save() {
        return Err(anyhow!("nothing to save: the draft has no changes"));
    }
    session.begin_external(ExternalOp::Save)?;
    let saved = publish_draft(ctx, session, *lock_version);
    session.end_external();
    let changeset = saved?;
    session.mark_saved();
    *lock_version = changeset.lock_version;
    info!(
        lock_version = changeset.lock_version,
        rows = changeset.rows.len(),
        "saved draft"
    );
    Ok(changeset)
}

fn publish_draft(ctx: &StoreContext, session: &DraftSession, expected: u64) -> Result<ChangeSet> {
    store::check_lock_version(&ctx.paths, expected)?;
    let changeset = ChangeSet::capture(session.draft(), ChangeStatus::Draft, expected + 1);
    let txn = StoreTxn::begin(&ctx.paths)?;
    store::stage_changeset(&txn, &changeset)?;
    let entry = HistoryEntry::for_changeset(HistoryStep::Save, &changeset, session.actions())?;
    store::stage_history(&txn, &ctx.paths, &entry)?;
    txn.publish()?;
    Ok(changeset)
}

/// Submit from inside a session. The session must have no unsaved changes;
/// what gets submitted is what is on disk.
pub(crate) fn submit_session(ctx: &StoreContext, session: &mut DraftSession) -> Result<ChangeSet> {
    if session.has_unsaved_changes() {
        return Err(anyhow!("save the draft before submitting it"));
    }
    session.begin_external(ExternalOp::Submit)?;
    let submitted = submit_stored(ctx);
    session.end_external();
    submitted
}

/// Reload the stored change-set, check its integrity, replay it over the
/// latest approved baseline, and enforce the submission gate.
pub(crate) fn submit_stored(ctx: &StoreContext) -> Result<ChangeSet> {
    let stored = store::load_changeset(&ctx.paths)?
        .ok_or_else(|| anyhow!("no draft to submit in {}", ctx.paths.root().display()))?;
    if stored.status != ChangeStatus::Draft {
        return Err(anyhow!("draft is {} and cannot be submitted", stored.status));
    }
    let baseline = store::FileBaselineProvider::new(ctx.paths.clone())
        .latest_approved(&ctx.config.entity);

    let errors = integrity_errors(&baseline, &stored);
    if !errors.is_empty() {
        return Err(ChangeSetInvalid { errors }.into());
    }
    let draft = replay(baseline, &stored);
    ensure_submittable(&draft)?;

    let mut submitted = stored.clone();
    submitted.status = ChangeStatus::Submitted;
    submitted.lock_version = stored.lock_version + 1;
    submitted.submitted_at_epoch_ms = Some(store::now_epoch_ms()?);

    store::check_lock_version(&ctx.paths, stored.lock_version)?;
    let txn = StoreTxn::begin(&ctx.paths)?;
    store::stage_changeset(&txn, &submitted)?;
    let entry = HistoryEntry::for_changeset(HistoryStep::Submit, &submitted, &[])?;
    store::stage_history(&txn, &ctx.paths, &entry)?;
    txn.publish()?;
    info!(
        lock_version = submitted.lock_version,
        "submitted draft for approval"
    );
    Ok(submitted)
}

/// Run the standalone submit command.
pub fn run_submit(args: &SubmitArgs) -> Result<()> {
    let ctx = StoreContext::load(args.store.clone())?;
    let submitted = submit_stored(&ctx)?;
    println!(
        "submitted {} draft (lock_version {})",
        submitted.entity, submitted.lock_version
    );
    Ok(())
}
