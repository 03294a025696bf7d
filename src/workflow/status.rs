//! Workflow status step.
//!
//! Status summarizes the store without side effects and names the next
//! command to run.
use super::StoreContext;
use crate::cli::StatusArgs;
use crate::draft::{
    evaluate_requirements, integrity_errors, ChangeStatus, HeaderRecord, RequirementState,
    RequirementStatus,
};
use crate::store;
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub store: String,
    pub entity: String,
    pub baseline_version: u32,
    pub baseline_rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<DraftStatus>,
    pub history_entries: usize,
    pub next_action: NextAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftStatus {
    pub status: ChangeStatus,
    pub lock_version: u64,
    pub header: HeaderRecord,
    pub rows: usize,
    pub operations: BTreeMap<String, usize>,
    pub requirements: Vec<RequirementStatus>,
    pub submittable: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub integrity_errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextAction {
    pub command: String,
    pub reason: String,
}

/// Build a status summary for a store.
pub fn status_summary_for_store(store_root: PathBuf) -> Result<StatusSummary> {
    let ctx = StoreContext::load(store_root)?;
    let root = ctx.paths.root().display().to_string();
    let draft = ctx
        .changeset
        .as_ref()
        .map(|changeset| -> Result<DraftStatus> {
            let draft = ctx.open_draft()?;
            let requirements = evaluate_requirements(&draft);
            let submittable = requirements
                .iter()
                .all(|requirement| requirement.status == RequirementState::Met);
            Ok(DraftStatus {
                status: changeset.status,
                lock_version: changeset.lock_version,
                header: changeset.header.clone(),
                rows: changeset.rows.len(),
                operations: changeset
                    .operation_counts()
                    .into_iter()
                    .map(|(op, count)| (op.as_str().to_string(), count))
                    .collect(),
                requirements,
                submittable,
                integrity_errors: integrity_errors(&ctx.baseline, changeset),
                decision_note: changeset.decision_note.clone(),
            })
        })
        .transpose()?;
    let next_action = next_action(&root, &ctx.config.entity, draft.as_ref());
    Ok(StatusSummary {
        store: root,
        entity: ctx.config.entity.clone(),
        baseline_version: ctx.baseline.version,
        baseline_rows: ctx.baseline.rows.len(),
        draft,
        history_entries: store::load_history(&ctx.paths)?.len(),
        next_action,
    })
}

fn next_action(root: &str, entity: &str, draft: Option<&DraftStatus>) -> NextAction {
    let init = format!("refdraft init --store {root} --entity {entity}");
    let Some(draft) = draft else {
        return NextAction {
            command: init,
            reason: "no draft is open".to_string(),
        };
    };
    match draft.status {
        ChangeStatus::Draft if !draft.integrity_errors.is_empty() => NextAction {
            command: format!("{init} --force"),
            reason: "stored draft fails integrity checks; start a new draft".to_string(),
        },
        ChangeStatus::Draft if !draft.submittable => NextAction {
            command: format!("refdraft session --store {root} --actions <FILE>"),
            reason: format!(
                "missing requirements: {}",
                draft
                    .requirements
                    .iter()
                    .filter(|requirement| requirement.status == RequirementState::Unmet)
                    .map(|requirement| requirement.id.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        },
        ChangeStatus::Draft => NextAction {
            command: format!("refdraft submit --store {root}"),
            reason: "draft is complete".to_string(),
        },
        ChangeStatus::Submitted => NextAction {
            command: format!("refdraft decide --store {root} --approve"),
            reason: "awaiting checker decision".to_string(),
        },
        ChangeStatus::Approved | ChangeStatus::Rejected => NextAction {
            command: init,
            reason: format!("draft was {}", draft.status.as_str().to_lowercase()),
        },
    }
}

/// Run the status command.
pub fn run_status(args: &StatusArgs) -> Result<()> {
    let summary = status_summary_for_store(args.store.clone())?;
    if args.json {
        let text = serde_json::to_string_pretty(&summary)?;
        println!("{text}");
        return Ok(());
    }
    println!(
        "entity: {} (baseline v{}, {} rows)",
        summary.entity, summary.baseline_version, summary.baseline_rows
    );
    if let Some(draft) = summary.draft.as_ref() {
        println!("draft: {} (lock_version {})", draft.status, draft.lock_version);
        let operations = draft
            .operations
            .iter()
            .map(|(op, count)| format!("{op}={count}"))
            .collect::<Vec<_>>();
        println!("rows: {} [{}]", draft.rows, operations.join(" "));
        for requirement in &draft.requirements {
            let mark = match requirement.status {
                RequirementState::Met => "ok",
                RequirementState::Unmet => "missing",
            };
            match requirement.hint.as_deref() {
                Some(hint) => println!("  {mark:<8}{} ({hint})", requirement.id),
                None => println!("  {mark:<8}{}", requirement.id),
            }
        }
        for error in &draft.integrity_errors {
            println!("  invalid {error}");
        }
        if let Some(note) = draft.decision_note.as_deref() {
            println!("decision note: {note}");
        }
    }
    println!(
        "next: {} ({})",
        summary.next_action.command, summary.next_action.reason
    );
    Ok(())
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
