//! Scripted editing sessions.
//!
//! A session opens the stored draft once, applies a JSON-lines action script
//! in order, and ends with the navigate-away guard: leaving with unsaved
//! changes fails unless the caller confirmed it.
use super::boundary::{save_session, submit_session};
use super::StoreContext;
use crate::cli::SessionArgs;
use crate::draft::{
    DraftSession, EditOutcome, HeaderField, LeaveDecision, RequirementId, RowIndex, ToggleOutcome,
};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// One line of an action script.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SessionAction {
    Edit {
        row: RowIndex,
        column: String,
        value: String,
    },
    Comment {
        row: RowIndex,
        value: String,
    },
    ToggleRetire {
        row: RowIndex,
    },
    AddRow,
    SetReason {
        value: String,
    },
    SetTicketRef {
        value: String,
    },
    SetCategory {
        value: String,
    },
    SetExpanded {
        value: bool,
    },
    Save,
    Submit,
}

impl SessionAction {
    fn name(&self) -> &'static str {
        match self {
            SessionAction::Edit { .. } => "edit",
            SessionAction::Comment { .. } => "comment",
            SessionAction::ToggleRetire { .. } => "toggle_retire",
            SessionAction::AddRow => "add_row",
            SessionAction::SetReason { .. } => "set_reason",
            SessionAction::SetTicketRef { .. } => "set_ticket_ref",
            SessionAction::SetCategory { .. } => "set_category",
            SessionAction::SetExpanded { .. } => "set_expanded",
            SessionAction::Save => "save",
            SessionAction::Submit => "submit",
        }
    }
}

/// What one action did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    pub line: usize,
    pub action: &'static str,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<RowIndex>,
}

/// Session summary printed at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub outcomes: Vec<ActionOutcome>,
    pub saves: usize,
    pub submitted: bool,
    pub lock_version: u64,
    pub dirty: bool,
    pub discarded_unsaved: bool,
    pub missing_requirements: BTreeSet<RequirementId>,
}

/// Parse a JSON-lines action script. Blank lines and `#` comments are skipped.
pub fn parse_actions(text: &str) -> Result<Vec<(usize, SessionAction)>> {
    let mut actions = Vec::new();
    for (pos, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let action = serde_json::from_str(trimmed)
            .with_context(|| format!("parse action on line {}", pos + 1))?;
        actions.push((pos + 1, action));
    }
    Ok(actions)
}

fn read_script(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("read actions from stdin")?;
        return Ok(text);
    }
    fs::read_to_string(path).with_context(|| format!("read actions {}", path.display()))
}

/// Run the session command.
pub fn run_session(args: &SessionArgs) -> Result<()> {
    let ctx = StoreContext::load(args.store.clone())?;
    let actions = parse_actions(&read_script(&args.actions)?)?;
    let report = apply_script(&ctx, actions, args.discard_unsaved)?;
    if args.json {
        let text = serde_json::to_string_pretty(&report)?;
        println!("{text}");
    } else {
        for outcome in &report.outcomes {
            match outcome.row {
                Some(row) => println!(
                    "{:>4}  {:<14} row {:<5} {}",
                    outcome.line, outcome.action, row, outcome.outcome
                ),
                None => println!(
                    "{:>4}  {:<14} {}",
                    outcome.line, outcome.action, outcome.outcome
                ),
            }
        }
        println!(
            "saves: {}  submitted: {}  lock_version: {}",
            report.saves, report.submitted, report.lock_version
        );
        if report.discarded_unsaved {
            println!("unsaved changes discarded");
        }
    }
    Ok(())
}

/// Apply actions in order inside one session over the stored draft.
pub(crate) fn apply_script(
    ctx: &StoreContext,
    actions: Vec<(usize, SessionAction)>,
    discard_unsaved: bool,
) -> Result<SessionReport> {
    let (mut session, mut lock_version) = ctx.open_session()?;
    let mut outcomes = Vec::with_capacity(actions.len());
    let mut saves = 0;
    let mut submitted = false;

    for (line, action) in actions {
        if submitted {
            return Err(anyhow!(
                "line {line}: the draft was submitted; no further actions are accepted"
            ));
        }
        let name = action.name();
        debug!(line, action = name, "applying action");
        let (outcome, row) = match action {
            SessionAction::Save => {
                let changeset = save_session(ctx, &mut session, &mut lock_version)
                    .with_context(|| format!("line {line}: save"))?;
                saves += 1;
                (format!("saved (lock_version {})", changeset.lock_version), None)
            }
            SessionAction::Submit => {
                let changeset = submit_session(ctx, &mut session)
                    .with_context(|| format!("line {line}: submit"))?;
                lock_version = changeset.lock_version;
                submitted = true;
                ("submitted".to_string(), None)
            }
            other => apply_edit(&mut session, other)
                .with_context(|| format!("line {line}: {name}"))?,
        };
        outcomes.push(ActionOutcome {
            line,
            action: name,
            outcome,
            row,
        });
    }

    let unsaved_changes = !submitted && session.has_unsaved_changes();
    if session.request_leave(discard_unsaved || submitted) == LeaveDecision::ConfirmRequired {
        return Err(anyhow!(
            "session ended with unsaved changes; add a save action or pass --discard-unsaved"
        ));
    }
    if unsaved_changes {
        info!("leaving session; unsaved changes discarded");
    }
    Ok(SessionReport {
        outcomes,
        saves,
        submitted,
        lock_version,
        dirty: session.is_dirty(),
        discarded_unsaved: unsaved_changes,
        missing_requirements: session.missing_requirements(),
    })
}

fn apply_edit(
    session: &mut DraftSession,
    action: SessionAction,
) -> Result<(String, Option<RowIndex>)> {
    let applied = |outcome: EditOutcome| match outcome {
        EditOutcome::Applied => "applied".to_string(),
        EditOutcome::Ignored => "ignored (row is read-only)".to_string(),
    };
    Ok(match action {
        SessionAction::Edit { row, column, value } => {
            (applied(session.edit(row, &column, &value)?), Some(row))
        }
        SessionAction::Comment { row, value } => {
            (applied(session.set_comment(row, &value)?), Some(row))
        }
        SessionAction::ToggleRetire { row } => {
            let outcome = match session.toggle_retire(row)? {
                ToggleOutcome::Retired => "retired",
                ToggleOutcome::Unretired => "unretired",
                ToggleOutcome::Discarded => "discarded",
                ToggleOutcome::Ignored => "ignored (row is discarded)",
            };
            (outcome.to_string(), Some(row))
        }
        SessionAction::AddRow => {
            let row = session.add_row()?;
            ("added".to_string(), Some(row))
        }
        SessionAction::SetReason { value } => {
            session.set_header(HeaderField::Reason, &value)?;
            ("set".to_string(), None)
        }
        SessionAction::SetTicketRef { value } => {
            session.set_header(HeaderField::TicketRef, &value)?;
            ("set".to_string(), None)
        }
        SessionAction::SetCategory { value } => {
            session.set_header(HeaderField::Category, &value)?;
            ("set".to_string(), None)
        }
        SessionAction::SetExpanded { value } => {
            session.set_expanded(value)?;
            ("set".to_string(), None)
        }
        SessionAction::Save | SessionAction::Submit => {
            return Err(anyhow!("save and submit are handled by the session runner"));
        }
    })
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
