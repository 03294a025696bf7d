//! Submission gate.
//!
//! Requirements are computed from the draft alone, so the interactive session
//! and the submit boundary evaluate the same function over the same inputs.
use super::header::is_placeholder_category;
use super::model::Draft;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Requirement identifiers reported in status and rejection output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementId {
    ChangeTicketRef,
    ChangeReason,
    ChangeCategory,
    SubstantiveChange,
}

impl RequirementId {
    pub const ALL: [RequirementId; 4] = [
        RequirementId::ChangeTicketRef,
        RequirementId::ChangeReason,
        RequirementId::ChangeCategory,
        RequirementId::SubstantiveChange,
    ];

    /// Return the stable string identifier used in JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementId::ChangeTicketRef => "change_ticket_ref",
            RequirementId::ChangeReason => "change_reason",
            RequirementId::ChangeCategory => "change_category",
            RequirementId::SubstantiveChange => "substantive_change",
        }
    }

    /// Human-readable hint pointing at the input that satisfies the requirement.
    pub fn hint(&self) -> &'static str {
        match self {
            RequirementId::ChangeTicketRef => "enter a change ticket reference",
            RequirementId::ChangeReason => "enter a change reason",
            RequirementId::ChangeCategory => "select a change category",
            RequirementId::SubstantiveChange => {
                "insert, update, or retire at least one row"
            }
        }
    }

    fn is_met(&self, draft: &Draft) -> bool {
        let header = draft.header();
        match self {
            RequirementId::ChangeTicketRef => !header.ticket_ref().trim().is_empty(),
            RequirementId::ChangeReason => !header.reason().trim().is_empty(),
            RequirementId::ChangeCategory => !is_placeholder_category(header.category()),
            RequirementId::SubstantiveChange => draft
                .rows()
                .iter()
                .any(|row| row.operation().is_substantive()),
        }
    }
}

impl fmt::Display for RequirementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requirement fulfillment state used in status output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementState {
    Met,
    Unmet,
}

/// One evaluated requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementStatus {
    pub id: RequirementId,
    pub status: RequirementState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Evaluate every requirement in a fixed order.
pub fn evaluate_requirements(draft: &Draft) -> Vec<RequirementStatus> {
    RequirementId::ALL
        .iter()
        .map(|id| {
            let met = id.is_met(draft);
            RequirementStatus {
                id: *id,
                status: if met {
                    RequirementState::Met
                } else {
                    RequirementState::Unmet
                },
                hint: (!met).then(|| id.hint().to_string()),
            }
        })
        .collect()
}

pub fn compute_missing_requirements(draft: &Draft) -> BTreeSet<RequirementId> {
    RequirementId::ALL
        .into_iter()
        .filter(|id| !id.is_met(draft))
        .collect()
}

pub fn is_submittable(draft: &Draft) -> bool {
    compute_missing_requirements(draft).is_empty()
}

/// Saving needs only a dirty draft; an unsubmittable draft may always be saved.
pub fn is_saveable(draft: &Draft) -> bool {
    draft.is_dirty()
}

/// Submission refused with the exact requirements still missing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("submission rejected; missing requirements: {}", join_ids(.missing))]
pub struct SubmissionRejected {
    pub missing: BTreeSet<RequirementId>,
}

fn join_ids(ids: &BTreeSet<RequirementId>) -> String {
    ids.iter()
        .map(RequirementId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Enforce the gate, returning the missing set on failure.
pub fn ensure_submittable(draft: &Draft) -> Result<(), SubmissionRejected> {
    let missing = compute_missing_requirements(draft);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(SubmissionRejected { missing })
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
