//! Draft engine: row intent, dirtiness, the mutation controller, the
//! submission gate, and change-set replay.
//!
//! Nothing in this module touches the filesystem; the store and workflow
//! layers own persistence.
pub mod baseline;
pub mod changeset;
pub mod controller;
pub mod diff;
pub mod dirty;
pub mod gate;
pub mod header;
pub mod intent;
pub mod model;
pub mod operation;

#[cfg(test)]
pub(crate) mod test_support;

pub use baseline::{Baseline, BaselineFile, BaselineProvider, BaselineRow, RowIdentity, RowIndex};
pub use changeset::{integrity_errors, replay, ChangeSet, ChangeSetInvalid, ChangeStatus};
pub use controller::{
    DraftSession, EditOutcome, ExternalOp, IngestSummary, LeaveDecision, RowAction, ToggleOutcome,
};
pub use diff::{diff_baselines, diff_draft, RowDiff};
pub use gate::{
    ensure_submittable, evaluate_requirements, RequirementId, RequirementState, RequirementStatus,
};
pub use header::{HeaderField, HeaderRecord};
pub use model::Draft;
pub use operation::ChangeOperation;
