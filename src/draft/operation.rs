//! Row operation codes.
//!
//! `RowOperation` is the engine's full vocabulary, including the internal
//! `Discard` marker. `ChangeOperation` is the visible subset that persisted
//! change-sets and audit entries are typed against, so a discarded row has no
//! representation on disk.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Derived per-row intent tracked by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowOperation {
    Keep,
    Update,
    Insert,
    Retire,
    Unretire,
    /// New row explicitly dropped from the proposal. Never persisted.
    Discard,
}

impl RowOperation {
    /// Return the stable code used in status output.
    pub fn as_str(&self) -> &'static str {
        match self {
            RowOperation::Keep => "KEEP",
            RowOperation::Update => "UPDATE",
            RowOperation::Insert => "INSERT",
            RowOperation::Retire => "RETIRE",
            RowOperation::Unretire => "UNRETIRE",
            RowOperation::Discard => "DISCARD",
        }
    }

    /// Project onto the persisted vocabulary; `None` for `Discard`.
    pub fn visible(self) -> Option<ChangeOperation> {
        match self {
            RowOperation::Keep => Some(ChangeOperation::Keep),
            RowOperation::Update => Some(ChangeOperation::Update),
            RowOperation::Insert => Some(ChangeOperation::Insert),
            RowOperation::Retire => Some(ChangeOperation::Retire),
            RowOperation::Unretire => Some(ChangeOperation::Unretire),
            RowOperation::Discard => None,
        }
    }

    /// True for operations that make a draft worth submitting.
    pub fn is_substantive(self) -> bool {
        self.visible().is_some_and(ChangeOperation::is_substantive)
    }
}

impl fmt::Display for RowOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation codes that may appear in a persisted change-set or audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum ChangeOperation {
    Keep,
    Update,
    Insert,
    Retire,
    Unretire,
}

impl ChangeOperation {
    /// Return the stable code written to change-set JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeOperation::Keep => "KEEP",
            ChangeOperation::Update => "UPDATE",
            ChangeOperation::Insert => "INSERT",
            ChangeOperation::Retire => "RETIRE",
            ChangeOperation::Unretire => "UNRETIRE",
        }
    }

    pub fn is_substantive(self) -> bool {
        !matches!(self, ChangeOperation::Keep)
    }

    /// True for operations that must target an existing baseline row.
    pub fn targets_baseline(self) -> bool {
        matches!(
            self,
            ChangeOperation::Update | ChangeOperation::Retire | ChangeOperation::Unretire
        )
    }
}

impl From<ChangeOperation> for RowOperation {
    fn from(op: ChangeOperation) -> Self {
        match op {
            ChangeOperation::Keep => RowOperation::Keep,
            ChangeOperation::Update => RowOperation::Update,
            ChangeOperation::Insert => RowOperation::Insert,
            ChangeOperation::Retire => RowOperation::Retire,
            ChangeOperation::Unretire => RowOperation::Unretire,
        }
    }
}

impl fmt::Display for ChangeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised operation code found while reading a change-set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported operation code {0:?}")]
pub struct UnknownOperation(pub String);

impl FromStr for ChangeOperation {
    type Err = UnknownOperation;

    /// Accepts current codes, their `<CODE> ROW` labels, and the legacy bare
    /// `DELETE` marker (read as `RETIRE`). Case-insensitive.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let upper = raw.trim().to_ascii_uppercase();
        let code = upper.strip_suffix(" ROW").unwrap_or(&upper).trim_end();
        match code {
            "KEEP" => Ok(ChangeOperation::Keep),
            "UPDATE" => Ok(ChangeOperation::Update),
            "INSERT" => Ok(ChangeOperation::Insert),
            "RETIRE" | "DELETE" => Ok(ChangeOperation::Retire),
            "UNRETIRE" => Ok(ChangeOperation::Unretire),
            _ => Err(UnknownOperation(raw.to_string())),
        }
    }
}

impl TryFrom<String> for ChangeOperation {
    type Error = UnknownOperation;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
