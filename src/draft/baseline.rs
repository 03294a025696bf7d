//! Baseline snapshot types and the provider boundary.
//!
//! A baseline is the latest approved row set for one entity. It is immutable
//! for the lifetime of a session and is the diff reference for every
//! baseline-backed draft row.
use crate::util::sha256_hex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Current schema version for `baseline.json`.
pub const BASELINE_SCHEMA_VERSION: u32 = 1;

/// Ordinal position of a row within a draft.
pub type RowIndex = u32;

/// Column key → text value. Every business column is text.
pub type FieldMap = BTreeMap<String, String>;

/// Opaque stable reference tying a draft row to its baseline row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowIdentity(String);

impl RowIdentity {
    /// Wrap a token, rejecting blank values.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return None;
        }
        Some(Self(token.trim().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Business column definition from the approved snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub key: String,
    #[serde(default)]
    pub label: String,
}

impl ColumnDef {
    /// Business label, falling back to the column key.
    pub fn display_label(&self) -> &str {
        let label = self.label.trim();
        if label.is_empty() {
            &self.key
        } else {
            label
        }
    }
}

/// One approved row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineRow {
    pub identity: RowIdentity,
    pub fields: FieldMap,
    pub comment: String,
}

impl BaselineRow {
    /// Baseline value for a column; absent values normalize to empty.
    pub fn value(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }
}

/// Latest approved snapshot of one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Baseline {
    pub entity: String,
    pub version: u32,
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<BaselineRow>,
}

impl Baseline {
    /// An empty baseline: every draft row is new.
    pub fn empty(entity: &str) -> Self {
        Self {
            entity: entity.to_string(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True when the snapshot declares its business columns.
    pub fn defines_columns(&self) -> bool {
        !self.columns.is_empty()
    }

    pub fn defines_column(&self, key: &str) -> bool {
        self.columns.iter().any(|column| column.key == key)
    }

    pub fn column_keys(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.key.clone()).collect()
    }

    pub fn row(&self, identity: &RowIdentity) -> Option<&BaselineRow> {
        self.rows.iter().find(|row| &row.identity == identity)
    }
}

/// Boundary with the store that owns approved snapshots.
///
/// Implementations degrade to [`Baseline::empty`] instead of failing: a draft
/// over an unreadable baseline is still editable, with every row treated as new.
pub trait BaselineProvider {
    fn latest_approved(&self, entity: &str) -> Baseline;
}

/// On-disk shape of `baseline.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineFile {
    pub schema_version: u32,
    pub entity: String,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
    #[serde(default)]
    pub rows: Vec<BaselineFileRow>,
}

/// One stored row. Values may be any JSON scalar; they are stringified on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineFileRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl BaselineFile {
    /// Convert to the in-memory snapshot, assigning identities to rows that
    /// lack one.
    pub fn into_baseline(self) -> Baseline {
        let mut rows = Vec::with_capacity(self.rows.len());
        let mut seen: HashMap<String, usize> = HashMap::new();
        for stored in self.rows {
            let fields: FieldMap = stored
                .fields
                .into_iter()
                .map(|(key, value)| (key, stringify_value(&value)))
                .collect();
            let token = stored
                .identity
                .as_deref()
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| content_identity(&fields));
            let ordinal = seen.entry(token.clone()).or_insert(0);
            *ordinal += 1;
            let token = if *ordinal > 1 {
                format!("{token}#{ordinal}")
            } else {
                token
            };
            let Some(identity) = RowIdentity::new(token) else {
                continue;
            };
            rows.push(BaselineRow {
                identity,
                fields,
                comment: stored.comment.unwrap_or_default(),
            });
        }
        Baseline {
            entity: self.entity,
            version: self.version,
            columns: self.columns,
            rows,
        }
    }

    /// Build the stored form of a snapshot.
    pub fn from_baseline(baseline: &Baseline) -> Self {
        Self {
            schema_version: BASELINE_SCHEMA_VERSION,
            entity: baseline.entity.clone(),
            version: baseline.version,
            columns: baseline.columns.clone(),
            rows: baseline
                .rows
                .iter()
                .map(|row| BaselineFileRow {
                    identity: Some(row.identity.to_string()),
                    fields: row
                        .fields
                        .iter()
                        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
                        .collect(),
                    comment: (!row.comment.is_empty()).then(|| row.comment.clone()),
                })
                .collect(),
        }
    }
}

/// Parse `baseline.json` bytes for `entity`, degrading to an empty snapshot
/// when the bytes are corrupt, the schema is unknown, or the entity differs.
pub fn parse_baseline_lossy(bytes: &[u8], entity: &str) -> Baseline {
    let file: BaselineFile = match serde_json::from_slice(bytes) {
        Ok(file) => file,
        Err(err) => {
            tracing::warn!(%err, entity, "baseline unreadable; using empty baseline");
            return Baseline::empty(entity);
        }
    };
    if file.schema_version != BASELINE_SCHEMA_VERSION {
        tracing::warn!(
            schema_version = file.schema_version,
            entity,
            "unsupported baseline schema; using empty baseline"
        );
        return Baseline::empty(entity);
    }
    if file.entity != entity {
        tracing::warn!(found = %file.entity, entity, "baseline entity mismatch; using empty baseline");
        return Baseline::empty(entity);
    }
    file.into_baseline()
}

/// Deterministic identity for a row stored without one: a hash of its trimmed
/// business values in column-key order.
pub fn content_identity(fields: &FieldMap) -> String {
    let joined = fields
        .values()
        .map(|value| value.trim())
        .collect::<Vec<_>>()
        .join("|");
    sha256_hex(joined.as_bytes())
}

fn stringify_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
