//! Store-owned files and their schema versions.
//!
//! A store is one directory holding the approved baseline of a single entity,
//! an archive copy of every approved version, at most one draft change-set,
//! and the audit trail.
/// Current schema version for `config.json`.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;
/// Current schema version for `history.jsonl` entries.
pub const HISTORY_SCHEMA_VERSION: u32 = 1;

pub const CONFIG_REL: &str = "config.json";
pub const BASELINE_REL: &str = "baseline.json";
pub const CHANGESET_REL: &str = "draft/changeset.json";
pub const HISTORY_REL: &str = "history.jsonl";
pub const BASELINES_DIR: &str = "baselines";

mod baseline_file;
mod changeset_file;
mod config;
mod history;
mod paths;

pub use baseline_file::{
    archived_versions, load_baseline_version, stage_baseline, stage_baseline_archive,
    FileBaselineProvider,
};
pub use changeset_file::{
    check_lock_version, load_changeset, load_changeset_lossy, stage_changeset, SaveConflict,
};
pub use config::{
    default_config, load_config, stage_config, validate_config, validate_entity_name,
    StoreConfig,
};
pub use history::{load_history, stage_history, now_epoch_ms, HistoryEntry, HistoryStep};
pub use paths::StorePaths;
