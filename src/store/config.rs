//! Store configuration helpers.
//!
//! The config names the entity a store holds, the change categories a maker
//! may choose from, and the key columns bulk ingest uses to match records.
use super::{StorePaths, CONFIG_REL, CONFIG_SCHEMA_VERSION};
use crate::draft::header::{is_placeholder_category, normalize_category};
use crate::staging::StoreTxn;
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Categories installed by `init`.
pub const DEFAULT_CHANGE_CATEGORIES: [&str; 6] = [
    "DATA_CORRECTION",
    "NEW_VALUE_ADD",
    "POLICY_COMPLIANCE",
    "OPERATIONAL_UPDATE",
    "ENHANCEMENT",
    "OTHER",
];

/// Store-owned `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    pub schema_version: u32,
    pub entity: String,
    #[serde(default)]
    pub change_categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_columns: Vec<String>,
}

/// Build the default config for a fresh store.
pub fn default_config(entity: &str) -> StoreConfig {
    StoreConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        entity: entity.to_string(),
        change_categories: DEFAULT_CHANGE_CATEGORIES
            .iter()
            .map(|category| category.to_string())
            .collect(),
        key_columns: Vec::new(),
    }
}

/// Load `config.json` from a store root.
pub fn load_config(store_root: &Path) -> Result<StoreConfig> {
    let paths = StorePaths::new(store_root.to_path_buf());
    let path = paths.config_path();
    let bytes = fs::read(&path).with_context(|| format!("read config {}", path.display()))?;
    let config: StoreConfig =
        serde_json::from_slice(&bytes).context("parse store config JSON")?;
    Ok(config)
}

/// Stage a config for publication in a stable JSON format.
pub fn stage_config(txn: &StoreTxn, config: &StoreConfig) -> Result<()> {
    txn.stage_json(CONFIG_REL, config)
}

/// Validate schema version, entity name, categories, and key columns.
pub fn validate_config(config: &StoreConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported store config schema_version {}",
            config.schema_version
        ));
    }
    validate_entity_name(&config.entity)?;
    if config.change_categories.is_empty() {
        return Err(anyhow!("change_categories must list at least one category"));
    }
    let mut seen = BTreeSet::new();
    for category in &config.change_categories {
        if is_placeholder_category(category) {
            return Err(anyhow!(
                "change_categories must not contain the placeholder {category:?}"
            ));
        }
        if !seen.insert(normalize_category(category)) {
            return Err(anyhow!("duplicate change category {category:?}"));
        }
    }
    let column_key =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").context("compile column key regex")?;
    for key in &config.key_columns {
        if !column_key.is_match(key) {
            return Err(anyhow!(
                "key_columns entries must be column keys like string_01 (got {key:?})"
            ));
        }
    }
    Ok(())
}

/// Entity names become part of derived identities and file contents.
pub fn validate_entity_name(entity: &str) -> Result<()> {
    let pattern = Regex::new(r"^[A-Za-z][A-Za-z0-9_.-]*$").context("compile entity regex")?;
    if !pattern.is_match(entity) {
        return Err(anyhow!(
            "entity must start with a letter and contain only letters, digits, '_', '.', or '-' (got {entity:?})"
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
