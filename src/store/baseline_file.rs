use super::{StorePaths, BASELINES_DIR, BASELINE_REL};
use crate::draft::baseline::{
    parse_baseline_lossy, Baseline, BaselineFile, BaselineProvider, BASELINE_SCHEMA_VERSION,
};
use crate::staging::StoreTxn;
use anyhow::{anyhow, Context, Result};
use std::fs;

/// Serves the approved snapshot stored in `baseline.json`.
#[derive(Debug, Clone)]
pub struct FileBaselineProvider {
    paths: StorePaths,
}

impl FileBaselineProvider {
    pub fn new(paths: StorePaths) -> Self {
        Self { paths }
    }
}

impl BaselineProvider for FileBaselineProvider {
    fn latest_approved(&self, entity: &str) -> Baseline {
        let path = self.paths.baseline_path();
        if !path.is_file() {
            return Baseline::empty(entity);
        }
        match fs::read(&path) {
            Ok(bytes) => parse_baseline_lossy(&bytes, entity),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "baseline unreadable; using empty baseline");
                Baseline::empty(entity)
            }
        }
    }
}

pub(crate) fn baseline_archive_rel(version: u32) -> String {
    format!("{BASELINES_DIR}/v{version}.json")
}

/// Stage a snapshot as the current approved version, plus its archive copy.
pub fn stage_baseline(txn: &StoreTxn, baseline: &Baseline) -> Result<()> {
    let file = BaselineFile::from_baseline(baseline);
    txn.stage_json(BASELINE_REL, &file)?;
    txn.stage_json(&baseline_archive_rel(baseline.version), &file)
}

/// Stage the archive copy of an already-current snapshot unless one exists.
pub fn stage_baseline_archive(
    txn: &StoreTxn,
    paths: &StorePaths,
    baseline: &Baseline,
) -> Result<()> {
    if paths.baseline_archive_path(baseline.version).is_file() {
        return Ok(());
    }
    txn.stage_json(
        &baseline_archive_rel(baseline.version),
        &BaselineFile::from_baseline(baseline),
    )
}

/// Approved versions with an archived snapshot, ascending.
pub fn archived_versions(paths: &StorePaths) -> Result<Vec<u32>> {
    let dir = paths.baselines_dir();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut versions = Vec::new();
    for entry in fs::read_dir(&dir).with_context(|| format!("read {}", dir.display()))? {
        let entry = entry.with_context(|| format!("read {}", dir.display()))?;
        let name = entry.file_name();
        let version = name
            .to_str()
            .and_then(|name| name.strip_prefix('v'))
            .and_then(|name| name.strip_suffix(".json"))
            .and_then(|digits| digits.parse::<u32>().ok());
        if let Some(version) = version {
            versions.push(version);
        }
    }
    versions.sort_unstable();
    Ok(versions)
}

/// Load one approved version: its archive copy, or the current baseline when
/// it carries that version. Unlike the latest-approved lookup this is strict.
pub fn load_baseline_version(paths: &StorePaths, entity: &str, version: u32) -> Result<Baseline> {
    let path = paths.baseline_archive_path(version);
    if path.is_file() {
        let bytes = fs::read(&path).with_context(|| format!("read {}", path.display()))?;
        let file: BaselineFile = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse {}", path.display()))?;
        if file.schema_version != BASELINE_SCHEMA_VERSION {
            return Err(anyhow!(
                "{}: unsupported baseline schema {}",
                path.display(),
                file.schema_version
            ));
        }
        if file.entity != entity || file.version != version {
            return Err(anyhow!(
                "{} holds {} v{}, not {entity} v{version}",
                path.display(),
                file.entity,
                file.version
            ));
        }
        return Ok(file.into_baseline());
    }
    let current = FileBaselineProvider::new(paths.clone()).latest_approved(entity);
    if current.version == version {
        return Ok(current);
    }
    let known = archived_versions(paths)?
        .iter()
        .map(|version| format!("v{version}"))
        .collect::<Vec<_>>();
    Err(anyhow!(
        "approved version v{version} of {entity} is not kept in this store (kept: {})",
        if known.is_empty() {
            "none".to_string()
        } else {
            known.join(", ")
        }
    ))
}
