//! Transactional publish of store files.
//!
//! Writers stage complete files under a per-transaction directory, then
//! publish them into the store in one pass. Existing files are moved to a
//! backup first; a failed publish restores every backup and removes files the
//! transaction created, so readers see either all new files or none.
use crate::store::StorePaths;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// One in-flight store transaction. Dropping it without publishing discards
/// everything staged.
#[derive(Debug)]
pub struct StoreTxn {
    dir: TempDir,
    store_root: PathBuf,
}

impl StoreTxn {
    pub fn begin(paths: &StorePaths) -> Result<Self> {
        let txns_root = paths.txns_root();
        fs::create_dir_all(&txns_root)
            .with_context(|| format!("create {}", txns_root.display()))?;
        let dir = tempfile::Builder::new()
            .prefix("txn-")
            .tempdir_in(&txns_root)
            .with_context(|| format!("create transaction under {}", txns_root.display()))?;
        Ok(Self {
            dir,
            store_root: paths.root().to_path_buf(),
        })
    }

    fn staging_root(&self) -> PathBuf {
        self.dir.path().join("staging")
    }

    fn backup_root(&self) -> PathBuf {
        self.dir.path().join("backup")
    }

    pub fn stage_bytes(&self, rel_path: &str, bytes: &[u8]) -> Result<()> {
        let staged = self.staging_root().join(rel_path);
        if let Some(parent) = staged.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&staged, bytes).with_context(|| format!("stage {}", staged.display()))?;
        Ok(())
    }

    pub fn stage_json<T: serde::Serialize>(&self, rel_path: &str, value: &T) -> Result<()> {
        let mut bytes = serde_json::to_vec_pretty(value)
            .with_context(|| format!("serialize staged {rel_path}"))?;
        bytes.push(b'\n');
        self.stage_bytes(rel_path, &bytes)
    }

    /// Move every staged file into the store. Returns the published paths.
    pub fn publish(self) -> Result<Vec<PathBuf>> {
        let staging_root = self.staging_root();
        let files = collect_files_recursive(&staging_root)?;
        let mut journal = PublishJournal::default();
        for file in files {
            let rel = file
                .strip_prefix(&staging_root)
                .context("strip staging prefix")?;
            if let Err(err) = self.publish_one(&file, rel, &mut journal) {
                journal.roll_back();
                return Err(err);
            }
        }
        Ok(journal.published)
    }

    fn publish_one(&self, staged: &Path, rel: &Path, journal: &mut PublishJournal) -> Result<()> {
        let dest = self.store_root.join(rel);
        if dest.is_file() {
            let backup = self.backup_root().join(rel);
            if let Some(parent) = backup.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
            fs::copy(&dest, &backup).with_context(|| format!("back up {}", dest.display()))?;
            journal.backups.push((dest.clone(), backup));
        } else {
            journal.created.push(dest.clone());
        }
        replace_file(staged, &dest)?;
        journal.published.push(dest);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct PublishJournal {
    published: Vec<PathBuf>,
    backups: Vec<(PathBuf, PathBuf)>,
    created: Vec<PathBuf>,
}

impl PublishJournal {
    fn roll_back(&self) {
        for path in &self.created {
            if path.is_file() {
                let _ = fs::remove_file(path);
            }
        }
        for (dest, backup) in &self.backups {
            if let Err(err) = replace_file(backup, dest) {
                tracing::warn!(path = %dest.display(), error = %err, "failed to restore backup");
            }
        }
    }
}

/// Sorted list of regular files below `root`.
pub fn collect_files_recursive(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !root.exists() {
        return Ok(files);
    }
    for entry in fs::read_dir(root).with_context(|| format!("read {}", root.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            files.extend(collect_files_recursive(&path)?);
        } else if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Copy to a sibling temp file, then rename over the destination.
fn replace_file(source: &Path, dest: &Path) -> Result<()> {
    let parent = dest.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    let file_name = dest
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("staged");
    let tmp_path = parent.join(format!(".{file_name}.tmp"));
    fs::copy(source, &tmp_path).with_context(|| format!("publish {}", dest.display()))?;
    fs::rename(&tmp_path, dest).with_context(|| format!("publish {}", dest.display()))?;
    Ok(())
}
