use std::path::{Path, PathBuf};

/// Path helper for one store root.
#[derive(Debug, Clone)]
pub struct StorePaths {
    root: PathBuf,
}

impl StorePaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Return the store root used for path derivation.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the `config.json` path.
    pub fn config_path(&self) -> PathBuf {
        self.root.join(super::CONFIG_REL)
    }

    /// Return the `baseline.json` path.
    pub fn baseline_path(&self) -> PathBuf {
        self.root.join(super::BASELINE_REL)
    }

    /// Return the `baselines/` directory of archived approved versions.
    pub fn baselines_dir(&self) -> PathBuf {
        self.root.join(super::BASELINES_DIR)
    }

    /// Return the archive path of one approved version.
    pub fn baseline_archive_path(&self, version: u32) -> PathBuf {
        self.root.join(super::baseline_file::baseline_archive_rel(version))
    }

    /// Return the `draft/changeset.json` path.
    pub fn changeset_path(&self) -> PathBuf {
        self.root.join(super::CHANGESET_REL)
    }

    /// Return the `history.jsonl` path.
    pub fn history_path(&self) -> PathBuf {
        self.root.join(super::HISTORY_REL)
    }

    /// Return the `.txns` directory that holds in-flight transactions.
    pub fn txns_root(&self) -> PathBuf {
        self.root.join(".txns")
    }
}
