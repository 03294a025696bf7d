use crate::draft::{
    replay, Baseline, BaselineProvider, ChangeSet, ChangeStatus, Draft, DraftSession,
};
use crate::store;
use anyhow::{anyhow, Result};
use std::path::PathBuf;
use tracing::warn;

/// Everything a command needs from one store, loaded once.
pub(crate) struct StoreContext {
    pub(crate) paths: store::StorePaths,
    pub(crate) config: store::StoreConfig,
    pub(crate) baseline: Baseline,
    pub(crate) changeset: Option<ChangeSet>,
}

impl StoreContext {
    pub(crate) fn load(store_root: PathBuf) -> Result<Self> {
        let paths = store::StorePaths::new(store_root);
        if !paths.config_path().is_file() {
            return Err(anyhow!(
                "missing store config at {} (run `refdraft init --store {} --entity <NAME>` first)",
                paths.config_path().display(),
                paths.root().display()
            ));
        }
        let config = store::load_config(paths.root())?;
        store::validate_config(&config)?;
        let baseline =
            store::FileBaselineProvider::new(paths.clone()).latest_approved(&config.entity);
        let changeset = store::load_changeset_lossy(&paths);
        if let Some(changeset) = changeset.as_ref() {
            if changeset.entity != config.entity {
                return Err(anyhow!(
                    "draft belongs to entity {:?} but the store holds {:?}",
                    changeset.entity,
                    config.entity
                ));
            }
        }
        Ok(Self {
            paths,
            config,
            baseline,
            changeset,
        })
    }

    pub(crate) fn require_changeset(&self) -> Result<&ChangeSet> {
        self.changeset
            .as_ref()
            .ok_or_else(|| self.missing_draft_error())
    }

    fn missing_draft_error(&self) -> anyhow::Error {
        anyhow!(
            "no draft in {} (run `refdraft init --store {} --entity {}`)",
            self.paths.root().display(),
            self.paths.root().display(),
            self.config.entity
        )
    }

    /// The stored draft, which must be in `expected` status.
    pub(crate) fn require_status(&self, expected: ChangeStatus) -> Result<&ChangeSet> {
        let changeset = self.require_changeset()?;
        if changeset.status != expected {
            return Err(anyhow!(
                "draft is {} (expected {expected})",
                changeset.status
            ));
        }
        Ok(changeset)
    }

    /// Replay the stored draft over the current baseline.
    pub(crate) fn open_draft(&self) -> Result<Draft> {
        Ok(replay(self.baseline.clone(), self.require_changeset()?))
    }

    /// Open an editing session over a draft that is still in `DRAFT` status.
    /// A store whose change-set was unreadable opens a fresh draft from the
    /// baseline at version 0.
    pub(crate) fn open_session(&self) -> Result<(DraftSession, u64)> {
        let (draft, lock_version) = match self.changeset.as_ref() {
            Some(_) => {
                let changeset = self.require_status(ChangeStatus::Draft)?;
                (replay(self.baseline.clone(), changeset), changeset.lock_version)
            }
            None if self.paths.changeset_path().is_file() => {
                warn!("opening a fresh draft in place of the unreadable change-set");
                (Draft::from_baseline(self.baseline.clone()), 0)
            }
            None => return Err(self.missing_draft_error()),
        };
        let session = DraftSession::new(draft).with_categories(&self.config.change_categories);
        Ok((session, lock_version))
    }
}
