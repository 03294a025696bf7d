//! Workflow ingest step: bulk-load a CSV into the draft and save once.
use super::boundary::save_session;
use super::StoreContext;
use crate::cli::IngestArgs;
use crate::draft::{ExternalOp, IngestSummary};
use crate::ingest::{read_csv, resolve_targets};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// Counts reported after an ingest run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub inserted: usize,
    pub updated: usize,
    /// Blank records plus records aimed at read-only rows.
    pub skipped: usize,
    /// Lock version after the save, or `None` when nothing changed.
    pub lock_version: Option<u64>,
}

pub(crate) fn ingest_csv(ctx: &StoreContext, csv_path: &Path) -> Result<IngestReport> {
    let (mut session, mut lock_version) = ctx.open_session()?;

    session.begin_external(ExternalOp::BulkIngest)?;
    let batch = File::open(csv_path)
        .with_context(|| format!("open CSV {}", csv_path.display()))
        .and_then(|file| read_csv(file, &ctx.baseline))
        .with_context(|| format!("ingest {}", csv_path.display()));
    session.end_external();
    let batch = batch?;

    let records = resolve_targets(session.draft(), &ctx.config.key_columns, batch.records);
    let IngestSummary {
        inserted,
        updated,
        ignored,
    } = session.bulk_ingest(records)?;
    info!(inserted, updated, ignored, blank = batch.blank, "ingested CSV");

    let saved = if session.can_save() {
        Some(save_session(ctx, &mut session, &mut lock_version)?.lock_version)
    } else {
        None
    };
    Ok(IngestReport {
        inserted,
        updated,
        skipped: batch.blank + ignored,
        lock_version: saved,
    })
}

/// Run the ingest command.
pub fn run_ingest(args: &IngestArgs) -> Result<()> {
    let ctx = StoreContext::load(args.store.clone())?;
    let report = ingest_csv(&ctx, &args.csv)?;
    println!(
        "inserted {}, updated {}, skipped {}",
        report.inserted, report.updated, report.skipped
    );
    match report.lock_version {
        Some(lock_version) => println!("saved draft (lock_version {lock_version})"),
        None => println!("no changes to save"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::InitArgs;
    use crate::draft::{BaselineFile, ChangeOperation};
    use crate::store::{self, StoreConfig};
    use crate::workflow::run_init;

    fn init_store(key_columns: &[&str]) -> (tempfile::TempDir, StoreContext) {
        let root = tempfile::tempdir().expect("tempdir");
        let baseline = crate::draft::test_support::two_row_baseline();
        let text = serde_json::to_string_pretty(&BaselineFile::from_baseline(&baseline))
            .expect("serialize baseline");
        std::fs::write(root.path().join("baseline.json"), text).expect("write baseline");
        run_init(&InitArgs {
            store: root.path().to_path_buf(),
            entity: "country_map".to_string(),
            force: false,
        })
        .expect("init");
        let config = StoreConfig {
            key_columns: key_columns.iter().map(|key| key.to_string()).collect(),
            ..store::default_config("country_map")
        };
        std::fs::write(
            root.path().join("config.json"),
            serde_json::to_string_pretty(&config).expect("serialize config"),
        )
        .expect("write config");
        let ctx = StoreContext::load(root.path().to_path_buf()).expect("load");
        (root, ctx)
    }

    #[test]
    fn keyed_records_update_matching_rows_and_others_insert() {
        let (root, ctx) = init_store(&["A"]);
        let csv_path = root.path().join("upload.csv");
        std::fs::write(&csv_path, "\u{feff}A,B\nx,filled\nnew,row\n , \n").expect("write csv");

        let report = ingest_csv(&ctx, &csv_path).expect("ingest");
        assert_eq!(report.inserted, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.lock_version, Some(2));

        let stored = store::load_changeset(&ctx.paths)
            .expect("load")
            .expect("draft");
        let ops = stored
            .rows
            .iter()
            .map(|row| row.operation)
            .collect::<Vec<_>>();
        assert_eq!(
            ops,
            vec![
                ChangeOperation::Update,
                ChangeOperation::Keep,
                ChangeOperation::Insert
            ]
        );
        assert_eq!(stored.rows[2].fields.get("A").map(String::as_str), Some("new"));
    }

    #[test]
    fn undefined_columns_reject_the_whole_file() {
        let (root, ctx) = init_store(&[]);
        let csv_path = root.path().join("upload.csv");
        std::fs::write(&csv_path, "A,Z\n1,2\n").expect("write csv");

        let err = ingest_csv(&ctx, &csv_path).expect_err("undefined column");
        assert!(format!("{err:#}").contains("not defined for country_map: Z"));
        let stored = store::load_changeset(&ctx.paths)
            .expect("load")
            .expect("draft");
        assert_eq!(stored.lock_version, 1);
    }

    #[test]
    fn blank_uploads_save_nothing() {
        let (root, ctx) = init_store(&[]);
        let csv_path = root.path().join("upload.csv");
        std::fs::write(&csv_path, "A,B\n,\n").expect("write csv");

        let report = ingest_csv(&ctx, &csv_path).expect("ingest");
        assert_eq!(report.skipped, 1);
        assert_eq!(report.lock_version, None);
    }
}
