use super::*;
use crate::draft::{BaselineFile, ChangeOperation};
use std::path::Path;

fn init_args(store: &Path, entity: &str, force: bool) -> InitArgs {
    InitArgs {
        store: store.to_path_buf(),
        entity: entity.to_string(),
        force,
    }
}

fn seed_baseline(store: &Path) {
    let baseline = crate::draft::test_support::two_row_baseline();
    let text = serde_json::to_string_pretty(&BaselineFile::from_baseline(&baseline))
        .expect("serialize baseline");
    fs::write(store.join("baseline.json"), text).expect("write baseline");
}

#[test]
fn init_creates_config_empty_baseline_and_draft() {
    let root = tempfile::tempdir().expect("tempdir");
    let store_root = root.path().join("store");
    run_init(&init_args(&store_root, "country_map", false)).expect("init");

    let paths = StorePaths::new(store_root.canonicalize().expect("canonical"));
    let config = store::load_config(paths.root()).expect("config");
    assert_eq!(config.entity, "country_map");
    assert!(paths.baseline_path().is_file());

    let changeset = store::load_changeset(&paths)
        .expect("load")
        .expect("draft exists");
    assert_eq!(changeset.status, ChangeStatus::Draft);
    assert_eq!(changeset.lock_version, 1);
    assert!(changeset.rows.is_empty());
    assert_eq!(store::load_history(&paths).expect("history").len(), 1);
}

#[test]
fn init_adopts_a_seeded_baseline() {
    let root = tempfile::tempdir().expect("tempdir");
    seed_baseline(root.path());
    run_init(&init_args(root.path(), "country_map", false)).expect("init");

    let paths = StorePaths::new(root.path().canonicalize().expect("canonical"));
    let changeset = store::load_changeset(&paths)
        .expect("load")
        .expect("draft exists");
    assert_eq!(changeset.baseline_version, 3);
    assert_eq!(changeset.next_row_index, 3);
    assert!(changeset
        .rows
        .iter()
        .all(|row| row.operation == ChangeOperation::Keep));
    assert_eq!(store::archived_versions(&paths).expect("archive"), vec![3]);
}

#[test]
fn open_drafts_need_force_and_entities_must_match() {
    let root = tempfile::tempdir().expect("tempdir");
    run_init(&init_args(root.path(), "country_map", false)).expect("init");

    let err = run_init(&init_args(root.path(), "country_map", false)).expect_err("open draft");
    assert!(err.to_string().contains("--force"));

    run_init(&init_args(root.path(), "country_map", true)).expect("force");
    let paths = StorePaths::new(root.path().canonicalize().expect("canonical"));
    let changeset = store::load_changeset(&paths)
        .expect("load")
        .expect("draft exists");
    assert_eq!(changeset.lock_version, 2);

    let err = run_init(&init_args(root.path(), "currency", true)).expect_err("entity");
    assert!(err.to_string().contains("holds entity"));

    assert!(run_init(&init_args(root.path(), "bad name", true)).is_err());
}
