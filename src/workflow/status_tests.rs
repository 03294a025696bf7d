use super::*;
use crate::cli::InitArgs;
use crate::draft::RequirementId;
use crate::workflow::run_init;

fn init_store() -> tempfile::TempDir {
    let root = tempfile::tempdir().expect("tempdir");
    run_init(&InitArgs {
        store: root.path().to_path_buf(),
        entity: "country_map".to_string(),
        force: false,
    })
    .expect("init");
    root
}

#[test]
fn missing_config_points_at_init() {
    let root = tempfile::tempdir().expect("tempdir");
    let err = status_summary_for_store(root.path().to_path_buf()).expect_err("no config");
    assert!(err.to_string().contains("refdraft init"));
}

#[test]
fn fresh_draft_lists_every_unmet_requirement() {
    let root = init_store();
    let summary = status_summary_for_store(root.path().to_path_buf()).expect("status");
    let draft = summary.draft.as_ref().expect("draft");
    assert_eq!(draft.status, ChangeStatus::Draft);
    assert!(!draft.submittable);
    let unmet = draft
        .requirements
        .iter()
        .filter(|requirement| requirement.status == RequirementState::Unmet)
        .map(|requirement| requirement.id)
        .collect::<Vec<_>>();
    assert_eq!(unmet, RequirementId::ALL.to_vec());
    assert!(summary.next_action.command.contains("refdraft session"));
    assert!(summary.next_action.reason.contains("substantive_change"));
    assert_eq!(summary.history_entries, 1);
}

#[test]
fn corrupt_drafts_are_reported_with_a_force_init_hint() {
    let root = init_store();
    let path = root.path().join("draft/changeset.json");
    let mut changeset: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).expect("read")).expect("parse");
    changeset["rows"] = serde_json::json!([
        {"row_index": 1, "identity": "ghost", "fields": {}, "operation": "UPDATE"}
    ]);
    std::fs::write(&path, serde_json::to_vec(&changeset).expect("serialize")).expect("write");

    let summary = status_summary_for_store(root.path().to_path_buf()).expect("status");
    let draft = summary.draft.as_ref().expect("draft");
    assert_eq!(draft.integrity_errors.len(), 1);
    assert!(summary.next_action.command.ends_with("--force"));
}
