//! End-to-end maker-checker flows driven through the `refdraft` binary.

mod common;

use common::{path_arg, StoreFixture, COMPLETE_HEADER};
use serde_json::Value;

#[test]
fn maker_checker_round_trip_promotes_a_new_baseline() {
    let fixture = StoreFixture::init();
    let status = fixture.status();
    assert_eq!(status["draft"]["status"], "DRAFT");
    assert_eq!(status["draft"]["submittable"], false);
    assert!(status["next_action"]["command"]
        .as_str()
        .unwrap_or_default()
        .contains("refdraft session"));

    let mut lines = COMPLETE_HEADER.to_vec();
    lines.extend([
        r#"{"action": "edit", "row": 1, "column": "region", "value": "EU"}"#,
        r#"{"action": "toggle_retire", "row": 2}"#,
        r#"{"action": "add_row"}"#,
        r#"{"action": "edit", "row": 3, "column": "code", "value": "DE"}"#,
        r#"{"action": "edit", "row": 3, "column": "region", "value": "EMEA"}"#,
        r#"{"action": "save"}"#,
        r#"{"action": "submit"}"#,
    ]);
    let script = fixture.script("edits.jsonl", &lines);
    let report: Value = serde_json::from_str(&fixture.run_ok(&[
        "session",
        "--actions",
        path_arg(&script),
        "--json",
    ]))
    .expect("session report");
    assert_eq!(report["submitted"], true);
    assert_eq!(report["lock_version"], 3);

    let status = fixture.status();
    assert_eq!(status["draft"]["status"], "SUBMITTED");
    assert_eq!(status["draft"]["operations"]["INSERT"], 1);
    assert_eq!(status["draft"]["operations"]["RETIRE"], 1);
    assert!(status["next_action"]["command"]
        .as_str()
        .unwrap_or_default()
        .contains("refdraft decide"));

    let diff: Value =
        serde_json::from_str(&fixture.run_ok(&["diff", "--json"])).expect("diff json");
    let ops = diff
        .as_array()
        .expect("diff rows")
        .iter()
        .map(|row| row["operation"].as_str().unwrap_or_default().to_string())
        .collect::<Vec<_>>();
    assert_eq!(ops, vec!["UPDATE", "RETIRE", "INSERT"]);
    assert_eq!(diff[2]["key"], "new:3");

    fixture.run_ok(&["decide", "--approve", "--note", "looks right"]);
    let baseline = fixture.read_json("baseline.json");
    assert_eq!(baseline["version"], 4);
    let rows = baseline["rows"].as_array().expect("baseline rows");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["identity"], "C-FR");
    assert_eq!(rows[0]["fields"]["region"], "EU");
    assert_eq!(rows[1]["fields"]["code"], "DE");

    let changeset = fixture.read_json("draft/changeset.json");
    assert_eq!(changeset["status"], "APPROVED");
    assert_eq!(changeset["decision_note"], "looks right");
    assert_eq!(
        fixture.history_steps(),
        vec!["init", "save", "submit", "approve"]
    );
    assert_eq!(fixture.read_json("baselines/v3.json")["version"], 3);
    assert_eq!(fixture.read_json("baselines/v4.json")["version"], 4);

    let comparison: Value =
        serde_json::from_str(&fixture.run_ok(&["compare", "--json"])).expect("compare json");
    assert_eq!(comparison["from"], 3);
    assert_eq!(comparison["to"], 4);
    let compared = comparison["rows"]
        .as_array()
        .expect("compare rows")
        .iter()
        .map(|row| row["operation"].as_str().unwrap_or_default().to_string())
        .collect::<Vec<_>>();
    assert_eq!(compared, vec!["UPDATE", "INSERT", "RETIRE"]);

    let exported = fixture.run_ok(&["export", "--format", "csv", "--version", "3"]);
    assert_eq!(
        exported,
        "identity,code,region,comment\nC-FR,FR,EMEA,\nC-JP,JP,APAC,\n"
    );

    fixture.run_ok(&["init", "--entity", "country_map"]);
    let status = fixture.status();
    assert_eq!(status["baseline_version"], 4);
    assert_eq!(status["baseline_rows"], 2);
    assert_eq!(status["draft"]["status"], "DRAFT");
}

#[test]
fn leaving_a_dirty_session_requires_confirmation() {
    let fixture = StoreFixture::init();
    let script = fixture.script(
        "edit.jsonl",
        &[r#"{"action": "edit", "row": 1, "column": "region", "value": "EU"}"#],
    );
    let stderr = fixture.run_err(&["session", "--actions", path_arg(&script)]);
    assert!(stderr.contains("--discard-unsaved"));
    assert_eq!(fixture.read_json("draft/changeset.json")["lock_version"], 1);

    let stdout = fixture.run_ok(&[
        "session",
        "--actions",
        path_arg(&script),
        "--discard-unsaved",
    ]);
    assert!(stdout.contains("unsaved changes discarded"));
    assert_eq!(fixture.read_json("draft/changeset.json")["lock_version"], 1);
}

#[test]
fn session_actions_can_come_from_stdin() {
    let fixture = StoreFixture::init();
    let script = [
        r#"{"action": "comment", "row": 2, "value": "verify with ops"}"#,
        r#"{"action": "save"}"#,
    ]
    .join("\n");
    let output =
        fixture.run_with_stdin(&["session", "--actions", "-", "--json"], Some(&script));
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let changeset = fixture.read_json("draft/changeset.json");
    assert_eq!(changeset["lock_version"], 2);
    assert_eq!(changeset["rows"][1]["operation"], "UPDATE");
    assert_eq!(changeset["rows"][1]["comment"], "verify with ops");
}

#[test]
fn submit_refuses_incomplete_drafts() {
    let fixture = StoreFixture::init();
    let script = fixture.script(
        "edit.jsonl",
        &[
            r#"{"action": "edit", "row": 1, "column": "region", "value": "EU"}"#,
            r#"{"action": "set_reason", "value": "regional split"}"#,
            r#"{"action": "save"}"#,
        ],
    );
    fixture.run_ok(&["session", "--actions", path_arg(&script)]);

    let stderr = fixture.run_err(&["submit"]);
    assert!(stderr.contains("change_ticket_ref"));
    assert!(stderr.contains("change_category"));
    assert!(!stderr.contains("change_reason"));
    assert_eq!(fixture.status()["draft"]["status"], "DRAFT");
}

#[test]
fn forged_change_sets_are_rejected_at_submit() {
    let fixture = StoreFixture::init();
    let mut lines = COMPLETE_HEADER.to_vec();
    lines.extend([
        r#"{"action": "edit", "row": 1, "column": "region", "value": "EU"}"#,
        r#"{"action": "save"}"#,
    ]);
    let script = fixture.script("edits.jsonl", &lines);
    fixture.run_ok(&["session", "--actions", path_arg(&script)]);

    let mut changeset = fixture.read_json("draft/changeset.json");
    changeset["rows"][1]["operation"] = Value::from("UPDATE");
    std::fs::write(
        fixture.store.join("draft/changeset.json"),
        serde_json::to_string_pretty(&changeset).expect("serialize"),
    )
    .expect("write forged change-set");

    let stderr = fixture.run_err(&["submit"]);
    assert!(stderr.contains("does not match derived KEEP"));
}

#[test]
fn ingest_updates_keyed_rows_and_inserts_the_rest() {
    let fixture = StoreFixture::init();
    let mut config = fixture.read_json("config.json");
    config["key_columns"] = serde_json::json!(["code"]);
    std::fs::write(
        fixture.store.join("config.json"),
        serde_json::to_string_pretty(&config).expect("serialize"),
    )
    .expect("write config");

    let csv = fixture.scratch("upload.csv");
    std::fs::write(&csv, "code,region\nJP,APAC-2\nBR,LATAM\n,\n").expect("write csv");
    let stdout = fixture.run_ok(&["ingest", "--csv", path_arg(&csv)]);
    assert!(stdout.contains("inserted 1, updated 1, skipped 1"));

    let changeset = fixture.read_json("draft/changeset.json");
    assert_eq!(changeset["lock_version"], 2);
    assert_eq!(changeset["rows"][1]["operation"], "UPDATE");
    assert_eq!(changeset["rows"][2]["operation"], "INSERT");
    assert_eq!(changeset["rows"][2]["fields"]["code"], "BR");

    std::fs::write(&csv, "code,planet\nXX,Mars\n").expect("write csv");
    let stderr = fixture.run_err(&["ingest", "--csv", path_arg(&csv)]);
    assert!(stderr.contains("planet"));
    assert_eq!(fixture.read_json("draft/changeset.json")["lock_version"], 2);
}

#[test]
fn lifecycle_refusals() {
    let fixture = StoreFixture::init();
    let stderr = fixture.run_err(&["decide", "--reject"]);
    assert!(stderr.contains("expected SUBMITTED"));

    let stderr = fixture.run_err(&["init", "--entity", "country_map"]);
    assert!(stderr.contains("--force"));
    let stderr = fixture.run_err(&["init", "--entity", "currency", "--force"]);
    assert!(stderr.contains("holds entity"));
    fixture.run_ok(&["init", "--entity", "country_map", "--force"]);
    assert_eq!(fixture.read_json("draft/changeset.json")["lock_version"], 2);

    let script = fixture.script("save.jsonl", &[r#"{"action": "save"}"#]);
    let stderr = fixture.run_err(&["session", "--actions", path_arg(&script)]);
    assert!(stderr.contains("nothing to save"));

    let missing = tempfile::tempdir().expect("tempdir");
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_refdraft"))
        .args(["status", "--store"])
        .arg(missing.path())
        .output()
        .expect("run status");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("refdraft init"));
}

#[test]
fn template_output_feeds_ingest() {
    let fixture = StoreFixture::init();
    let template = fixture.scratch("template.csv");
    fixture.run_ok(&["template", "--out", path_arg(&template)]);
    let header = std::fs::read_to_string(&template).expect("read template");
    assert_eq!(header, "code,region\n");

    std::fs::write(&template, format!("{header}IT,EMEA\n")).expect("fill template");
    let stdout = fixture.run_ok(&["ingest", "--csv", path_arg(&template)]);
    assert!(stdout.contains("inserted 1"));

    let stderr = fixture.run_err(&["export", "--version", "9"]);
    assert!(stderr.contains("v9 of country_map is not kept"));
}
