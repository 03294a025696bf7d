//! Shared test infrastructure for integration tests.

use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// Baseline with two approved rows and two defined columns.
pub const COUNTRY_BASELINE: &str = r#"{
  "schema_version": 1,
  "entity": "country_map",
  "version": 3,
  "columns": [
    {"key": "code", "label": "Country code"},
    {"key": "region", "label": "Region"}
  ],
  "rows": [
    {"identity": "C-FR", "fields": {"code": "FR", "region": "EMEA"}},
    {"identity": "C-JP", "fields": {"code": "JP", "region": "APAC"}}
  ]
}
"#;

/// One store directory driven through the `refdraft` binary.
pub struct StoreFixture {
    _temp: TempDir,
    pub store: PathBuf,
}

impl StoreFixture {
    /// Create a store seeded with [`COUNTRY_BASELINE`] and run `init`.
    pub fn init() -> Self {
        let temp = TempDir::new().expect("tempdir");
        let store = temp.path().join("store");
        std::fs::create_dir_all(&store).expect("create store");
        std::fs::write(store.join("baseline.json"), COUNTRY_BASELINE).expect("seed baseline");
        let fixture = Self { _temp: temp, store };
        fixture.run_ok(&["init", "--entity", "country_map"]);
        fixture
    }

    /// Run a subcommand with `--store` appended.
    pub fn run(&self, args: &[&str]) -> Output {
        self.run_with_stdin(args, None)
    }

    pub fn run_with_stdin(&self, args: &[&str], stdin: Option<&str>) -> Output {
        let mut child = Command::new(env!("CARGO_BIN_EXE_refdraft"))
            .args(args)
            .arg("--store")
            .arg(&self.store)
            .env_remove("RUST_LOG")
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("spawn refdraft");
        if let Some(text) = stdin {
            child
                .stdin
                .take()
                .expect("stdin pipe")
                .write_all(text.as_bytes())
                .expect("write stdin");
        }
        child.wait_with_output().expect("wait for refdraft")
    }

    /// Run and require success, returning stdout.
    pub fn run_ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "refdraft {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// Run and require failure, returning stderr.
    pub fn run_err(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "refdraft {:?} unexpectedly succeeded: {}",
            args,
            String::from_utf8_lossy(&output.stdout)
        );
        String::from_utf8_lossy(&output.stderr).into_owned()
    }

    /// Write an action script into the temp dir and return its path.
    pub fn script(&self, name: &str, lines: &[&str]) -> PathBuf {
        let path = self.scratch(name);
        std::fs::write(&path, lines.join("\n")).expect("write script");
        path
    }

    pub fn scratch(&self, name: &str) -> PathBuf {
        self._temp.path().join(name)
    }

    pub fn status(&self) -> Value {
        serde_json::from_str(&self.run_ok(&["status", "--json"])).expect("status json")
    }

    pub fn read_json(&self, rel: &str) -> Value {
        let text = std::fs::read_to_string(self.store.join(rel)).expect("read store file");
        serde_json::from_str(&text).expect("parse store file")
    }

    pub fn history_steps(&self) -> Vec<String> {
        let text = std::fs::read_to_string(self.store.join("history.jsonl")).expect("history");
        text.lines()
            .map(|line| {
                let entry: Value = serde_json::from_str(line).expect("history line");
                entry["step"].as_str().unwrap_or_default().to_string()
            })
            .collect()
    }
}

pub fn path_arg(path: &Path) -> &str {
    path.to_str().expect("utf-8 path")
}

/// Header actions that satisfy every header requirement.
pub const COMPLETE_HEADER: [&str; 3] = [
    r#"{"action": "set_ticket_ref", "value": "CHG-100"}"#,
    r#"{"action": "set_reason", "value": "quarterly review"}"#,
    r#"{"action": "set_category", "value": "DATA_CORRECTION"}"#,
];
