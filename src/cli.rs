//! CLI argument parsing for the reference-data draft workflow.
//!
//! The CLI stays thin: every command resolves a store root and hands off to
//! one `run_*` function in the workflow module.
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "refdraft",
    version,
    about = "Maker-checker drafts for governed reference data",
    after_help = "Commands:\n  init --store <dir> --entity <name>     Create a store and open a draft\n  status --store <dir>                   Summarize the draft and what blocks submission\n  session --store <dir> --actions <file> Apply a JSON-lines action script in one session\n  ingest --store <dir> --csv <file>      Bulk-load rows from CSV and save once\n  submit --store <dir>                   Submit the saved draft for approval\n  decide --store <dir> --approve|--reject  Record the checker's decision\n  diff --store <dir>                     Compare the draft with the approved baseline\n  compare --store <dir> --from <N>       Compare two approved versions\n  export --store <dir> --format csv|json Write an approved version\n  template --store <dir>                 Write the bulk-insert CSV header row\n\nExamples:\n  refdraft init --store /tmp/country-map --entity country_map\n  refdraft session --store /tmp/country-map --actions edits.jsonl\n  refdraft status --store /tmp/country-map --json\n  refdraft submit --store /tmp/country-map\n  refdraft export --store /tmp/country-map --format json --version 3",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Log progress at info level (RUST_LOG overrides)
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level workflow commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Init(InitArgs),
    Status(StatusArgs),
    Session(SessionArgs),
    Ingest(IngestArgs),
    Submit(SubmitArgs),
    Decide(DecideArgs),
    Diff(DiffArgs),
    Compare(CompareArgs),
    Export(ExportArgs),
    Template(TemplateArgs),
}

/// Init command inputs for creating a store or starting a new draft.
#[derive(Parser, Debug)]
#[command(about = "Create a store (config + baseline) and open a draft")]
pub struct InitArgs {
    /// Store root holding config, baseline, draft, and history
    #[arg(long, value_name = "DIR")]
    pub store: PathBuf,

    /// Entity whose reference data the store governs
    #[arg(long, value_name = "NAME")]
    pub entity: String,

    /// Supersede a draft that is still open or awaiting a decision
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Summarize the draft, its requirements, and the next action")]
pub struct StatusArgs {
    /// Store root holding config, baseline, draft, and history
    #[arg(long, value_name = "DIR")]
    pub store: PathBuf,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

/// Session command inputs: one synchronous editing session driven by a script.
#[derive(Parser, Debug)]
#[command(about = "Apply a JSON-lines action script to the draft")]
pub struct SessionArgs {
    /// Store root holding config, baseline, draft, and history
    #[arg(long, value_name = "DIR")]
    pub store: PathBuf,

    /// JSON-lines file with one action per line (`-` reads stdin)
    #[arg(long, value_name = "FILE")]
    pub actions: PathBuf,

    /// Confirm leaving the session with unsaved changes
    #[arg(long)]
    pub discard_unsaved: bool,

    /// Emit a machine-readable session report
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Bulk-load rows from a CSV file into the draft")]
pub struct IngestArgs {
    /// Store root holding config, baseline, draft, and history
    #[arg(long, value_name = "DIR")]
    pub store: PathBuf,

    /// CSV file whose header row names column keys
    #[arg(long, value_name = "FILE")]
    pub csv: PathBuf,
}

#[derive(Parser, Debug)]
#[command(about = "Submit the saved draft for approval")]
pub struct SubmitArgs {
    /// Store root holding config, baseline, draft, and history
    #[arg(long, value_name = "DIR")]
    pub store: PathBuf,
}

/// Decide command inputs for the checker.
#[derive(Parser, Debug)]
#[command(about = "Approve or reject a submitted draft")]
#[command(group(ArgGroup::new("decision").required(true).args(["approve", "reject"])))]
pub struct DecideArgs {
    /// Store root holding config, baseline, draft, and history
    #[arg(long, value_name = "DIR")]
    pub store: PathBuf,

    /// Promote the draft to the new approved baseline
    #[arg(long)]
    pub approve: bool,

    /// Close the draft without changing the baseline
    #[arg(long)]
    pub reject: bool,

    /// Checker note recorded with the decision
    #[arg(long, value_name = "TEXT")]
    pub note: Option<String>,
}

#[derive(Parser, Debug)]
#[command(about = "Compare the draft with the approved baseline")]
pub struct DiffArgs {
    /// Store root holding config, baseline, draft, and history
    #[arg(long, value_name = "DIR")]
    pub store: PathBuf,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,

    /// Include unchanged rows and cells
    #[arg(long)]
    pub all: bool,
}

/// Compare command inputs: two approved versions of the entity.
#[derive(Parser, Debug)]
#[command(about = "Compare two approved versions of the baseline")]
pub struct CompareArgs {
    /// Store root holding config, baseline, draft, and history
    #[arg(long, value_name = "DIR")]
    pub store: PathBuf,

    /// Older version (defaults to the one before --to)
    #[arg(long, value_name = "N")]
    pub from: Option<u32>,

    /// Newer version (defaults to the current baseline)
    #[arg(long, value_name = "N")]
    pub to: Option<u32>,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,

    /// Include unchanged rows and cells
    #[arg(long)]
    pub all: bool,
}

/// Output encodings for an exported approved version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

#[derive(Parser, Debug)]
#[command(about = "Write an approved version as CSV or JSON")]
pub struct ExportArgs {
    /// Store root holding config, baseline, draft, and history
    #[arg(long, value_name = "DIR")]
    pub store: PathBuf,

    /// Output encoding
    #[arg(long, value_enum, default_value = "csv")]
    pub format: ExportFormat,

    /// Approved version to export (defaults to the current baseline)
    #[arg(long, value_name = "N")]
    pub version: Option<u32>,

    /// Write to a file instead of stdout
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(about = "Write the CSV header row accepted by ingest")]
pub struct TemplateArgs {
    /// Store root holding config, baseline, draft, and history
    #[arg(long, value_name = "DIR")]
    pub store: PathBuf,

    /// Write to a file instead of stdout
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}
