use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod draft;
mod ingest;
mod staging;
mod store;
mod util;
mod workflow;

use cli::{Command, RootArgs};

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_tracing(args.verbose);

    match &args.command {
        Command::Init(args) => workflow::run_init(args),
        Command::Status(args) => workflow::run_status(args),
        Command::Session(args) => workflow::run_session(args),
        Command::Ingest(args) => workflow::run_ingest(args),
        Command::Submit(args) => workflow::run_submit(args),
        Command::Decide(args) => workflow::run_decide(args),
        Command::Diff(args) => workflow::run_diff(args),
        Command::Compare(args) => workflow::run_compare(args),
        Command::Export(args) => workflow::run_export(args),
        Command::Template(args) => workflow::run_template(args),
    }
}
