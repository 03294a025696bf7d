//! Workflow orchestration for the maker-checker draft loop.
//!
//! Each command loads the store once, runs one step, and publishes through a
//! staging transaction so the CLI stays thin.
mod boundary;
mod compare;
mod context;
mod decide;
mod diff;
mod export;
mod ingest;
mod init;
mod session;
mod status;

pub use boundary::run_submit;
pub use compare::run_compare;
pub(crate) use context::StoreContext;
pub use decide::run_decide;
pub use diff::run_diff;
pub use export::{run_export, run_template};
pub use ingest::run_ingest;
pub use init::run_init;
pub use session::run_session;
pub use status::run_status;
