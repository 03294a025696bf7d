//! Workflow export steps: write an approved version, or the empty CSV
//! template that ingest accepts.
use super::StoreContext;
use crate::cli::{ExportArgs, ExportFormat, TemplateArgs};
use crate::draft::{Baseline, BaselineFile};
use crate::store;
use anyhow::{anyhow, Context, Result};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use tracing::info;

const IDENTITY_HEADER: &str = "identity";
const COMMENT_HEADER: &str = "comment";

/// Business columns in output order: the defined columns, or every key the
/// rows carry when the entity defines none.
fn business_columns(baseline: &Baseline) -> Vec<String> {
    if baseline.defines_columns() {
        return baseline.column_keys();
    }
    baseline
        .rows
        .iter()
        .flat_map(|row| row.fields.keys())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Write one approved snapshot. CSV carries the identity, every business
/// column, and the comment; JSON uses the `baseline.json` shape.
pub(crate) fn write_export<W: Write>(
    baseline: &Baseline,
    format: ExportFormat,
    mut out: W,
) -> Result<()> {
    match format {
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &BaselineFile::from_baseline(baseline))
                .context("serialize export")?;
            out.write_all(b"\n").context("write export")?;
        }
        ExportFormat::Csv => {
            let columns = business_columns(baseline);
            let mut writer = csv::Writer::from_writer(out);
            writer
                .write_record(
                    std::iter::once(IDENTITY_HEADER)
                        .chain(columns.iter().map(String::as_str))
                        .chain(std::iter::once(COMMENT_HEADER)),
                )
                .context("write CSV header")?;
            for row in &baseline.rows {
                writer
                    .write_record(
                        std::iter::once(row.identity.as_str())
                            .chain(columns.iter().map(|column| row.value(column)))
                            .chain(std::iter::once(row.comment.as_str())),
                    )
                    .with_context(|| format!("write CSV row {}", row.identity))?;
            }
            writer.flush().context("flush CSV")?;
        }
    }
    Ok(())
}

/// Write the bulk-insert template: one header row naming the business columns.
pub(crate) fn write_template<W: Write>(baseline: &Baseline, out: W) -> Result<()> {
    let columns = business_columns(baseline);
    if columns.is_empty() {
        return Err(anyhow!(
            "{} has no columns yet; approve a version with data first",
            baseline.entity
        ));
    }
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(&columns).context("write CSV header")?;
    writer.flush().context("flush CSV")?;
    Ok(())
}

fn open_output(out: Option<&Path>) -> Result<Box<dyn Write>> {
    match out {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

/// Run the export command.
pub fn run_export(args: &ExportArgs) -> Result<()> {
    let ctx = StoreContext::load(args.store.clone())?;
    let baseline = match args.version {
        Some(version) if version != ctx.baseline.version => {
            store::load_baseline_version(&ctx.paths, &ctx.config.entity, version)?
        }
        _ => ctx.baseline.clone(),
    };
    write_export(&baseline, args.format, open_output(args.out.as_deref())?)?;
    info!(
        version = baseline.version,
        rows = baseline.rows.len(),
        "exported approved version"
    );
    Ok(())
}

/// Run the template command.
pub fn run_template(args: &TemplateArgs) -> Result<()> {
    let ctx = StoreContext::load(args.store.clone())?;
    write_template(&ctx.baseline, open_output(args.out.as_deref())?)
}
