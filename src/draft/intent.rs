//! Row intent: map a row's state onto its operation code.
use super::baseline::BaselineRow;
use super::dirty::is_content_dirty;
use super::model::Row;
use super::operation::RowOperation;

/// Derive the operation for `row` given its baseline counterpart.
///
/// Total and deterministic. Order of precedence: discard marker, retire flag,
/// missing baseline counterpart (`INSERT`), content dirtiness (`UPDATE`),
/// otherwise `KEEP`. A new row with every field blank is still an `INSERT`;
/// only an explicit discard takes it out of the proposal.
pub fn derive_operation(row: &Row, baseline: Option<&BaselineRow>) -> RowOperation {
    if row.discarded {
        return RowOperation::Discard;
    }
    if row.retire_flag {
        return RowOperation::Retire;
    }
    let Some(baseline) = baseline.filter(|_| row.identity.is_some()) else {
        return RowOperation::Insert;
    };
    if is_content_dirty(row, Some(baseline)) {
        RowOperation::Update
    } else {
        RowOperation::Keep
    }
}
