use super::baseline::{Baseline, BaselineRow, ColumnDef, FieldMap, RowIdentity};
use super::controller::DraftSession;
use super::header::HeaderField;
use super::model::Draft;

pub(crate) fn fields(pairs: &[(&str, &str)]) -> FieldMap {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Two approved rows over columns `A` and `B`: `R1 {A: x}` and `R2 {A: y}`.
pub(crate) fn two_row_baseline() -> Baseline {
    Baseline {
        entity: "country_map".to_string(),
        version: 3,
        columns: vec![
            ColumnDef {
                key: "A".to_string(),
                label: "Alpha".to_string(),
            },
            ColumnDef {
                key: "B".to_string(),
                label: String::new(),
            },
        ],
        rows: vec![
            BaselineRow {
                identity: RowIdentity::new("R1").expect("identity"),
                fields: fields(&[("A", "x"), ("B", "")]),
                comment: String::new(),
            },
            BaselineRow {
                identity: RowIdentity::new("R2").expect("identity"),
                fields: fields(&[("A", "y"), ("B", "")]),
                comment: String::new(),
            },
        ],
    }
}

pub(crate) fn open_session() -> DraftSession {
    DraftSession::new(Draft::from_baseline(two_row_baseline()))
}

/// Fill every header requirement.
pub(crate) fn complete_header(session: &mut DraftSession) {
    session
        .set_header(HeaderField::TicketRef, "CHG-1")
        .expect("ticket");
    session
        .set_header(HeaderField::Reason, "fix")
        .expect("reason");
    session
        .set_header(HeaderField::Category, "DATA_CORRECTION")
        .expect("category");
}
