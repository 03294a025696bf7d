//! Header-level metadata of a draft.
//!
//! Header fields are dirty-tracked against the values captured when the draft
//! was opened, not against the approved baseline.
use serde::{Deserialize, Serialize};

/// Category selections that count as "nothing selected". Compared trimmed and
/// case-insensitively.
pub const CATEGORY_PLACEHOLDERS: [&str; 3] = ["", "none", "— select —"];

/// Header controls addressable by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    Reason,
    TicketRef,
    Category,
}

/// Live value plus the value it had at draft-open.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackedText {
    original: String,
    live: String,
}

impl TrackedText {
    pub fn opened(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            original: value.clone(),
            live: value,
        }
    }

    pub fn live(&self) -> &str {
        &self.live
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub(crate) fn set(&mut self, value: impl Into<String>) {
        self.live = value.into();
    }

    /// Exact, untrimmed inequality.
    pub fn is_dirty(&self) -> bool {
        self.live != self.original
    }
}

/// Metadata stored alongside the rows of a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DraftHeader {
    pub(crate) reason: TrackedText,
    pub(crate) ticket_ref: TrackedText,
    pub(crate) category: TrackedText,
    /// Cosmetic UI state carried through persistence; never affects correctness.
    pub(crate) expanded: bool,
}

impl DraftHeader {
    /// Header as opened from persisted metadata.
    pub fn opened(record: &HeaderRecord) -> Self {
        Self {
            reason: TrackedText::opened(record.change_reason.clone()),
            ticket_ref: TrackedText::opened(record.change_ticket_ref.clone()),
            category: TrackedText::opened(record.change_category.clone()),
            expanded: record.expanded,
        }
    }

    pub fn reason(&self) -> &str {
        self.reason.live()
    }

    pub fn ticket_ref(&self) -> &str {
        self.ticket_ref.live()
    }

    pub fn category(&self) -> &str {
        self.category.live()
    }

    pub fn expanded(&self) -> bool {
        self.expanded
    }

    pub(crate) fn field_mut(&mut self, field: HeaderField) -> &mut TrackedText {
        match field {
            HeaderField::Reason => &mut self.reason,
            HeaderField::TicketRef => &mut self.ticket_ref,
            HeaderField::Category => &mut self.category,
        }
    }

    pub fn is_field_dirty(&self, field: HeaderField) -> bool {
        match field {
            HeaderField::Reason => self.reason.is_dirty(),
            HeaderField::TicketRef => self.ticket_ref.is_dirty(),
            HeaderField::Category => {
                normalize_category(self.category.live())
                    != normalize_category(self.category.original())
            }
        }
    }

    pub fn is_dirty(&self) -> bool {
        [HeaderField::Reason, HeaderField::TicketRef, HeaderField::Category]
            .into_iter()
            .any(|field| self.is_field_dirty(field))
    }

    /// Snapshot of the live values for persistence.
    pub fn to_record(&self) -> HeaderRecord {
        HeaderRecord {
            change_ticket_ref: self.ticket_ref.live().to_string(),
            change_reason: self.reason.live().to_string(),
            change_category: self.category.live().to_string(),
            expanded: self.expanded,
        }
    }
}

/// Persisted header metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HeaderRecord {
    #[serde(default)]
    pub change_ticket_ref: String,
    #[serde(default)]
    pub change_reason: String,
    #[serde(default)]
    pub change_category: String,
    #[serde(default)]
    pub expanded: bool,
}

/// Normalized selection identifier used for category comparison.
pub fn normalize_category(value: &str) -> String {
    value.trim().to_lowercase()
}

/// True when the selection is a placeholder rather than a real category.
pub fn is_placeholder_category(value: &str) -> bool {
    let normalized = normalize_category(value);
    CATEGORY_PLACEHOLDERS
        .iter()
        .any(|placeholder| normalize_category(placeholder) == normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_fields_compare_untrimmed_and_category_case_insensitively() {
        let mut header = DraftHeader::opened(&HeaderRecord {
            change_ticket_ref: "CHG-1".to_string(),
            change_reason: "fix".to_string(),
            change_category: "DATA_CORRECTION".to_string(),
            expanded: false,
        });
        assert!(!header.is_dirty());

        header.field_mut(HeaderField::Reason).set("fix ");
        assert!(header.is_field_dirty(HeaderField::Reason));
        header.field_mut(HeaderField::Reason).set("fix");
        assert!(!header.is_field_dirty(HeaderField::Reason));

        header.field_mut(HeaderField::Category).set("data_correction");
        assert!(!header.is_field_dirty(HeaderField::Category));
        header.field_mut(HeaderField::Category).set("OTHER");
        assert!(header.is_dirty());
    }

    #[test]
    fn placeholders_match_any_case() {
        assert!(is_placeholder_category(""));
        assert!(is_placeholder_category("  NONE "));
        assert!(is_placeholder_category("— Select —"));
        assert!(!is_placeholder_category("OTHER"));
    }
}
