use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Placeholder used throughout the sheet for "no value". Free-text fields
/// default to it; an RMA equal to it means the case has no RMA assigned yet.
pub const NOT_ASSIGNED: &str = "N/A";

pub(crate) fn norm(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

/// True when an RMA value means "not assigned yet" (empty or "N/A").
pub fn is_unassigned_rma(value: &str) -> bool {
    let n = norm(value);
    n.is_empty() || n == "n/a"
}

/// Closed two-value status for a workflow stage. All the "Yes"/"No"/"N/A"/
/// empty/null spellings in the source sheet collapse into this at load time,
/// so downstream logic never sees anything else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageStatus {
    Yes,
    #[default]
    No,
}

impl StageStatus {
    pub fn from_raw(value: &str) -> Self {
        match norm(value).as_str() {
            "yes" => StageStatus::Yes,
            _ => StageStatus::No,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StageStatus::Yes => "Yes",
            StageStatus::No => "No",
        }
    }

    pub fn is_yes(&self) -> bool {
        matches!(self, StageStatus::Yes)
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of the workflow: a Yes/No flag plus the moment it was set.
/// Stages are independently settable; there is no enforced transition order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub status: StageStatus,
    pub time: Option<NaiveDateTime>,
}

impl Stage {
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn done_at(time: NaiveDateTime) -> Self {
        Self {
            status: StageStatus::Yes,
            time: Some(time),
        }
    }

    /// Calendar date of the stage timestamp, when present.
    pub fn date(&self) -> Option<NaiveDate> {
        self.time.map(|t| t.date())
    }
}

/// One physical unit / repair case. Created by intake (outside this crate),
/// mutated in place as stages complete, never deleted; at rest once shipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub rma: String,
    pub serial: String,
    pub spc_code: String,
    pub part_number: String,
    pub description: String,
    pub fault_comments: String,
    pub resolution_comments: String,
    pub sender: String,
    pub estimate_complete: Stage,
    pub estimate_approved: Stage,
    pub estimate_sent: Stage,
    /// Recipient of the estimate, or "N/A" while unsent.
    pub sent_to_email: String,
    pub reminder_completed: Stage,
    /// How the reminder was delivered, or "N/A".
    pub contact_method: String,
    pub qa_approved: Stage,
    pub shipped: Stage,
}

impl ServiceRecord {
    pub fn new(rma: impl Into<String>, serial: impl Into<String>) -> Self {
        Self {
            rma: rma.into(),
            serial: serial.into(),
            spc_code: NOT_ASSIGNED.to_string(),
            part_number: NOT_ASSIGNED.to_string(),
            description: NOT_ASSIGNED.to_string(),
            fault_comments: NOT_ASSIGNED.to_string(),
            resolution_comments: NOT_ASSIGNED.to_string(),
            sender: NOT_ASSIGNED.to_string(),
            estimate_complete: Stage::pending(),
            estimate_approved: Stage::pending(),
            estimate_sent: Stage::pending(),
            sent_to_email: NOT_ASSIGNED.to_string(),
            reminder_completed: Stage::pending(),
            contact_method: NOT_ASSIGNED.to_string(),
            qa_approved: Stage::pending(),
            shipped: Stage::pending(),
        }
    }

    /// True once an estimate has actually gone out to a recipient.
    pub fn has_sent_email(&self) -> bool {
        !is_unassigned_rma(&self.sent_to_email)
    }

    pub fn not_shipped(&self) -> bool {
        !self.shipped.status.is_yes()
    }

    pub fn identity(&self) -> RecordIdentity {
        RecordIdentity::new(&self.rma, &self.serial)
    }
}

/// Normalized (RMA, serial) lookup key. Comparison is case-insensitive and
/// whitespace-trimmed; an empty/"N/A" RMA acts as a wildcard that only
/// matches rows whose own RMA is also unassigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordIdentity {
    rma: String,
    serial: String,
}

impl RecordIdentity {
    pub fn new(rma: &str, serial: &str) -> Self {
        let rma = if is_unassigned_rma(rma) {
            String::new()
        } else {
            norm(rma)
        };
        Self {
            rma,
            serial: norm(serial),
        }
    }

    pub fn is_unassigned(&self) -> bool {
        self.rma.is_empty()
    }

    pub fn rma(&self) -> &str {
        &self.rma
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn matches(&self, record: &ServiceRecord) -> bool {
        self.matches_identity(&record.identity())
    }

    pub fn matches_identity(&self, other: &RecordIdentity) -> bool {
        if self.serial != other.serial {
            return false;
        }
        if self.is_unassigned() {
            other.is_unassigned()
        } else {
            self.rma == other.rma
        }
    }
}

impl fmt::Display for RecordIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rma = if self.rma.is_empty() { "n/a" } else { &self.rma };
        write!(f, "{}/{}", rma, self.serial)
    }
}

/// Immutable in-memory view of the record table. Every detector and report
/// generator takes a snapshot by reference; "refresh" means fetching a new
/// snapshot, never mutating an old one.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub records: Vec<ServiceRecord>,
    pub fetched_at: NaiveDateTime,
}

impl Snapshot {
    pub fn new(records: Vec<ServiceRecord>, fetched_at: NaiveDateTime) -> Self {
        Self {
            records,
            fetched_at,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_normalizes_every_placeholder_to_no() {
        for raw in ["", "n/a", "N/A", "NaN", "nan", "None", "NaT", "no", "No "] {
            assert_eq!(StageStatus::from_raw(raw), StageStatus::No, "raw={raw:?}");
        }
        assert_eq!(StageStatus::from_raw(" yes"), StageStatus::Yes);
        assert_eq!(StageStatus::from_raw("YES"), StageStatus::Yes);
    }

    #[test]
    fn unassigned_rma_matches_unassigned_rows_only() {
        let lookup = RecordIdentity::new("N/A", "SN1");
        let mut blank = ServiceRecord::new("", "sn1");
        assert!(lookup.matches(&blank));
        blank.rma = " n/a ".to_string();
        assert!(lookup.matches(&blank));

        let assigned = ServiceRecord::new("RMA100", "SN1");
        assert!(!lookup.matches(&assigned));
    }

    #[test]
    fn concrete_rma_requires_exact_match_on_both_fields() {
        let lookup = RecordIdentity::new(" rma100 ", "SN1");
        assert!(lookup.matches(&ServiceRecord::new("RMA100", " sn1 ")));
        assert!(!lookup.matches(&ServiceRecord::new("RMA100", "SN2")));
        assert!(!lookup.matches(&ServiceRecord::new("", "SN1")));
    }
}
