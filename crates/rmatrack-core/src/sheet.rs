//! Translation between the external row store (a spreadsheet-shaped source
//! of string cells) and the typed in-memory table. All normalization of
//! missing and placeholder values happens here, once, at load time.

use std::collections::HashMap;
use std::io::Read;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{ServiceRecord, Stage, StageStatus, NOT_ASSIGNED};

/// Timestamps are written back to the store in this shape.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Logical column names of the record sheet. The physical source may be
/// missing columns or carry them in a different order; mapping is by name.
pub mod columns {
    pub const RMA: &str = "RMA";
    pub const SPC_CODE: &str = "SPC Code";
    pub const PART_NUMBER: &str = "Part Number";
    pub const SERIAL: &str = "S/N";
    pub const DESCRIPTION: &str = "Description";
    pub const FAULT_COMMENTS: &str = "Fault Comments";
    pub const RESOLUTION_COMMENTS: &str = "Resolution Comments";
    pub const SENDER: &str = "Sender";
    pub const ESTIMATE_COMPLETE_TIME: &str = "Estimate Complete Time";
    pub const ESTIMATE_COMPLETE: &str = "Estimate Complete";
    pub const ESTIMATE_APPROVED: &str = "Estimate Approved";
    pub const ESTIMATE_APPROVED_TIME: &str = "Estimate Approved Time";
    pub const ESTIMATE_SENT_TO_EMAIL: &str = "Estimate Sent To Email";
    pub const ESTIMATE_SENT_TIME: &str = "Estimate Sent Time";
    pub const REMINDER_COMPLETED: &str = "Reminder Completed";
    pub const REMINDER_COMPLETED_TIME: &str = "Reminder Completed Time";
    pub const REMINDER_CONTACT_METHOD: &str = "Reminder Contact Method";
    pub const QA_APPROVED: &str = "QA Approved";
    pub const QA_APPROVED_TIME: &str = "QA Approved Time";
    pub const SHIPPED: &str = "Shipped";
    pub const SHIPPED_TIME: &str = "Shipped Time";
}

/// Canonical column order, used when materializing a sheet from scratch.
pub const FIELDS: [&str; 21] = [
    columns::RMA,
    columns::SPC_CODE,
    columns::PART_NUMBER,
    columns::SERIAL,
    columns::DESCRIPTION,
    columns::FAULT_COMMENTS,
    columns::RESOLUTION_COMMENTS,
    columns::SENDER,
    columns::ESTIMATE_COMPLETE_TIME,
    columns::ESTIMATE_COMPLETE,
    columns::ESTIMATE_APPROVED,
    columns::ESTIMATE_APPROVED_TIME,
    columns::ESTIMATE_SENT_TO_EMAIL,
    columns::ESTIMATE_SENT_TIME,
    columns::REMINDER_COMPLETED,
    columns::REMINDER_COMPLETED_TIME,
    columns::REMINDER_CONTACT_METHOD,
    columns::QA_APPROVED,
    columns::QA_APPROVED_TIME,
    columns::SHIPPED,
    columns::SHIPPED_TIME,
];

/// Raw rows exactly as the row store hands them over: a header row plus
/// string cells. Rows may be ragged (shorter than the header).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawSheet {
    /// An empty sheet carrying the canonical header row.
    pub fn with_canonical_headers() -> Self {
        Self {
            headers: FIELDS.iter().map(|f| f.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col)).map(|s| s.as_str())
    }
}

/// Parses a sheet timestamp. The source mixes full timestamps, minute
/// precision, ISO 'T' separators, and bare dates; anything else coerces
/// to None rather than failing the row.
pub fn parse_sheet_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    const FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
    for format in FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(ts);
        }
    }
    chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn is_placeholder_text(value: &str) -> bool {
    let n = value.trim().to_ascii_lowercase();
    n.is_empty() || matches!(n.as_str(), "n/a" | "nan" | "none" | "nat" | "null")
}

struct ColumnIndex {
    by_name: HashMap<&'static str, usize>,
}

impl ColumnIndex {
    fn build(headers: &[String]) -> Self {
        let mut by_name = HashMap::new();
        for field in FIELDS {
            if let Some(idx) = headers.iter().position(|h| h.trim() == field) {
                by_name.insert(field, idx);
            }
        }
        Self { by_name }
    }

    fn raw<'a>(&self, row: &'a [String], field: &'static str) -> Option<&'a str> {
        self.by_name
            .get(field)
            .and_then(|&idx| row.get(idx))
            .map(|s| s.as_str())
    }

    /// Free-text cell; a missing column or placeholder value becomes "N/A".
    fn text(&self, row: &[String], field: &'static str) -> String {
        match self.raw(row, field) {
            Some(value) if !is_placeholder_text(value) => value.trim().to_string(),
            _ => NOT_ASSIGNED.to_string(),
        }
    }

    fn stage(&self, row: &[String], status_field: &'static str, time_field: &'static str) -> Stage {
        Stage {
            status: StageStatus::from_raw(self.raw(row, status_field).unwrap_or_default()),
            time: self
                .raw(row, time_field)
                .and_then(parse_sheet_timestamp),
        }
    }
}

/// Maps raw rows into typed records. Missing columns default per field
/// kind (status: No, timestamp: None, text: "N/A") instead of failing;
/// a source with no usable columns yields records that match nothing.
pub fn records_from_sheet(sheet: &RawSheet) -> Vec<ServiceRecord> {
    let index = ColumnIndex::build(&sheet.headers);
    sheet
        .rows
        .iter()
        .map(|row| ServiceRecord {
            rma: index.text(row, columns::RMA),
            serial: index.text(row, columns::SERIAL),
            spc_code: index.text(row, columns::SPC_CODE),
            part_number: index.text(row, columns::PART_NUMBER),
            description: index.text(row, columns::DESCRIPTION),
            fault_comments: index.text(row, columns::FAULT_COMMENTS),
            resolution_comments: index.text(row, columns::RESOLUTION_COMMENTS),
            sender: index.text(row, columns::SENDER),
            estimate_complete: index.stage(
                row,
                columns::ESTIMATE_COMPLETE,
                columns::ESTIMATE_COMPLETE_TIME,
            ),
            estimate_approved: index.stage(
                row,
                columns::ESTIMATE_APPROVED,
                columns::ESTIMATE_APPROVED_TIME,
            ),
            estimate_sent: Stage {
                // The sent stage has no dedicated status column; having a
                // real recipient email is what marks it done.
                status: if is_placeholder_text(
                    index.raw(row, columns::ESTIMATE_SENT_TO_EMAIL).unwrap_or_default(),
                ) {
                    StageStatus::No
                } else {
                    StageStatus::Yes
                },
                time: index
                    .raw(row, columns::ESTIMATE_SENT_TIME)
                    .and_then(parse_sheet_timestamp),
            },
            sent_to_email: index.text(row, columns::ESTIMATE_SENT_TO_EMAIL),
            reminder_completed: index.stage(
                row,
                columns::REMINDER_COMPLETED,
                columns::REMINDER_COMPLETED_TIME,
            ),
            contact_method: index.text(row, columns::REMINDER_CONTACT_METHOD),
            qa_approved: index.stage(row, columns::QA_APPROVED, columns::QA_APPROVED_TIME),
            shipped: index.stage(row, columns::SHIPPED, columns::SHIPPED_TIME),
        })
        .collect()
}

/// Reads a CSV export of the record sheet (first row = headers).
pub fn read_sheet_csv<R: Read>(reader: R) -> Result<RawSheet> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = csv_reader.records();
    let headers = match records.next() {
        Some(header_row) => header_row?.iter().map(|h| h.to_string()).collect(),
        None => return Ok(RawSheet::default()),
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record?;
        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }

    Ok(RawSheet { headers, rows })
}
