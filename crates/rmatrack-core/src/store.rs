//! Boundary traits for the two external stores, plus in-memory
//! implementations that define the reference semantics and back the tests.
//!
//! Store I/O is all-or-nothing per call. Failures surface as
//! `CoreError::Store`; retries, if any, belong to the adapter behind the
//! trait, not to the core.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::locate::find_row_in_sheet;
use crate::model::RecordIdentity;
use crate::reconcile::EodSummary;
use crate::report::DailyReport;
use crate::sheet::RawSheet;

/// The live record table (externally, a spreadsheet-backed row store).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Reads the whole table. One read per logical operation; the result
    /// is treated as immutable for the duration of the computation.
    async fn load_all(&self) -> Result<RawSheet>;

    /// Applies a batch of (column, value) cell writes to the row backing
    /// `identity`. Returns false when no row matches; no update performed.
    async fn update_cells(
        &self,
        identity: &RecordIdentity,
        updates: &[(String, String)],
    ) -> Result<bool>;
}

/// The report archive. Saves are idempotent per date: saving a date that
/// already exists is a no-op returning false, never an overwrite.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    async fn save_if_absent(&self, report: &DailyReport) -> Result<bool>;

    async fn load_report(&self, date: NaiveDate) -> Result<Option<DailyReport>>;

    /// Most recent archived report date, or None for an empty archive.
    async fn last_archived_date(&self) -> Result<Option<NaiveDate>>;

    async fn save_eod_if_absent(&self, summary: &EodSummary) -> Result<bool>;

    async fn load_eod(&self, date: NaiveDate) -> Result<Option<EodSummary>>;
}

/// In-memory record store over a raw sheet.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    sheet: Mutex<RawSheet>,
}

impl MemoryRecordStore {
    pub fn new(sheet: RawSheet) -> Self {
        Self {
            sheet: Mutex::new(sheet),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn load_all(&self) -> Result<RawSheet> {
        Ok(self.sheet.lock().expect("sheet lock poisoned").clone())
    }

    async fn update_cells(
        &self,
        identity: &RecordIdentity,
        updates: &[(String, String)],
    ) -> Result<bool> {
        let mut sheet = self.sheet.lock().expect("sheet lock poisoned");
        let Some(row_idx) = find_row_in_sheet(&sheet, identity) else {
            return Ok(false);
        };

        for (column, value) in updates {
            let col_idx = match sheet.column_index(column) {
                Some(idx) => idx,
                // The source sheet grows columns on demand.
                None => {
                    sheet.headers.push(column.clone());
                    sheet.headers.len() - 1
                }
            };
            let row = &mut sheet.rows[row_idx];
            if row.len() <= col_idx {
                row.resize(col_idx + 1, String::new());
            }
            row[col_idx] = value.clone();
        }
        Ok(true)
    }
}

/// In-memory archive keyed by date.
#[derive(Debug, Default)]
pub struct MemoryArchiveStore {
    reports: Mutex<BTreeMap<NaiveDate, DailyReport>>,
    summaries: Mutex<BTreeMap<NaiveDate, EodSummary>>,
}

impl MemoryArchiveStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report_count(&self) -> usize {
        self.reports.lock().expect("archive lock poisoned").len()
    }
}

#[async_trait]
impl ArchiveStore for MemoryArchiveStore {
    async fn save_if_absent(&self, report: &DailyReport) -> Result<bool> {
        let mut reports = self.reports.lock().expect("archive lock poisoned");
        if reports.contains_key(&report.date) {
            return Ok(false);
        }
        reports.insert(report.date, report.clone());
        Ok(true)
    }

    async fn load_report(&self, date: NaiveDate) -> Result<Option<DailyReport>> {
        Ok(self
            .reports
            .lock()
            .expect("archive lock poisoned")
            .get(&date)
            .cloned())
    }

    async fn last_archived_date(&self) -> Result<Option<NaiveDate>> {
        Ok(self
            .reports
            .lock()
            .expect("archive lock poisoned")
            .keys()
            .next_back()
            .copied())
    }

    async fn save_eod_if_absent(&self, summary: &EodSummary) -> Result<bool> {
        let mut summaries = self.summaries.lock().expect("archive lock poisoned");
        if summaries.contains_key(&summary.date) {
            return Ok(false);
        }
        summaries.insert(summary.date, summary.clone());
        Ok(true)
    }

    async fn load_eod(&self, date: NaiveDate) -> Result<Option<EodSummary>> {
        Ok(self
            .summaries
            .lock()
            .expect("archive lock poisoned")
            .get(&date)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::columns;

    fn sheet() -> RawSheet {
        RawSheet {
            headers: vec!["RMA".to_string(), "S/N".to_string(), "Shipped".to_string()],
            rows: vec![vec!["5001".to_string(), "SN1".to_string(), "No".to_string()]],
        }
    }

    #[tokio::test]
    async fn update_cells_writes_matched_row() {
        let store = MemoryRecordStore::new(sheet());
        let updated = store
            .update_cells(
                &RecordIdentity::new("5001", "sn1"),
                &[(columns::SHIPPED.to_string(), "Yes".to_string())],
            )
            .await
            .unwrap();
        assert!(updated);

        let sheet = store.load_all().await.unwrap();
        assert_eq!(sheet.cell(0, 2), Some("Yes"));
    }

    #[tokio::test]
    async fn update_cells_misses_without_writing() {
        let store = MemoryRecordStore::new(sheet());
        let updated = store
            .update_cells(
                &RecordIdentity::new("9999", "SN1"),
                &[(columns::SHIPPED.to_string(), "Yes".to_string())],
            )
            .await
            .unwrap();
        assert!(!updated);
        assert_eq!(store.load_all().await.unwrap(), sheet());
    }

    #[tokio::test]
    async fn update_cells_grows_missing_columns() {
        let store = MemoryRecordStore::new(sheet());
        store
            .update_cells(
                &RecordIdentity::new("5001", "SN1"),
                &[(columns::SHIPPED_TIME.to_string(), "2024-06-10 09:00:00".to_string())],
            )
            .await
            .unwrap();
        let sheet = store.load_all().await.unwrap();
        assert_eq!(sheet.column_index(columns::SHIPPED_TIME), Some(3));
        assert_eq!(sheet.cell(0, 3), Some("2024-06-10 09:00:00"));
    }

    #[tokio::test]
    async fn archive_save_is_idempotent_per_date() {
        let archive = MemoryArchiveStore::new();
        let report = DailyReport {
            date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            needs_shipping: Vec::new(),
            needs_estimate_creation: Vec::new(),
            needs_reminder: Vec::new(),
        };
        assert!(archive.save_if_absent(&report).await.unwrap());
        assert!(!archive.save_if_absent(&report).await.unwrap());
        assert_eq!(archive.report_count(), 1);
        assert_eq!(
            archive.last_archived_date().await.unwrap(),
            Some(report.date)
        );
    }
}
