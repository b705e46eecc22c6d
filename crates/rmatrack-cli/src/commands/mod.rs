pub mod archive;
pub mod import;
pub mod mark;
pub mod overdue;
pub mod report;
pub mod search;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};

use rmatrack_core::config::TrackerConfig;
use rmatrack_core::model::Snapshot;
use rmatrack_core::report::DailyReport;
use rmatrack_core::sheet::{read_sheet_csv, records_from_sheet};
use rmatrack_core::store::RecordStore;
use rmatrack_repository::PgStore;

pub fn load_config(path: Option<&Path>) -> Result<TrackerConfig> {
    match path {
        Some(path) => TrackerConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(TrackerConfig::default()),
    }
}

pub async fn connect_store() -> Result<PgStore> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    Ok(PgStore::connect(&database_url, 5).await?)
}

pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// One fresh snapshot of the record table.
pub async fn load_snapshot(store: &dyn RecordStore) -> Result<Snapshot> {
    let sheet = store.load_all().await?;
    Ok(Snapshot::new(records_from_sheet(&sheet), now()))
}

pub fn print_report_summary_row(report: &DailyReport) {
    println!(
        "  {}: {} shipping, {} estimate, {} reminder task(s)",
        report.date,
        report.needs_shipping.len(),
        report.needs_estimate_creation.len(),
        report.needs_reminder.len(),
    );
}

/// Snapshot from a CSV export, for running read-only commands offline.
pub fn snapshot_from_csv(path: &Path) -> Result<Snapshot> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let sheet = read_sheet_csv(file)?;
    Ok(Snapshot::new(records_from_sheet(&sheet), now()))
}
