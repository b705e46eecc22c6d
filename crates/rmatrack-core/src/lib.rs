//! Core logic for tracking repair/service-order (RMA) records through the
//! fixed estimate → approval → QA → shipping workflow: typed record model,
//! sheet normalization, overdue detection, daily report snapshots, archive
//! catch-up, and end-of-day reconciliation.

pub mod config;
pub mod error;
pub mod links;
pub mod locate;
pub mod model;
pub mod overdue;
pub mod reconcile;
pub mod report;
pub mod sheet;
pub mod store;
pub mod update;

pub use error::{CoreError, Result};
pub use model::{RecordIdentity, ServiceRecord, Snapshot, Stage, StageStatus};
pub use report::{generate_daily_report, DailyReport};

#[cfg(test)]
mod tests;
