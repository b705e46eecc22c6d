//! The two reconciliation passes: day-by-day archive catch-up, and the
//! end-of-day diff of one archived report against the live table.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::locate::find_record;
use crate::model::{RecordIdentity, Snapshot};
use crate::report::{generate_daily_report, DailyReport, EstimateTask, ReminderTask, ShippingTask};
use crate::store::ArchiveStore;

/// Hard bound on how many days a single catch-up run may backfill. Guards
/// against runaway walks from a years-old default date.
pub const DEFAULT_MAX_CATCH_UP_DAYS: i64 = 30;

#[derive(Debug, Default)]
pub struct CatchUpOutcome {
    /// Reports newly written to the archive, in date order.
    pub saved: Vec<DailyReport>,
    /// Days in the walked span that were already archived.
    pub skipped_days: u32,
}

/// Walks forward from the day after the last archived date through `today`,
/// generating and saving each day's report. Already-archived days are
/// skipped, so repeated invocations never duplicate a day. An empty archive
/// starts at `today` (last date defaults to yesterday). Aborts with
/// `CatchUpOverflow` once the span exceeds `max_catch_up_days`; days saved
/// before the abort stay saved.
pub async fn catch_up_archive(
    snapshot: &Snapshot,
    archive: &dyn ArchiveStore,
    today: NaiveDate,
    max_catch_up_days: i64,
) -> Result<CatchUpOutcome> {
    let last_archived = archive
        .last_archived_date()
        .await?
        .unwrap_or(today - Duration::days(1));
    let start = last_archived + Duration::days(1);

    let mut outcome = CatchUpOutcome::default();
    let mut cursor = start;

    while cursor <= today {
        let report = generate_daily_report(snapshot, cursor);
        if archive.save_if_absent(&report).await? {
            tracing::info!(date = %cursor, "archived daily report");
            outcome.saved.push(report);
        } else {
            outcome.skipped_days += 1;
        }

        if cursor == today {
            break;
        }
        cursor += Duration::days(1);

        if (cursor - start).num_days() > max_catch_up_days {
            return Err(CoreError::CatchUpOverflow {
                pending_days: (today - start).num_days() + 1,
            });
        }
    }

    Ok(outcome)
}

/// Whether a snapshot task turned out to be done by end of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskOutcome {
    Completed,
    Pending,
}

impl TaskOutcome {
    fn from_done(done: bool) -> Self {
        if done {
            TaskOutcome::Completed
        } else {
            TaskOutcome::Pending
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskOutcome::Completed => "Completed",
            TaskOutcome::Pending => "Pending",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult<T> {
    pub task: T,
    pub outcome: TaskOutcome,
}

/// A shipment that happened on the summary date without having been in
/// that day's needs_shipping list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdhocShipment {
    pub rma: String,
    pub serial: String,
    pub spc_code: String,
    pub shipped_at: chrono::NaiveDateTime,
}

/// Same-day reconciliation of one archived report against the live table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EodSummary {
    pub date: NaiveDate,
    pub estimate_tasks: Vec<TaskResult<EstimateTask>>,
    pub reminder_tasks: Vec<TaskResult<ReminderTask>>,
    pub shipping_tasks: Vec<TaskResult<ShippingTask>>,
    pub adhoc_shipped_today: Vec<AdhocShipment>,
}

fn live_outcome<F>(snapshot: &Snapshot, rma: &str, serial: &str, done: F) -> TaskOutcome
where
    F: Fn(&crate::model::ServiceRecord) -> bool,
{
    match find_record(&snapshot.records, &RecordIdentity::new(rma, serial)) {
        Some((_, record)) => TaskOutcome::from_done(done(record)),
        // Not found live: conservative default.
        None => TaskOutcome::Pending,
    }
}

/// Re-checks each task of a day's report against the live table and
/// surfaces ad-hoc shipments the snapshot never flagged. Identity
/// comparison follows the locator rules (normalized, null-RMA wildcard).
pub fn reconcile_eod(report: &DailyReport, snapshot: &Snapshot) -> EodSummary {
    let estimate_tasks = report
        .needs_estimate_creation
        .iter()
        .map(|task| TaskResult {
            outcome: live_outcome(snapshot, &task.rma, &task.serial, |r| {
                r.has_sent_email()
            }),
            task: task.clone(),
        })
        .collect();

    let reminder_tasks = report
        .needs_reminder
        .iter()
        .map(|task| TaskResult {
            outcome: live_outcome(snapshot, &task.rma, &task.serial, |r| {
                r.reminder_completed.status.is_yes()
            }),
            task: task.clone(),
        })
        .collect();

    let shipping_tasks = report
        .needs_shipping
        .iter()
        .map(|task| TaskResult {
            outcome: live_outcome(snapshot, &task.rma, &task.serial, |r| {
                r.shipped.status.is_yes()
            }),
            task: task.clone(),
        })
        .collect();

    let planned: Vec<RecordIdentity> = report.shipping_identities().collect();
    let adhoc_shipped_today = snapshot
        .records
        .iter()
        .filter(|r| r.shipped.status.is_yes() && r.shipped.date() == Some(report.date))
        .filter(|r| {
            let identity = r.identity();
            !planned.iter().any(|p| p.matches_identity(&identity))
        })
        .filter_map(|r| {
            Some(AdhocShipment {
                rma: r.rma.clone(),
                serial: r.serial.clone(),
                spc_code: r.spc_code.clone(),
                shipped_at: r.shipped.time?,
            })
        })
        .collect();

    EodSummary {
        date: report.date,
        estimate_tasks,
        reminder_tasks,
        shipping_tasks,
        adhoc_shipped_today,
    }
}
