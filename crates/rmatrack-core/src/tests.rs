//! End-to-end scenarios wiring the sheet adapter, report generator,
//! archive catch-up, stage updates, and EOD reconciliation together.

use chrono::{NaiveDate, NaiveDateTime};

use crate::links::DeepLinkConfig;
use crate::model::{RecordIdentity, Snapshot};
use crate::overdue::{overdue_estimates, OverdueThresholds};
use crate::reconcile::{catch_up_archive, reconcile_eod, TaskOutcome, DEFAULT_MAX_CATCH_UP_DAYS};
use crate::report::generate_daily_report;
use crate::sheet::{read_sheet_csv, records_from_sheet};
use crate::store::{ArchiveStore, MemoryArchiveStore, MemoryRecordStore, RecordStore};
use crate::update::{mark_estimate_sent, mark_shipped};

const SHEET_CSV: &str = "\
RMA,SPC Code,Part Number,S/N,Description,Estimate Complete,Estimate Complete Time,Estimate Approved,Estimate Approved Time,Estimate Sent To Email,Estimate Sent Time,Reminder Completed,QA Approved,QA Approved Time,Shipped,Shipped Time
5001,SPC-A,PN-1,SN001,Laser head,Yes,2024-06-06 09:00:00,No,,N/A,,No,No,,No,
5002,SPC-B,PN-2,SN002,Console,Yes,2024-06-09 10:00:00,No,,N/A,,No,No,,No,
5003,SPC-C,PN-3,SN003,Probe,Yes,2024-06-01 08:00:00,Yes,2024-06-05 08:00:00,customer@example.com,2024-06-08 11:00:00,No,Yes,2024-06-10 15:00:00,No,
N/A,SPC-D,PN-4,SN004,Footswitch,No,,No,,N/A,,No,No,,Yes,2024-06-10 16:30:00
5005,SPC-E,PN-5,SN005,Handpiece,Yes,2024-06-05 09:00:00,No,,owner@example.com,2024-06-08 09:30:00,No,No,,No,
";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
}

fn now() -> NaiveDateTime {
    today().and_hms_opt(18, 0, 0).unwrap()
}

async fn load_snapshot(store: &MemoryRecordStore) -> Snapshot {
    let sheet = store.load_all().await.unwrap();
    Snapshot::new(records_from_sheet(&sheet), now())
}

#[tokio::test]
async fn full_day_workflow_from_csv_to_eod_summary() {
    let sheet = read_sheet_csv(SHEET_CSV.as_bytes()).unwrap();
    let store = MemoryRecordStore::new(sheet);
    let archive = MemoryArchiveStore::new();

    let snapshot = load_snapshot(&store).await;
    assert_eq!(snapshot.len(), 5);

    // Morning: overdue scan. 5001 has been complete-but-unsent for 4 days.
    let overdue = overdue_estimates(
        &snapshot,
        now(),
        &OverdueThresholds::default(),
        &DeepLinkConfig::default(),
    );
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].rma, "5001");
    assert_eq!(overdue[0].days_elapsed, 4);

    // Catch-up on an empty archive writes today's report only.
    let outcome = catch_up_archive(&snapshot, &archive, today(), DEFAULT_MAX_CATCH_UP_DAYS)
        .await
        .unwrap();
    assert_eq!(outcome.saved.len(), 1);

    let report = archive.load_report(today()).await.unwrap().unwrap();
    // 5003 was QA-approved today; 5002 completed its estimate yesterday;
    // 5005 was sent two days ago and is still unapproved.
    assert_eq!(report.needs_shipping.len(), 1);
    assert_eq!(report.needs_shipping[0].rma, "5003");
    assert_eq!(report.needs_estimate_creation.len(), 1);
    assert_eq!(report.needs_estimate_creation[0].rma, "5002");
    assert_eq!(report.needs_reminder.len(), 1);
    assert_eq!(report.needs_reminder[0].rma, "5005");

    // During the day: 5003 ships, 5002's estimate goes out.
    assert!(mark_shipped(
        &store,
        &RecordIdentity::new("5003", "SN003"),
        today().and_hms_opt(16, 0, 0).unwrap(),
    )
    .await
    .unwrap());
    assert!(mark_estimate_sent(
        &store,
        &RecordIdentity::new("5002", "SN002"),
        "buyer@example.com",
        today().and_hms_opt(16, 30, 0).unwrap(),
    )
    .await
    .unwrap());

    // Evening: reconcile the archived report against fresh live state.
    let live = load_snapshot(&store).await;
    let summary = reconcile_eod(&report, &live);

    assert_eq!(summary.shipping_tasks[0].outcome, TaskOutcome::Completed);
    assert_eq!(summary.estimate_tasks[0].outcome, TaskOutcome::Completed);
    assert_eq!(summary.reminder_tasks[0].outcome, TaskOutcome::Pending);

    // The unassigned-RMA footswitch shipped today without ever being in
    // the needs_shipping list.
    assert_eq!(summary.adhoc_shipped_today.len(), 1);
    assert_eq!(summary.adhoc_shipped_today[0].serial, "SN004");

    // The summary archives once and only once.
    assert!(archive.save_eod_if_absent(&summary).await.unwrap());
    assert!(!archive.save_eod_if_absent(&summary).await.unwrap());
    assert_eq!(archive.load_eod(today()).await.unwrap(), Some(summary));
}

#[tokio::test]
async fn rerunning_catch_up_after_live_updates_changes_nothing_archived() {
    let sheet = read_sheet_csv(SHEET_CSV.as_bytes()).unwrap();
    let store = MemoryRecordStore::new(sheet);
    let archive = MemoryArchiveStore::new();

    let snapshot = load_snapshot(&store).await;
    catch_up_archive(&snapshot, &archive, today(), DEFAULT_MAX_CATCH_UP_DAYS)
        .await
        .unwrap();
    let original = archive.load_report(today()).await.unwrap().unwrap();

    // Live state moves on; the archived day must not.
    mark_shipped(
        &store,
        &RecordIdentity::new("5003", "SN003"),
        now(),
    )
    .await
    .unwrap();

    let fresh = load_snapshot(&store).await;
    let second = catch_up_archive(&fresh, &archive, today(), DEFAULT_MAX_CATCH_UP_DAYS)
        .await
        .unwrap();
    assert!(second.saved.is_empty());
    assert_eq!(second.skipped_days, 1);
    assert_eq!(
        archive.load_report(today()).await.unwrap().unwrap(),
        original
    );
}

#[test]
fn daily_report_survives_json_round_trip() {
    let sheet = read_sheet_csv(SHEET_CSV.as_bytes()).unwrap();
    let snapshot = Snapshot::new(records_from_sheet(&sheet), now());
    let report = generate_daily_report(&snapshot, today());

    let payload = serde_json::to_string(&report).unwrap();
    let restored: crate::report::DailyReport = serde_json::from_str(&payload).unwrap();
    assert_eq!(restored, report);
}
