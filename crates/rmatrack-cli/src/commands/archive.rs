use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;
use comfy_table::{presets::UTF8_FULL, Table};

use rmatrack_core::config::TrackerConfig;
use rmatrack_core::model::Snapshot;
use rmatrack_core::reconcile::{catch_up_archive, reconcile_eod, EodSummary, TaskResult};
use rmatrack_core::store::ArchiveStore;
use rmatrack_core::CoreError;
use rmatrack_repository::PgStore;

use super::print_report_summary_row;

pub async fn handle_catch_up(
    store: &PgStore,
    snapshot: &Snapshot,
    config: &TrackerConfig,
    today: NaiveDate,
) -> Result<()> {
    match catch_up_archive(snapshot, store, today, config.max_catch_up_days).await {
        Ok(outcome) => {
            for report in &outcome.saved {
                print_report_summary_row(report);
            }
            println!(
                "Archive is current through {today}: {} day(s) written, {} already present.",
                outcome.saved.len(),
                outcome.skipped_days,
            );
            Ok(())
        }
        Err(CoreError::CatchUpOverflow { pending_days }) => Err(anyhow!(
            "archive is {pending_days} day(s) behind, over the {}-day catch-up cap; \
             days walked so far were saved, rerun to continue",
            config.max_catch_up_days,
        )),
        Err(e) => Err(e.into()),
    }
}

fn print_task_table<T>(title: &str, tasks: &[TaskResult<T>], describe: impl Fn(&T) -> Vec<String>) {
    if tasks.is_empty() {
        return;
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["RMA", "S/N", "Outcome"]);
    for result in tasks {
        let mut row = describe(&result.task);
        row.push(result.outcome.as_str().to_string());
        table.add_row(row);
    }
    println!("\n{title}:\n{table}");
}

pub fn print_eod_summary(summary: &EodSummary) {
    println!("\nEnd-of-day summary for {}", summary.date);

    print_task_table("Shipping tasks", &summary.shipping_tasks, |t| {
        vec![t.rma.clone(), t.serial.clone()]
    });
    print_task_table("Estimate tasks", &summary.estimate_tasks, |t| {
        vec![t.rma.clone(), t.serial.clone()]
    });
    print_task_table("Reminder tasks", &summary.reminder_tasks, |t| {
        vec![t.rma.clone(), t.serial.clone()]
    });

    if summary.adhoc_shipped_today.is_empty() {
        println!("\nNo ad-hoc shipments.");
    } else {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec!["RMA", "S/N", "SPC Code", "Shipped At"]);
        for shipment in &summary.adhoc_shipped_today {
            table.add_row(vec![
                shipment.rma.clone(),
                shipment.serial.clone(),
                shipment.spc_code.clone(),
                shipment.shipped_at.to_string(),
            ]);
        }
        println!("\nAd-hoc shipments:\n{table}");
    }
}

pub async fn handle_eod(store: &PgStore, snapshot: &Snapshot, date: NaiveDate) -> Result<()> {
    let Some(report) = store.load_report(date).await? else {
        bail!("no archived report for {date}; run catch-up first");
    };

    let summary = reconcile_eod(&report, snapshot);
    print_eod_summary(&summary);

    if store.save_eod_if_absent(&summary).await? {
        println!("\nArchived EOD summary for {date}.");
    } else {
        println!("\nAn EOD summary for {date} was already archived; left untouched.");
    }
    Ok(())
}
