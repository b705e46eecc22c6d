use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Table};

use rmatrack_core::config::TrackerConfig;
use rmatrack_core::model::Snapshot;
use rmatrack_core::overdue::{
    overdue_estimates, overdue_reminders, overdue_shipping, OverdueEntry,
};

fn print_overdue_table(title: &str, entries: &[OverdueEntry]) {
    println!("\n{title}");
    if entries.is_empty() {
        println!("  (nothing overdue)");
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "RMA",
        "S/N",
        "SPC Code",
        "Part Number",
        "Description",
        "Sender",
        "Stage Time",
        "Days",
        "Link",
    ]);
    for entry in entries {
        table.add_row(vec![
            entry.rma.clone(),
            entry.serial.clone(),
            entry.spc_code.clone(),
            entry.part_number.clone(),
            entry.description.clone(),
            entry.sender.clone(),
            entry.stage_time.to_string(),
            entry.days_elapsed.to_string(),
            entry.link.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    println!("{table}");
}

pub fn handle_overdue(snapshot: &Snapshot, config: &TrackerConfig) -> Result<()> {
    let now = snapshot.fetched_at;
    let thresholds = &config.thresholds;
    let links = &config.deep_links;

    print_overdue_table(
        &format!("Estimates not sent (>{} days)", thresholds.send_days),
        &overdue_estimates(snapshot, now, thresholds, links),
    );
    print_overdue_table(
        &format!("Reminders due (>{} days since sending)", thresholds.reminder_days),
        &overdue_reminders(snapshot, now, thresholds, links),
    );
    print_overdue_table(
        &format!("Shipments overdue (>{} days since QA)", thresholds.shipping_days),
        &overdue_shipping(snapshot, now, thresholds, links),
    );
    Ok(())
}
