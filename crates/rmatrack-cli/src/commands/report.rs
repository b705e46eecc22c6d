use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::{presets::UTF8_FULL, Table};

use rmatrack_core::model::Snapshot;
use rmatrack_core::report::{generate_daily_report, DailyReport};

pub fn print_report(report: &DailyReport) {
    println!("\nDaily report for {}", report.date);
    if report.is_empty() {
        println!("  (no tasks)");
        return;
    }

    if !report.needs_shipping.is_empty() {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec!["RMA", "S/N", "SPC Code"]);
        for task in &report.needs_shipping {
            table.add_row(vec![&task.rma, &task.serial, &task.spc_code]);
        }
        println!("\nNeeds shipping:\n{table}");
    }

    if !report.needs_estimate_creation.is_empty() {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec!["RMA", "S/N", "SPC Code", "Completed On"]);
        for task in &report.needs_estimate_creation {
            table.add_row(vec![
                task.rma.clone(),
                task.serial.clone(),
                task.spc_code.clone(),
                task.completed_on.to_string(),
            ]);
        }
        println!("\nNeeds estimate creation:\n{table}");
    }

    if !report.needs_reminder.is_empty() {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec!["RMA", "S/N", "SPC Code", "Sent To", "Sent On"]);
        for task in &report.needs_reminder {
            table.add_row(vec![
                task.rma.clone(),
                task.serial.clone(),
                task.spc_code.clone(),
                task.sent_to_email.clone(),
                task.sent_on.to_string(),
            ]);
        }
        println!("\nNeeds reminder:\n{table}");
    }
}

pub fn handle_report(snapshot: &Snapshot, date: NaiveDate) -> Result<()> {
    let report = generate_daily_report(snapshot, date);
    print_report(&report);
    Ok(())
}
