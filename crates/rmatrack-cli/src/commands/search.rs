use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Table};

use rmatrack_core::config::TrackerConfig;
use rmatrack_core::links::record_link;
use rmatrack_core::model::Snapshot;
use rmatrack_core::update::search_records;

pub fn handle_search(snapshot: &Snapshot, query: &str, config: &TrackerConfig) -> Result<()> {
    let matches = search_records(snapshot, query);
    if matches.is_empty() {
        println!("No records match {query:?}.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "RMA",
        "S/N",
        "SPC Code",
        "Description",
        "Shipped",
        "Link",
    ]);
    for record in &matches {
        table.add_row(vec![
            record.rma.clone(),
            record.serial.clone(),
            record.spc_code.clone(),
            record.description.clone(),
            record.shipped.status.to_string(),
            record_link(&config.deep_links, &record.rma).unwrap_or_else(|| "-".to_string()),
        ]);
    }
    println!("{table}");
    Ok(())
}
