use std::path::Path;

use anyhow::{Context, Result};

use rmatrack_core::sheet::{read_sheet_csv, records_from_sheet};
use rmatrack_repository::PgStore;

/// Replaces the database record table with the contents of a CSV export.
pub async fn handle_import(store: &PgStore, path: &Path) -> Result<()> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let sheet = read_sheet_csv(file)?;
    let records = records_from_sheet(&sheet);

    println!("Importing {} record(s) from {}...", records.len(), path.display());
    let written = store.import_records(&records).await?;
    println!("Imported {written} record(s).");
    Ok(())
}
