//! Stage mutations, expressed as one batched cell write per operation.
//! Each locates the backing row by identity first; a miss returns
//! Ok(false) and writes nothing.

use chrono::NaiveDateTime;

use crate::error::Result;
use crate::model::{RecordIdentity, ServiceRecord, Snapshot, StageStatus};
use crate::sheet::{columns, TIMESTAMP_FORMAT};
use crate::store::RecordStore;

fn stamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Records that an estimate went out: recipient email plus sent time.
pub async fn mark_estimate_sent(
    store: &dyn RecordStore,
    identity: &RecordIdentity,
    email: &str,
    sent_at: NaiveDateTime,
) -> Result<bool> {
    let updates = vec![
        (columns::ESTIMATE_SENT_TO_EMAIL.to_string(), email.to_string()),
        (columns::ESTIMATE_SENT_TIME.to_string(), stamp(sent_at)),
    ];
    let updated = store.update_cells(identity, &updates).await?;
    if !updated {
        tracing::warn!(%identity, "estimate-sent update skipped: row not found");
    }
    Ok(updated)
}

/// Records a completed customer reminder and how it was delivered.
pub async fn mark_reminder_done(
    store: &dyn RecordStore,
    identity: &RecordIdentity,
    contact_method: &str,
    at: NaiveDateTime,
) -> Result<bool> {
    let updates = vec![
        (
            columns::REMINDER_COMPLETED.to_string(),
            StageStatus::Yes.as_str().to_string(),
        ),
        (columns::REMINDER_COMPLETED_TIME.to_string(), stamp(at)),
        (
            columns::REMINDER_CONTACT_METHOD.to_string(),
            contact_method.to_string(),
        ),
    ];
    let updated = store.update_cells(identity, &updates).await?;
    if !updated {
        tracing::warn!(%identity, "reminder update skipped: row not found");
    }
    Ok(updated)
}

/// Marks a unit shipped. The record is at rest afterwards.
pub async fn mark_shipped(
    store: &dyn RecordStore,
    identity: &RecordIdentity,
    shipped_at: NaiveDateTime,
) -> Result<bool> {
    let updates = vec![
        (
            columns::SHIPPED.to_string(),
            StageStatus::Yes.as_str().to_string(),
        ),
        (columns::SHIPPED_TIME.to_string(), stamp(shipped_at)),
    ];
    let updated = store.update_cells(identity, &updates).await?;
    if !updated {
        tracing::warn!(%identity, "shipped update skipped: row not found");
    }
    Ok(updated)
}

/// Case-insensitive substring search on RMA or serial.
pub fn search_records<'a>(snapshot: &'a Snapshot, query: &str) -> Vec<&'a ServiceRecord> {
    let needle = query.trim().to_ascii_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    snapshot
        .records
        .iter()
        .filter(|r| {
            r.rma.to_ascii_lowercase().contains(&needle)
                || r.serial.to_ascii_lowercase().contains(&needle)
        })
        .collect()
}
