//! Overdue detection: three independent pure predicates over a snapshot.
//!
//! Day counting is the integer day count of the elapsed wall-clock delta,
//! not calendar-day boundaries: a record crosses a threshold a fixed number
//! of 24h periods after the stage timestamp, not at midnight. A record with
//! a null stage timestamp never qualifies.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::links::{record_link, DeepLinkConfig};
use crate::model::{ServiceRecord, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverdueThresholds {
    /// Days allowed between estimate completion and sending it out.
    pub send_days: i64,
    /// Days allowed between sending an estimate and chasing the customer.
    pub reminder_days: i64,
    /// Days allowed between QA approval and shipping.
    pub shipping_days: i64,
}

impl Default for OverdueThresholds {
    fn default() -> Self {
        Self {
            send_days: 3,
            reminder_days: 2,
            shipping_days: 1,
        }
    }
}

/// One overdue row, carrying the record's descriptive fields, how long it
/// has been stuck, and a deep link when the case has an RMA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverdueEntry {
    pub rma: String,
    pub serial: String,
    pub spc_code: String,
    pub part_number: String,
    pub description: String,
    pub sender: String,
    /// Timestamp of the stage the record is stuck at.
    pub stage_time: NaiveDateTime,
    pub days_elapsed: i64,
    pub link: Option<String>,
}

fn entry(
    record: &ServiceRecord,
    stage_time: NaiveDateTime,
    days_elapsed: i64,
    links: &DeepLinkConfig,
) -> OverdueEntry {
    OverdueEntry {
        rma: record.rma.clone(),
        serial: record.serial.clone(),
        spc_code: record.spc_code.clone(),
        part_number: record.part_number.clone(),
        description: record.description.clone(),
        sender: record.sender.clone(),
        stage_time,
        days_elapsed,
        link: record_link(links, &record.rma),
    }
}

fn elapsed_days(now: NaiveDateTime, since: NaiveDateTime) -> i64 {
    (now - since).num_days()
}

/// Estimates completed but never emailed out, stuck longer than the
/// send threshold. Shipped records are excluded.
pub fn overdue_estimates(
    snapshot: &Snapshot,
    now: NaiveDateTime,
    thresholds: &OverdueThresholds,
    links: &DeepLinkConfig,
) -> Vec<OverdueEntry> {
    snapshot
        .records
        .iter()
        .filter(|r| r.estimate_complete.status.is_yes() && r.not_shipped() && !r.has_sent_email())
        .filter_map(|r| {
            let time = r.estimate_complete.time?;
            let days = elapsed_days(now, time);
            (days > thresholds.send_days).then(|| entry(r, time, days, links))
        })
        .collect()
}

/// Estimates sent but neither approved nor chased, past the reminder
/// threshold.
pub fn overdue_reminders(
    snapshot: &Snapshot,
    now: NaiveDateTime,
    thresholds: &OverdueThresholds,
    links: &DeepLinkConfig,
) -> Vec<OverdueEntry> {
    snapshot
        .records
        .iter()
        .filter(|r| {
            r.has_sent_email()
                && !r.reminder_completed.status.is_yes()
                && !r.estimate_approved.status.is_yes()
        })
        .filter_map(|r| {
            let time = r.estimate_sent.time?;
            let days = elapsed_days(now, time);
            (days > thresholds.reminder_days).then(|| entry(r, time, days, links))
        })
        .collect()
}

/// Approved and QA-cleared records still sitting on the shelf past the
/// shipping threshold.
pub fn overdue_shipping(
    snapshot: &Snapshot,
    now: NaiveDateTime,
    thresholds: &OverdueThresholds,
    links: &DeepLinkConfig,
) -> Vec<OverdueEntry> {
    snapshot
        .records
        .iter()
        .filter(|r| {
            r.estimate_approved.status.is_yes() && r.qa_approved.status.is_yes() && r.not_shipped()
        })
        .filter_map(|r| {
            let time = r.qa_approved.time?;
            let days = elapsed_days(now, time);
            (days > thresholds.shipping_days).then(|| entry(r, time, days, links))
        })
        .collect()
}
