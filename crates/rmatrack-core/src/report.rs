//! Single-day report snapshots. `generate_daily_report` is a pure function
//! of (snapshot, date); the archive layer persists its output verbatim.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::model::{RecordIdentity, Snapshot};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingTask {
    pub rma: String,
    pub serial: String,
    pub spc_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateTask {
    pub rma: String,
    pub serial: String,
    pub spc_code: String,
    /// Date the estimate was completed (the day before the report date).
    pub completed_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderTask {
    pub rma: String,
    pub serial: String,
    pub spc_code: String,
    pub sent_to_email: String,
    pub sent_on: NaiveDate,
}

/// A date-keyed snapshot of the three task lists. Once archived for its
/// date it is immutable; regenerating never produces a second copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub needs_shipping: Vec<ShippingTask>,
    pub needs_estimate_creation: Vec<EstimateTask>,
    pub needs_reminder: Vec<ReminderTask>,
}

impl DailyReport {
    pub fn is_empty(&self) -> bool {
        self.needs_shipping.is_empty()
            && self.needs_estimate_creation.is_empty()
            && self.needs_reminder.is_empty()
    }

    /// Normalized identities of the shipping tasks, for the EOD ad-hoc diff.
    pub fn shipping_identities(&self) -> impl Iterator<Item = RecordIdentity> + '_ {
        self.needs_shipping
            .iter()
            .map(|task| RecordIdentity::new(&task.rma, &task.serial))
    }
}

/// Computes one calendar date's task lists. Three independent filters over
/// the snapshot; the date comparisons use the date part of the relevant
/// stage timestamp, unlike the overdue detectors' elapsed-day math.
pub fn generate_daily_report(snapshot: &Snapshot, date: NaiveDate) -> DailyReport {
    let mut report = DailyReport {
        date,
        needs_shipping: Vec::new(),
        needs_estimate_creation: Vec::new(),
        needs_reminder: Vec::new(),
    };

    for record in &snapshot.records {
        if record.estimate_complete.status.is_yes()
            && record.estimate_approved.status.is_yes()
            && record.qa_approved.status.is_yes()
            && record.not_shipped()
            && record.qa_approved.date() == Some(date)
        {
            report.needs_shipping.push(ShippingTask {
                rma: record.rma.clone(),
                serial: record.serial.clone(),
                spc_code: record.spc_code.clone(),
            });
        }
    }

    let completed_on = date - Duration::days(1);
    for record in &snapshot.records {
        if record.estimate_complete.status.is_yes()
            && !record.has_sent_email()
            && record.estimate_complete.date() == Some(completed_on)
        {
            report.needs_estimate_creation.push(EstimateTask {
                rma: record.rma.clone(),
                serial: record.serial.clone(),
                spc_code: record.spc_code.clone(),
                completed_on,
            });
        }
    }

    let sent_on = date - Duration::days(2);
    for record in &snapshot.records {
        if record.has_sent_email()
            && !record.reminder_completed.status.is_yes()
            && !record.estimate_approved.status.is_yes()
            && record.estimate_sent.date() == Some(sent_on)
        {
            report.needs_reminder.push(ReminderTask {
                rma: record.rma.clone(),
                serial: record.serial.clone(),
                spc_code: record.spc_code.clone(),
                sent_to_email: record.sent_to_email.clone(),
                sent_on,
            });
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;
    use crate::model::{ServiceRecord, Stage, StageStatus};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn at(d: u32, hour: u32) -> NaiveDateTime {
        date(d).and_hms_opt(hour, 0, 0).unwrap()
    }

    fn fixture() -> Snapshot {
        // Ready to ship, QA approved on the 10th.
        let mut ship_me = ServiceRecord::new("5001", "SN001");
        ship_me.estimate_complete = Stage::done_at(at(1, 9));
        ship_me.estimate_approved = Stage::done_at(at(5, 9));
        ship_me.qa_approved = Stage::done_at(at(10, 16));

        // Same shape but already shipped.
        let mut gone = ship_me.clone();
        gone.rma = "5002".to_string();
        gone.shipped = Stage::done_at(at(10, 17));

        // Estimate completed on the 9th, never sent.
        let mut needs_estimate = ServiceRecord::new("5003", "SN003");
        needs_estimate.estimate_complete = Stage::done_at(at(9, 11));

        // Estimate sent on the 8th, no approval, no reminder.
        let mut needs_reminder = ServiceRecord::new("5004", "SN004");
        needs_reminder.sent_to_email = "customer@example.com".to_string();
        needs_reminder.estimate_sent = Stage::done_at(at(8, 10));

        // Sent on the 8th but already approved: no reminder needed.
        let mut approved = needs_reminder.clone();
        approved.rma = "5005".to_string();
        approved.estimate_approved.status = StageStatus::Yes;

        Snapshot::new(
            vec![ship_me, gone, needs_estimate, needs_reminder, approved],
            at(10, 18),
        )
    }

    #[test]
    fn each_list_filters_on_its_stage_date() {
        let report = generate_daily_report(&fixture(), date(10));

        assert_eq!(report.needs_shipping.len(), 1);
        assert_eq!(report.needs_shipping[0].rma, "5001");

        assert_eq!(report.needs_estimate_creation.len(), 1);
        assert_eq!(report.needs_estimate_creation[0].rma, "5003");
        assert_eq!(report.needs_estimate_creation[0].completed_on, date(9));

        assert_eq!(report.needs_reminder.len(), 1);
        assert_eq!(report.needs_reminder[0].rma, "5004");
        assert_eq!(report.needs_reminder[0].sent_on, date(8));
        assert_eq!(report.needs_reminder[0].sent_to_email, "customer@example.com");
    }

    #[test]
    fn other_dates_yield_empty_lists() {
        let report = generate_daily_report(&fixture(), date(20));
        assert!(report.is_empty());
    }

    #[test]
    fn generation_is_deterministic() {
        let snapshot = fixture();
        let first = generate_daily_report(&snapshot, date(10));
        let second = generate_daily_report(&snapshot, date(10));
        assert_eq!(first, second);
    }

    #[test]
    fn empty_snapshot_yields_empty_report() {
        let snapshot = Snapshot::new(Vec::new(), at(10, 18));
        assert!(generate_daily_report(&snapshot, date(10)).is_empty());
    }
}
