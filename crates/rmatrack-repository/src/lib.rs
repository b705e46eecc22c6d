//! Postgres-backed implementations of the core's store traits: the live
//! record table and the date-keyed report/EOD archive.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use thiserror::Error;

use rmatrack_core::error::CoreError;
use rmatrack_core::model::{RecordIdentity, ServiceRecord, Stage};
use rmatrack_core::reconcile::EodSummary;
use rmatrack_core::report::DailyReport;
use rmatrack_core::sheet::{columns, RawSheet, FIELDS, TIMESTAMP_FORMAT};
use rmatrack_core::store::{ArchiveStore, RecordStore};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] MigrateError),

    #[error("payload (de)serialization error: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("no such record column '{0}'")]
    UnknownColumn(String),
}

impl From<RepositoryError> for CoreError {
    fn from(err: RepositoryError) -> Self {
        CoreError::Store(err.to_string())
    }
}

/// Logical sheet column -> physical table column, in canonical order.
const COLUMN_MAP: [(&str, &str); 21] = [
    (columns::RMA, "rma"),
    (columns::SPC_CODE, "spc_code"),
    (columns::PART_NUMBER, "part_number"),
    (columns::SERIAL, "serial"),
    (columns::DESCRIPTION, "description"),
    (columns::FAULT_COMMENTS, "fault_comments"),
    (columns::RESOLUTION_COMMENTS, "resolution_comments"),
    (columns::SENDER, "sender"),
    (columns::ESTIMATE_COMPLETE_TIME, "estimate_complete_time"),
    (columns::ESTIMATE_COMPLETE, "estimate_complete"),
    (columns::ESTIMATE_APPROVED, "estimate_approved"),
    (columns::ESTIMATE_APPROVED_TIME, "estimate_approved_time"),
    (columns::ESTIMATE_SENT_TO_EMAIL, "estimate_sent_to_email"),
    (columns::ESTIMATE_SENT_TIME, "estimate_sent_time"),
    (columns::REMINDER_COMPLETED, "reminder_completed"),
    (columns::REMINDER_COMPLETED_TIME, "reminder_completed_time"),
    (columns::REMINDER_CONTACT_METHOD, "reminder_contact_method"),
    (columns::QA_APPROVED, "qa_approved"),
    (columns::QA_APPROVED_TIME, "qa_approved_time"),
    (columns::SHIPPED, "shipped"),
    (columns::SHIPPED_TIME, "shipped_time"),
];

fn physical_column(logical: &str) -> Option<&'static str> {
    COLUMN_MAP
        .iter()
        .find(|(name, _)| *name == logical)
        .map(|(_, column)| *column)
}

fn stage_cells(stage: &Stage) -> (String, String) {
    let time = stage
        .time
        .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default();
    (stage.status.as_str().to_string(), time)
}

/// Raw sheet cells for one record, in canonical column order.
fn sheet_cells(record: &ServiceRecord) -> [String; 21] {
    let (estimate_complete, estimate_complete_time) = stage_cells(&record.estimate_complete);
    let (estimate_approved, estimate_approved_time) = stage_cells(&record.estimate_approved);
    let (_, estimate_sent_time) = stage_cells(&record.estimate_sent);
    let (reminder_completed, reminder_completed_time) = stage_cells(&record.reminder_completed);
    let (qa_approved, qa_approved_time) = stage_cells(&record.qa_approved);
    let (shipped, shipped_time) = stage_cells(&record.shipped);

    [
        record.rma.clone(),
        record.spc_code.clone(),
        record.part_number.clone(),
        record.serial.clone(),
        record.description.clone(),
        record.fault_comments.clone(),
        record.resolution_comments.clone(),
        record.sender.clone(),
        estimate_complete_time,
        estimate_complete,
        estimate_approved,
        estimate_approved_time,
        record.sent_to_email.clone(),
        estimate_sent_time,
        reminder_completed,
        reminder_completed_time,
        record.contact_method.clone(),
        qa_approved,
        qa_approved_time,
        shipped,
        shipped_time,
    ]
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Replaces the whole record table with the given records. Used to
    /// load a spreadsheet export; returns the number of rows written.
    pub async fn import_records(&self, records: &[ServiceRecord]) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("TRUNCATE service_records").execute(&mut *tx).await?;

        let placeholders: Vec<String> = (1..=COLUMN_MAP.len()).map(|i| format!("${i}")).collect();
        let insert = format!(
            "INSERT INTO service_records ({}) VALUES ({})",
            COLUMN_MAP
                .iter()
                .map(|(_, column)| *column)
                .collect::<Vec<_>>()
                .join(", "),
            placeholders.join(", "),
        );

        let mut written = 0u64;
        for record in records {
            let mut query = sqlx::query(&insert);
            for cell in sheet_cells(record) {
                query = query.bind(cell);
            }
            written += query.execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        tracing::info!(rows = written, "imported record table");
        Ok(written)
    }

    async fn find_row_id(&self, identity: &RecordIdentity) -> Result<Option<i64>, RepositoryError> {
        let row = if identity.is_unassigned() {
            sqlx::query(
                r#"
                SELECT id FROM service_records
                WHERE lower(btrim(serial)) = $1
                  AND lower(btrim(rma)) IN ('', 'n/a')
                ORDER BY id
                LIMIT 1
                "#,
            )
            .bind(identity.serial())
            .fetch_optional(&self.pool)
            .await?
        } else {
            sqlx::query(
                r#"
                SELECT id FROM service_records
                WHERE lower(btrim(serial)) = $1
                  AND lower(btrim(rma)) = $2
                ORDER BY id
                LIMIT 1
                "#,
            )
            .bind(identity.serial())
            .bind(identity.rma())
            .fetch_optional(&self.pool)
            .await?
        };

        row.map(|r| r.try_get::<i64, _>("id"))
            .transpose()
            .map_err(RepositoryError::from)
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn load_all(&self) -> rmatrack_core::Result<RawSheet> {
        let select = format!(
            "SELECT {} FROM service_records ORDER BY id",
            COLUMN_MAP
                .iter()
                .map(|(_, column)| *column)
                .collect::<Vec<_>>()
                .join(", "),
        );
        let db_rows = sqlx::query(&select)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CoreError::Store(e.to_string()))?;

        let mut rows = Vec::with_capacity(db_rows.len());
        for db_row in db_rows {
            let mut cells = Vec::with_capacity(COLUMN_MAP.len());
            for (_, column) in COLUMN_MAP {
                let cell: String = db_row
                    .try_get(column)
                    .map_err(|e| CoreError::Store(e.to_string()))?;
                cells.push(cell);
            }
            rows.push(cells);
        }

        Ok(RawSheet {
            headers: FIELDS.iter().map(|f| f.to_string()).collect(),
            rows,
        })
    }

    async fn update_cells(
        &self,
        identity: &RecordIdentity,
        updates: &[(String, String)],
    ) -> rmatrack_core::Result<bool> {
        if updates.is_empty() {
            return Ok(true);
        }

        let Some(id) = self.find_row_id(identity).await.map_err(CoreError::from)? else {
            return Ok(false);
        };

        let mut assignments = Vec::with_capacity(updates.len());
        for (i, (logical, _)) in updates.iter().enumerate() {
            let column = physical_column(logical)
                .ok_or_else(|| RepositoryError::UnknownColumn(logical.clone()))
                .map_err(CoreError::from)?;
            assignments.push(format!("{} = ${}", column, i + 1));
        }
        let update = format!(
            "UPDATE service_records SET {} WHERE id = ${}",
            assignments.join(", "),
            updates.len() + 1,
        );

        let mut query = sqlx::query(&update);
        for (_, value) in updates {
            query = query.bind(value);
        }
        query
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| CoreError::Store(e.to_string()))?;
        Ok(true)
    }
}

#[async_trait]
impl ArchiveStore for PgStore {
    async fn save_if_absent(&self, report: &DailyReport) -> rmatrack_core::Result<bool> {
        let payload = serde_json::to_value(report)?;
        let result = sqlx::query(
            r#"
            INSERT INTO daily_reports (report_date, payload)
            VALUES ($1, $2)
            ON CONFLICT (report_date) DO NOTHING
            "#,
        )
        .bind(report.date)
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(|e| CoreError::Store(e.to_string()))?;
        Ok(result.rows_affected() == 1)
    }

    async fn load_report(&self, date: NaiveDate) -> rmatrack_core::Result<Option<DailyReport>> {
        let row = sqlx::query("SELECT payload FROM daily_reports WHERE report_date = $1")
            .bind(date)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CoreError::Store(e.to_string()))?;

        match row {
            Some(row) => {
                let payload: serde_json::Value = row
                    .try_get("payload")
                    .map_err(|e| CoreError::Store(e.to_string()))?;
                Ok(Some(serde_json::from_value(payload)?))
            }
            None => Ok(None),
        }
    }

    async fn last_archived_date(&self) -> rmatrack_core::Result<Option<NaiveDate>> {
        let row = sqlx::query("SELECT max(report_date) AS last FROM daily_reports")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CoreError::Store(e.to_string()))?;
        row.try_get("last")
            .map_err(|e| CoreError::Store(e.to_string()))
    }

    async fn save_eod_if_absent(&self, summary: &EodSummary) -> rmatrack_core::Result<bool> {
        let payload = serde_json::to_value(summary)?;
        let result = sqlx::query(
            r#"
            INSERT INTO eod_summaries (report_date, payload)
            VALUES ($1, $2)
            ON CONFLICT (report_date) DO NOTHING
            "#,
        )
        .bind(summary.date)
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(|e| CoreError::Store(e.to_string()))?;
        Ok(result.rows_affected() == 1)
    }

    async fn load_eod(&self, date: NaiveDate) -> rmatrack_core::Result<Option<EodSummary>> {
        let row = sqlx::query("SELECT payload FROM eod_summaries WHERE report_date = $1")
            .bind(date)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CoreError::Store(e.to_string()))?;

        match row {
            Some(row) => {
                let payload: serde_json::Value = row
                    .try_get("payload")
                    .map_err(|e| CoreError::Store(e.to_string()))?;
                Ok(Some(serde_json::from_value(payload)?))
            }
            None => Ok(None),
        }
    }
}
