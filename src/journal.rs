//! SQLite journal of scan events, used to restore a shift after a restart.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::FromRow;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

use crate::barcode::ScanEvent;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Shift {
    pub id: String,                // UUID string
    pub port_name: Option<String>, // port the shift started on, if any
    pub started_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Shift {
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }
}

#[derive(Debug, FromRow)]
struct ScanRow {
    product_code: i64,
    weight_grams: Option<f64>,
    pack_date: Option<NaiveDate>,
    observed_at: DateTime<Utc>,
}

impl From<ScanRow> for ScanEvent {
    fn from(row: ScanRow) -> Self {
        Self {
            // Stored from a u64 product code, which always fits in 13 digits.
            product_code: row.product_code as u64,
            weight_grams: row.weight_grams,
            pack_date: row.pack_date,
            observed_at: row.observed_at,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ScanJournal {
    pool: SqlitePool,
}

impl ScanJournal {
    pub async fn new(database_url: &str) -> sqlx::Result<Self> {
        // If this is a file path (sqlite://path/to/file.db) ensure directory exists
        if let Some(rest) = database_url.strip_prefix("sqlite://") {
            if !rest.starts_with(':') {
                if let Some(parent) = Path::new(rest).parent() {
                    if !parent.as_os_str().is_empty() {
                        let _ = std::fs::create_dir_all(parent);
                    }
                }
            }
        }
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        Self::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    async fn run_migrations(pool: &SqlitePool) -> sqlx::Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS shifts (
            id TEXT PRIMARY KEY,
            port_name TEXT,
            started_at TEXT NOT NULL,
            closed_at TEXT
        )"#,
        )
        .execute(pool)
        .await?;
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS scans (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            shift_id TEXT NOT NULL,
            product_code INTEGER NOT NULL,
            weight_grams REAL,
            pack_date TEXT,
            observed_at TEXT NOT NULL,
            FOREIGN KEY(shift_id) REFERENCES shifts(id)
        )"#,
        )
        .execute(pool)
        .await?;
        sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_scans_shift ON scans(shift_id)"#)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn open_shift(&self, port_name: Option<&str>) -> sqlx::Result<Shift> {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO shifts (id, port_name, started_at, closed_at) VALUES (?1, ?2, ?3, NULL)")
            .bind(&id)
            .bind(port_name)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(Shift {
            id,
            port_name: port_name.map(|s| s.to_string()),
            started_at: now,
            closed_at: None,
        })
    }

    pub async fn get_shift(&self, id: &str) -> sqlx::Result<Option<Shift>> {
        sqlx::query_as::<_, Shift>("SELECT * FROM shifts WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// The most recently started shift that was never closed.
    pub async fn latest_open_shift(&self) -> sqlx::Result<Option<Shift>> {
        sqlx::query_as::<_, Shift>(
            "SELECT * FROM shifts WHERE closed_at IS NULL ORDER BY started_at DESC, rowid DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
    }

    /// Append one event to the shift; returns its row id.
    pub async fn record(&self, shift_id: &str, event: &ScanEvent) -> sqlx::Result<i64> {
        let result = sqlx::query(
            "INSERT INTO scans (shift_id, product_code, weight_grams, pack_date, observed_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(shift_id)
        .bind(event.product_code as i64)
        .bind(event.weight_grams)
        .bind(event.pack_date)
        .bind(event.observed_at)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Every event of the shift in recording order.
    pub async fn load(&self, shift_id: &str) -> sqlx::Result<Vec<ScanEvent>> {
        let rows = sqlx::query_as::<_, ScanRow>(
            "SELECT product_code, weight_grams, pack_date, observed_at FROM scans WHERE shift_id = ?1 ORDER BY id ASC",
        )
        .bind(shift_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ScanEvent::from).collect())
    }

    pub async fn close_shift(&self, shift_id: &str) -> sqlx::Result<()> {
        sqlx::query("UPDATE shifts SET closed_at = ?1 WHERE id = ?2")
            .bind(Utc::now())
            .bind(shift_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
