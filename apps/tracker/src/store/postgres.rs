use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};
use tracing::info;

use crate::models::{Record, RecordId};
use crate::store::{require_status, RecordStore, StoreError};

const COLUMNS: &str =
    r#"id, company, "job-title", date, status, color, greeting, body, salutation"#;

#[derive(Debug, Clone, FromRow)]
pub struct ApplicationRow {
    pub id: i32,
    pub company: String,
    #[sqlx(rename = "job-title")]
    pub job_title: String,
    pub date: NaiveDate,
    pub status: String,
    pub color: Option<String>,
    pub greeting: Option<String>,
    pub body: Option<String>,
    pub salutation: Option<String>,
}

impl From<ApplicationRow> for Record {
    fn from(row: ApplicationRow) -> Self {
        Record {
            id: RecordId::from(row.id),
            company: row.company,
            job_title: row.job_title,
            date: row.date,
            status: row.status,
            color: row.color,
            greeting: row.greeting,
            body: row.body,
            salutation: row.salutation,
        }
    }
}

/// Row-oriented backend: one table named after the collection.
pub struct PostgresStore {
    pool: PgPool,
    select_all: String,
    select_one: String,
    update_status: String,
    create_table: String,
}

impl PostgresStore {
    /// `table` must already be validated as a plain identifier.
    pub fn new(pool: PgPool, table: &str) -> Self {
        Self {
            pool,
            select_all: format!("SELECT {COLUMNS} FROM {table} ORDER BY date DESC"),
            select_one: format!("SELECT {COLUMNS} FROM {table} WHERE id = $1"),
            update_status: format!(
                "UPDATE {table} SET status = $1 WHERE id = $2 RETURNING {COLUMNS}"
            ),
            create_table: format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id          SERIAL PRIMARY KEY,
                    company     TEXT NOT NULL,
                    "job-title" TEXT NOT NULL,
                    date        DATE NOT NULL,
                    status      TEXT NOT NULL DEFAULT 'In Progress',
                    color       TEXT,
                    greeting    TEXT,
                    body        TEXT,
                    salutation  TEXT
                )
                "#
            ),
        }
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(&self.create_table).execute(&self.pool).await?;
        info!("Ensured applications table exists");
        Ok(())
    }
}

/// Ids that are not integers cannot match a SERIAL key.
fn row_key(id: &RecordId) -> Result<i32, StoreError> {
    id.as_str()
        .parse::<i32>()
        .map_err(|_| StoreError::NotFound(id.clone()))
}

#[async_trait]
impl RecordStore for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn list(&self) -> Result<Vec<Record>, StoreError> {
        let rows = sqlx::query_as::<_, ApplicationRow>(&self.select_all)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Record::from).collect())
    }

    async fn get_by_id(&self, id: &RecordId) -> Result<Record, StoreError> {
        let key = row_key(id)?;
        sqlx::query_as::<_, ApplicationRow>(&self.select_one)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?
            .map(Record::from)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn update_status(&self, id: &RecordId, status: &str) -> Result<Record, StoreError> {
        require_status(status)?;
        let key = row_key(id)?;
        sqlx::query_as::<_, ApplicationRow>(&self.update_status)
            .bind(status)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?
            .map(Record::from)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("PostgreSQL pool closed");
    }
}
