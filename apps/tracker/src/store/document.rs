//! Document backend on Redis.
//!
//! Layout, per collection:
//! - `<collection>:<id>`: hash with `company`, `job-title`, `date`, `status`
//!   and the optional letter fields.
//! - `<collection>:by_date`: sorted set of ids scored by the day number of
//!   `date` (days from 0001-01-01), maintained by whoever writes documents.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, Script};
use tokio::sync::{OnceCell, Semaphore};

use crate::models::record::{parse_calendar_date, sort_newest_first};
use crate::models::{Record, RecordId};
use crate::store::{require_status, RecordStore, StoreError};

/// Existence check, merge and read-back in one server-side step.
const UPDATE_STATUS_LUA: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
    return false
end
redis.call('HSET', KEYS[1], 'status', ARGV[1])
return redis.call('HGETALL', KEYS[1])
"#;

// One quick retry per (re)connect.
const RETRY_EXPONENT_BASE: u64 = 2;
const RETRY_FACTOR_MS: u64 = 100;
const CONNECT_RETRIES: usize = 1;

pub struct DocumentStore {
    client: Client,
    conn: OnceCell<ConnectionManager>,
    permits: Semaphore,
    collection: String,
    update_script: Script,
}

impl DocumentStore {
    /// Validates the URL only; the connection is made on first use.
    pub fn open(
        redis_url: &str,
        collection: &str,
        max_concurrent: u32,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            client: Client::open(redis_url)?,
            conn: OnceCell::new(),
            permits: Semaphore::new(max_concurrent as usize),
            collection: collection.to_string(),
            update_script: Script::new(UPDATE_STATUS_LUA),
        })
    }

    fn doc_key(&self, id: &str) -> String {
        format!("{}:{}", self.collection, id)
    }

    fn index_key(&self) -> String {
        format!("{}:by_date", self.collection)
    }

    /// The manager re-establishes a dropped connection by itself; only the
    /// call that hit the broken socket fails. A failed first connect leaves
    /// the cell empty so the next call tries again.
    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let conn = self
            .conn
            .get_or_try_init(|| {
                ConnectionManager::new_with_backoff(
                    self.client.clone(),
                    RETRY_EXPONENT_BASE,
                    RETRY_FACTOR_MS,
                    CONNECT_RETRIES,
                )
            })
            .await?;
        Ok(conn.clone())
    }
}

/// Builds a `Record` from a document hash. A hash missing required fields
/// or holding an unreadable date is reported as a store failure.
fn record_from_fields(
    id: &RecordId,
    mut fields: HashMap<String, String>,
) -> Result<Record, StoreError> {
    let mut required = |name: &str| {
        fields.remove(name).ok_or_else(|| {
            StoreError::Unavailable(format!("document {id} is missing field '{name}'"))
        })
    };
    let company = required("company")?;
    let job_title = required("job-title")?;
    let raw_date = required("date")?;
    let status = required("status")?;

    let date = parse_calendar_date(&raw_date).ok_or_else(|| {
        StoreError::Unavailable(format!("document {id} has unreadable date '{raw_date}'"))
    })?;

    Ok(Record {
        id: id.clone(),
        company,
        job_title,
        date,
        status,
        color: fields.remove("color"),
        greeting: fields.remove("greeting"),
        body: fields.remove("body"),
        salutation: fields.remove("salutation"),
    })
}

/// `HGETALL` replies from scripts arrive as a flat `[field, value, ...]` list.
fn pairs_to_fields(flat: Vec<String>) -> HashMap<String, String> {
    let mut fields = HashMap::with_capacity(flat.len() / 2);
    let mut iter = flat.into_iter();
    while let (Some(field), Some(value)) = (iter.next(), iter.next()) {
        fields.insert(field, value);
    }
    fields
}

#[async_trait]
impl RecordStore for DocumentStore {
    fn backend(&self) -> &'static str {
        "document"
    }

    async fn list(&self) -> Result<Vec<Record>, StoreError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let mut conn = self.connection().await?;

        let ids: Vec<String> = redis::cmd("ZREVRANGE")
            .arg(self.index_key())
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for id in &ids {
            pipe.cmd("HGETALL").arg(self.doc_key(id));
        }
        let docs: Vec<HashMap<String, String>> = pipe.query_async(&mut conn).await?;

        let mut records = Vec::with_capacity(ids.len());
        for (id, fields) in ids.into_iter().zip(docs) {
            // Index entry left behind by a removed document.
            if fields.is_empty() {
                tracing::warn!(id = %id, "Skipping index entry without a document");
                continue;
            }
            records.push(record_from_fields(&RecordId::new(id), fields)?);
        }
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn get_by_id(&self, id: &RecordId) -> Result<Record, StoreError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let mut conn = self.connection().await?;

        let fields: HashMap<String, String> = redis::cmd("HGETALL")
            .arg(self.doc_key(id.as_str()))
            .query_async(&mut conn)
            .await?;
        if fields.is_empty() {
            return Err(StoreError::NotFound(id.clone()));
        }
        record_from_fields(id, fields)
    }

    async fn update_status(&self, id: &RecordId, status: &str) -> Result<Record, StoreError> {
        require_status(status)?;
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let mut conn = self.connection().await?;

        let reply: Option<Vec<String>> = self
            .update_script
            .key(self.doc_key(id.as_str()))
            .arg(status)
            .invoke_async(&mut conn)
            .await?;
        match reply {
            Some(flat) => record_from_fields(id, pairs_to_fields(flat)),
            None => Err(StoreError::NotFound(id.clone())),
        }
    }

    async fn close(&self) {
        self.permits.close();
        tracing::info!("Document store closed");
    }
}
