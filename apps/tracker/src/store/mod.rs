//! Record store: one CRUD contract over interchangeable backends.
//!
//! `AppState` holds an `Arc<dyn RecordStore>` chosen once at startup from
//! configuration. Handlers never branch on the backend.

pub mod document;
pub mod memory;
pub mod postgres;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::{Config, StoreBackend};
use crate::feed::fallback::FallbackDataset;
use crate::models::{Record, RecordId};

#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection or query failure. Carries the backend detail for logging.
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    #[error("record {0} not found")]
    NotFound(RecordId),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// The adapter contract. Implementations must return the same normalized
/// `Record` shape. There is no optimistic concurrency: last writer wins.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Short backend tag for logs and the health endpoint.
    fn backend(&self) -> &'static str;

    /// All records, newest `date` first.
    async fn list(&self) -> Result<Vec<Record>, StoreError>;

    async fn get_by_id(&self, id: &RecordId) -> Result<Record, StoreError>;

    /// Persists `status` and returns the record as stored afterwards.
    /// Any non-empty string is accepted; closed-set validation belongs to callers.
    async fn update_status(&self, id: &RecordId, status: &str) -> Result<Record, StoreError>;

    /// Releases backend resources. Called once at shutdown.
    async fn close(&self) {}
}

pub(crate) fn require_status(status: &str) -> Result<(), StoreError> {
    if status.is_empty() {
        return Err(StoreError::InvalidInput("status is required".to_string()));
    }
    Ok(())
}

/// Opens the store selected by configuration.
pub async fn connect(config: &Config) -> Result<Arc<dyn RecordStore>> {
    let store: Arc<dyn RecordStore> = match &config.backend {
        StoreBackend::Postgres(pg) => {
            let pool = crate::db::create_pool(pg, config.pool_max_connections)?;
            let store = postgres::PostgresStore::new(pool, &config.collection);
            if pg.ensure_schema {
                store.ensure_schema().await?;
            }
            Arc::new(store)
        }
        StoreBackend::Document { redis_url } => Arc::new(document::DocumentStore::open(
            redis_url,
            &config.collection,
            config.pool_max_connections,
        )?),
        StoreBackend::Memory => {
            let seed = FallbackDataset::new(&config.fallback_dataset).load().await?;
            info!(records = seed.len(), "Seeded in-memory store from fallback dataset");
            Arc::new(memory::MemoryStore::new(seed))
        }
    };
    info!(backend = store.backend(), collection = %config.collection, "Record store ready");
    Ok(store)
}
