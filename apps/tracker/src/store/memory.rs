use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::record::sort_newest_first;
use crate::models::{Record, RecordId};
use crate::store::{require_status, RecordStore, StoreError};

/// In-process store for local development and tests.
pub struct MemoryStore {
    records: RwLock<Vec<Record>>,
}

impl MemoryStore {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn list(&self) -> Result<Vec<Record>, StoreError> {
        let mut records = self.records.read().await.clone();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn get_by_id(&self, id: &RecordId) -> Result<Record, StoreError> {
        self.records
            .read()
            .await
            .iter()
            .find(|r| &r.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn update_status(&self, id: &RecordId, status: &str) -> Result<Record, StoreError> {
        require_status(status)?;
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        record.status = status.to_string();
        Ok(record.clone())
    }
}
