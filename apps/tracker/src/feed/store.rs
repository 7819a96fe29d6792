use std::sync::Arc;

use async_trait::async_trait;

use crate::feed::{FeedError, LiveFeed, RecordFeed};
use crate::models::{Record, RecordId};
use crate::store::{RecordStore, StoreError};

/// Live feed that reads the store in-process.
pub struct StoreFeed {
    store: Arc<dyn RecordStore>,
}

impl StoreFeed {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

fn into_feed_error(e: StoreError) -> FeedError {
    match e {
        StoreError::NotFound(id) => FeedError::NotFound(id),
        other => FeedError::Store(other),
    }
}

#[async_trait]
impl RecordFeed for StoreFeed {
    fn name(&self) -> &'static str {
        "store"
    }

    async fn fetch_all(&self) -> Result<Vec<Record>, FeedError> {
        self.store.list().await.map_err(into_feed_error)
    }

    async fn fetch_one(&self, id: &RecordId) -> Result<Record, FeedError> {
        self.store.get_by_id(id).await.map_err(into_feed_error)
    }
}

#[async_trait]
impl LiveFeed for StoreFeed {
    async fn update_status(&self, id: &RecordId, status: &str) -> Result<Record, FeedError> {
        self.store
            .update_status(id, status)
            .await
            .map_err(into_feed_error)
    }
}
