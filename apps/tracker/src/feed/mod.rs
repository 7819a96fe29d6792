//! Read paths used by the views.
//!
//! A live feed (in-process store or remote API) is tried first; on any
//! failure the static fallback dataset is consulted. Results carry a
//! provenance tag so the views decide about write controls explicitly.

pub mod fallback;
pub mod http;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{Record, RecordId};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("malformed payload: {0}")]
    Decode(String),

    #[error("record {0} not found")]
    NotFound(RecordId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Where a view's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Live,
    Fallback,
}

impl Provenance {
    pub fn is_live(self) -> bool {
        self == Provenance::Live
    }
}

#[derive(Debug, Clone)]
pub struct Sourced<T> {
    pub provenance: Provenance,
    pub value: T,
}

/// Read-only access to a set of records.
#[async_trait]
pub trait RecordFeed: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_all(&self) -> Result<Vec<Record>, FeedError>;

    async fn fetch_one(&self, id: &RecordId) -> Result<Record, FeedError>;
}

/// A feed backed by the live store, which can also accept status changes.
#[async_trait]
pub trait LiveFeed: RecordFeed {
    async fn update_status(&self, id: &RecordId, status: &str) -> Result<Record, FeedError>;
}

/// Live feed first, fallback second. No retries.
#[derive(Clone)]
pub struct TieredSource {
    live: Arc<dyn LiveFeed>,
    fallback: Arc<dyn RecordFeed>,
}

impl TieredSource {
    pub fn new(live: Arc<dyn LiveFeed>, fallback: Arc<dyn RecordFeed>) -> Self {
        Self { live, fallback }
    }

    pub fn live(&self) -> &dyn LiveFeed {
        self.live.as_ref()
    }

    pub async fn fetch_all(&self) -> Result<Sourced<Vec<Record>>, FeedError> {
        match self.live.fetch_all().await {
            Ok(value) => Ok(Sourced {
                provenance: Provenance::Live,
                value,
            }),
            Err(e) => {
                warn!(feed = self.live.name(), error = %e, "Live fetch failed, loading fallback data");
                let value = self.fallback.fetch_all().await?;
                info!(records = value.len(), "Loaded records from fallback data");
                Ok(Sourced {
                    provenance: Provenance::Fallback,
                    value,
                })
            }
        }
    }

    pub async fn fetch_one(&self, id: &RecordId) -> Result<Sourced<Record>, FeedError> {
        match self.live.fetch_one(id).await {
            Ok(value) => Ok(Sourced {
                provenance: Provenance::Live,
                value,
            }),
            Err(e) => {
                warn!(feed = self.live.name(), %id, error = %e, "Live fetch failed, loading fallback data");
                let value = self.fallback.fetch_one(id).await?;
                Ok(Sourced {
                    provenance: Provenance::Fallback,
                    value,
                })
            }
        }
    }
}
