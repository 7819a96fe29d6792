use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::feed::{FeedError, RecordFeed};
use crate::models::{Record, RecordId};

enum Source {
    File(PathBuf),
    Inline(Vec<Record>),
}

/// The bundled read-only snapshot. The file is re-read on every call, so an
/// edited snapshot is picked up without a restart.
pub struct FallbackDataset {
    source: Source,
}

impl FallbackDataset {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            source: Source::File(path.as_ref().to_path_buf()),
        }
    }

    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            source: Source::Inline(records),
        }
    }

    pub async fn load(&self) -> Result<Vec<Record>, FeedError> {
        match &self.source {
            Source::Inline(records) => Ok(records.clone()),
            Source::File(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|e| {
                    FeedError::Transport(format!("reading {}: {e}", path.display()))
                })?;
                serde_json::from_slice(&bytes).map_err(|e| {
                    FeedError::Decode(format!("{}: {e}", path.display()))
                })
            }
        }
    }
}

#[async_trait]
impl RecordFeed for FallbackDataset {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn fetch_all(&self) -> Result<Vec<Record>, FeedError> {
        self.load().await
    }

    /// Matches on the normalized string form of the id.
    async fn fetch_one(&self, id: &RecordId) -> Result<Record, FeedError> {
        self.load()
            .await?
            .into_iter()
            .find(|r| &r.id == id)
            .ok_or_else(|| FeedError::NotFound(id.clone()))
    }
}
