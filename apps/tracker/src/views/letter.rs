use tracing::error;

use crate::feed::{Provenance, TieredSource};
use crate::models::{Record, RecordId};

/// Shown in place of the letter when no record can be found anywhere.
pub const LETTER_UNAVAILABLE: &str = "Error: Application data could not be loaded.";

#[derive(Debug, Clone)]
pub enum LetterView {
    Loaded {
        record: Record,
        provenance: Provenance,
    },
    Missing,
}

impl LetterView {
    /// Same two-tier lookup as the list. A request without an id renders
    /// the error message too.
    pub async fn load(source: &TieredSource, id: Option<&RecordId>) -> Self {
        let Some(id) = id else {
            return LetterView::Missing;
        };
        match source.fetch_one(id).await {
            Ok(sourced) => LetterView::Loaded {
                record: sourced.value,
                provenance: sourced.provenance,
            },
            Err(e) => {
                error!(%id, error = %e, "No matching letter data in live store or fallback");
                LetterView::Missing
            }
        }
    }

    pub fn record(&self) -> Option<&Record> {
        match self {
            LetterView::Loaded { record, .. } => Some(record),
            LetterView::Missing => None,
        }
    }
}
