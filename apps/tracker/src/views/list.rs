use tracing::{error, info, warn};

use crate::feed::{LiveFeed, Provenance, Sourced, TieredSource};
use crate::models::record::{sort_newest_first, StatusValidation};
use crate::models::{ApplicationStatus, Record, RecordId};

/// Per-row write state. The record inside a row always holds the last
/// status the backend confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowSync {
    Confirmed,
    Pending { requested: String },
    Failed { requested: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusOption {
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone)]
pub struct ListRow {
    pub record: Record,
    pub editable: bool,
    pub sync: RowSync,
}

impl ListRow {
    fn new(record: Record, editable: bool) -> Self {
        Self {
            record,
            editable,
            sync: RowSync::Confirmed,
        }
    }

    /// While a change is in flight the requested value is shown; otherwise
    /// (including after a failure) the confirmed one.
    pub fn displayed_status(&self) -> &str {
        match &self.sync {
            RowSync::Pending { requested } => requested,
            RowSync::Confirmed | RowSync::Failed { .. } => &self.record.status,
        }
    }

    /// The closed set, plus the current value when the store holds
    /// something outside it.
    pub fn status_options(&self) -> Vec<StatusOption> {
        let current = self.displayed_status();
        let mut options: Vec<StatusOption> = ApplicationStatus::ALL
            .iter()
            .map(|s| StatusOption {
                label: s.label().to_string(),
                selected: s.label() == current,
            })
            .collect();
        if !options.iter().any(|o| o.selected) {
            options.push(StatusOption {
                label: current.to_string(),
                selected: true,
            });
        }
        options
    }

    pub fn sync_state(&self) -> &'static str {
        match self.sync {
            RowSync::Confirmed => "confirmed",
            RowSync::Pending { .. } => "pending",
            RowSync::Failed { .. } => "failed",
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match &self.sync {
            RowSync::Failed { reason, .. } => Some(reason),
            _ => None,
        }
    }

    pub fn begin_update(&mut self, requested: &str) {
        self.sync = RowSync::Pending {
            requested: requested.to_string(),
        };
    }

    /// Settles a pending change. On failure the row keeps its confirmed
    /// status and remembers why the change was refused.
    pub fn resolve(&mut self, outcome: Result<Record, String>) {
        let requested = match std::mem::replace(&mut self.sync, RowSync::Confirmed) {
            RowSync::Pending { requested } | RowSync::Failed { requested, .. } => requested,
            RowSync::Confirmed => self.record.status.clone(),
        };
        match outcome {
            Ok(record) => self.record = record,
            Err(reason) => self.sync = RowSync::Failed { requested, reason },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChangeRejected {
    #[error("Status changes are disabled while showing saved data")]
    ReadOnly,

    #[error("No application {0} in this list")]
    UnknownRow(RecordId),
}

/// Terminal states of the list page. Loading is the in-flight `load` call.
#[derive(Debug, Clone)]
pub enum ListView {
    Live(Vec<ListRow>),
    Degraded(Vec<ListRow>),
    Failed,
}

impl ListView {
    /// Live feed first; on any failure the fallback dataset, read-only.
    pub async fn load(source: &TieredSource) -> Self {
        match source.fetch_all().await {
            Ok(sourced) => Self::from_sourced(sourced),
            Err(e) => {
                error!(error = %e, "Fallback data could not be loaded, list left empty");
                ListView::Failed
            }
        }
    }

    pub fn from_sourced(sourced: Sourced<Vec<Record>>) -> Self {
        let Sourced {
            provenance,
            value: mut records,
        } = sourced;
        sort_newest_first(&mut records);
        let editable = provenance.is_live();
        let rows = records
            .into_iter()
            .map(|r| ListRow::new(r, editable))
            .collect();
        match provenance {
            Provenance::Live => ListView::Live(rows),
            Provenance::Fallback => ListView::Degraded(rows),
        }
    }

    pub fn rows(&self) -> &[ListRow] {
        match self {
            ListView::Live(rows) | ListView::Degraded(rows) => rows,
            ListView::Failed => &[],
        }
    }

    pub fn provenance(&self) -> Option<Provenance> {
        match self {
            ListView::Live(_) => Some(Provenance::Live),
            ListView::Degraded(_) => Some(Provenance::Fallback),
            ListView::Failed => None,
        }
    }

    /// `live`, `fallback` or `none`, for the page's data attributes.
    pub fn source_tag(&self) -> &'static str {
        match self.provenance() {
            Some(Provenance::Live) => "live",
            Some(Provenance::Fallback) => "fallback",
            None => "none",
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ListView::Degraded(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ListView::Failed)
    }

    /// Applies one status change through the live feed. The row ends up
    /// `Confirmed` with the stored record or `Failed` with the reason.
    pub async fn change_status(
        &mut self,
        live: &dyn LiveFeed,
        id: &RecordId,
        requested: &str,
        validation: StatusValidation,
    ) -> Result<&ListRow, ChangeRejected> {
        let rows = match self {
            ListView::Live(rows) => rows,
            ListView::Degraded(_) | ListView::Failed => return Err(ChangeRejected::ReadOnly),
        };
        let row = rows
            .iter_mut()
            .find(|r| &r.record.id == id)
            .ok_or_else(|| ChangeRejected::UnknownRow(id.clone()))?;

        row.begin_update(requested);
        if let Err(rejection) = validation.check(requested) {
            row.resolve(Err(rejection.to_string()));
            return Ok(row);
        }

        let outcome = live.update_status(id, requested).await;
        match &outcome {
            Ok(_) => info!(%id, status = requested, "Status updated"),
            Err(e) => warn!(%id, status = requested, error = %e, "Status update failed"),
        }
        row.resolve(outcome.map_err(|e| format!("Could not save status: {e}")));
        Ok(row)
    }
}
