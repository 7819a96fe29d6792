use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{Record, RecordId};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: Option<String>,
}

/// GET /api/<collection>
pub async fn list_records(State(state): State<AppState>) -> Result<Json<Vec<Record>>, AppError> {
    Ok(Json(state.store.list().await?))
}

/// GET /api/<collection>/:id
pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Record>, AppError> {
    Ok(Json(state.store.get_by_id(&RecordId::new(id)).await?))
}

/// PUT /api/<collection>/:id
///
/// An unreadable body counts as a missing status, so every malformed
/// request is a 400 and never reaches the store.
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Option<Json<StatusUpdate>>,
) -> Result<Json<Record>, AppError> {
    let status = payload
        .and_then(|Json(update)| update.status)
        .unwrap_or_default();
    state.config.status_validation.check(&status)?;

    let record = state
        .store
        .update_status(&RecordId::new(id), &status)
        .await?;
    tracing::info!(id = %record.id, status = %record.status, "Status updated via API");
    Ok(Json(record))
}
