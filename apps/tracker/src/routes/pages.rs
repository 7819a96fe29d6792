use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    Form,
};
use chrono::Local;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::RecordId;
use crate::state::AppState;
use crate::views::list::ChangeRejected;
use crate::views::{LetterPage, LetterView, ListPage, ListView};

#[derive(Debug, Deserialize)]
pub struct LetterQuery {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    #[serde(default)]
    pub status: String,
}

fn render_list(
    state: &AppState,
    view: &ListView,
    notice: Option<&str>,
) -> Result<Html<String>, AppError> {
    let page = ListPage {
        view,
        collection: &state.config.collection,
        notice,
    };
    Ok(Html(page.render()?))
}

/// GET / and every unmatched GET: the application shell.
pub async fn list_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let view = ListView::load(&state.pages).await;
    render_list(&state, &view, None)
}

/// GET /cover-letter?id=<id>
pub async fn letter_page(
    State(state): State<AppState>,
    Query(query): Query<LetterQuery>,
) -> Result<Html<String>, AppError> {
    let id = query.id.filter(|id| !id.is_empty()).map(RecordId::new);
    let view = LetterView::load(&state.pages, id.as_ref()).await;
    let page = LetterPage::new(&view, Local::now().date_naive());
    Ok(Html(page.render()?))
}

/// POST /applications/:id/status
///
/// Form submission from the list page. Re-renders the list with the
/// row's outcome instead of redirecting, so a refused change stays visible.
pub async fn submit_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Result<(StatusCode, Html<String>), AppError> {
    let mut view = ListView::load(&state.pages).await;
    let id = RecordId::new(id);

    let outcome = view
        .change_status(
            state.pages.live(),
            &id,
            &form.status,
            state.config.status_validation,
        )
        .await
        .map(|row| row.failure().is_some());

    match outcome {
        Ok(failed) => {
            let status = if failed {
                StatusCode::UNPROCESSABLE_ENTITY
            } else {
                StatusCode::OK
            };
            Ok((status, render_list(&state, &view, None)?))
        }
        Err(rejected) => {
            let status = match rejected {
                ChangeRejected::ReadOnly => StatusCode::CONFLICT,
                ChangeRejected::UnknownRow(_) => StatusCode::NOT_FOUND,
            };
            let notice = rejected.to_string();
            Ok((status, render_list(&state, &view, Some(&notice))?))
        }
    }
}
