pub mod applications;
pub mod health;
pub mod pages;

use axum::{
    handler::Handler,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let collection = state.config.collection.clone();

    // Static assets first; anything the public directory does not have gets the shell.
    let shell = pages::list_page.with_state(state.clone());
    let assets = ServeDir::new(&state.config.public_dir).fallback(shell);

    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            &format!("/api/{collection}"),
            get(applications::list_records),
        )
        .route(
            &format!("/api/{collection}/:id"),
            get(applications::get_record).put(applications::update_status),
        )
        .route("/", get(pages::list_page))
        .route("/cover-letter", get(pages::letter_page))
        .route("/cover-letter.html", get(pages::letter_page))
        .route("/applications/:id/status", post(pages::submit_status))
        .fallback_service(assets)
        .with_state(state)
}
