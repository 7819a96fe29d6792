use std::sync::Arc;

use crate::config::Config;
use crate::feed::TieredSource;
use crate::store::RecordStore;

/// Shared application state injected into all route handlers via Axum extractors.
/// Built once at startup; the store handle is closed by `main` on shutdown.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    /// Live-then-fallback reads for the pages.
    pub pages: TieredSource,
    pub config: Arc<Config>,
}
