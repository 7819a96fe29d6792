use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tracing::info;

use crate::config::{PgSettings, PgTarget};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Builds the PostgreSQL connection pool.
///
/// The pool connects lazily: the server comes up even when the database is
/// unreachable, and each request then fails on its own.
pub fn create_pool(settings: &PgSettings, max_connections: u32) -> Result<PgPool> {
    let options = connect_options(settings)?;
    info!(max_connections, "Creating PostgreSQL connection pool");

    Ok(PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_lazy_with(options))
}

fn connect_options(settings: &PgSettings) -> Result<PgConnectOptions> {
    let base = || {
        PgConnectOptions::new()
            .username(&settings.user)
            .password(&settings.password)
            .database(&settings.database)
    };

    Ok(match &settings.target {
        PgTarget::Url(url) => {
            PgConnectOptions::from_str(url).context("DATABASE_URL is not a valid Postgres URL")?
        }
        PgTarget::Tcp { host, port } => base().host(host).port(*port),
        PgTarget::Socket { path } => base().socket(path),
    })
}
