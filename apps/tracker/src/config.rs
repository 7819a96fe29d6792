use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};

use crate::models::record::StatusValidation;

/// Deployment flavour. Production talks to the managed database over its
/// instance socket; development connects over TCP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

/// Where the Postgres pool connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PgTarget {
    /// A full connection URL; wins over everything else when present.
    Url(String),
    Tcp { host: String, port: u16 },
    Socket { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgSettings {
    pub target: PgTarget,
    pub user: String,
    pub password: String,
    pub database: String,
    pub ensure_schema: bool,
}

/// Exactly one backend is active per deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres(PgSettings),
    Document { redis_url: String },
    Memory,
}

impl StoreBackend {
    pub fn name(&self) -> &'static str {
        match self {
            StoreBackend::Postgres(_) => "postgres",
            StoreBackend::Document { .. } => "document",
            StoreBackend::Memory => "memory",
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub app_env: AppEnv,
    pub backend: StoreBackend,
    pub pool_max_connections: u32,
    pub collection: String,
    pub status_validation: StatusValidation,
    pub public_dir: PathBuf,
    pub fallback_dataset: PathBuf,
    pub api_base_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env = Env(&lookup);

        let app_env = match env.or("APP_ENV", "development").as_str() {
            "development" => AppEnv::Development,
            "production" => AppEnv::Production,
            other => bail!("APP_ENV must be 'development' or 'production', got '{other}'"),
        };

        let backend = match env.or("STORE_BACKEND", "postgres").as_str() {
            "postgres" => StoreBackend::Postgres(pg_settings(&env, app_env)?),
            "document" => StoreBackend::Document {
                redis_url: env.require("REDIS_URL")?,
            },
            "memory" => StoreBackend::Memory,
            other => bail!("STORE_BACKEND must be postgres, document or memory, got '{other}'"),
        };

        let collection = env.or("COLLECTION", "applications");
        if !is_plain_identifier(&collection) {
            bail!("COLLECTION must be a plain identifier ([a-z0-9_]), got '{collection}'");
        }

        let status_validation = match env.or("STATUS_VALIDATION", "strict").as_str() {
            "strict" => StatusValidation::Strict,
            "permissive" => StatusValidation::Permissive,
            other => bail!("STATUS_VALIDATION must be strict or permissive, got '{other}'"),
        };

        let public_dir = PathBuf::from(env.or("PUBLIC_DIR", "public"));
        let fallback_dataset = env
            .get("FALLBACK_DATASET")
            .map(PathBuf::from)
            .unwrap_or_else(|| public_dir.join("data.json"));

        let pool_max_connections = env
            .or("DB_POOL_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .context("DB_POOL_MAX_CONNECTIONS must be a positive integer")?;
        if pool_max_connections == 0 {
            bail!("DB_POOL_MAX_CONNECTIONS must be at least 1");
        }

        Ok(Config {
            app_env,
            backend,
            pool_max_connections,
            collection,
            status_validation,
            public_dir,
            fallback_dataset,
            api_base_url: env.get("API_BASE_URL"),
            port: env
                .or("PORT", "3000")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env.or("RUST_LOG", "info"),
        })
    }

    /// Logs the effective configuration. The password is only reported as set/unset.
    pub fn log_summary(&self) {
        tracing::info!(
            app_env = ?self.app_env,
            backend = self.backend.name(),
            collection = %self.collection,
            pool_max_connections = self.pool_max_connections,
            status_validation = ?self.status_validation,
            fallback_dataset = %self.fallback_dataset.display(),
            api_base_url = self.api_base_url.as_deref().unwrap_or("<in-process>"),
            "Configuration loaded"
        );
        if let StoreBackend::Postgres(pg) = &self.backend {
            let target = match &pg.target {
                PgTarget::Url(_) => "DATABASE_URL".to_string(),
                PgTarget::Tcp { host, port } => format!("{host}:{port}"),
                PgTarget::Socket { path } => path.display().to_string(),
            };
            tracing::info!(
                db_user = %pg.user,
                db_database = %pg.database,
                db_target = %target,
                db_password_set = !pg.password.is_empty(),
                "Postgres settings"
            );
        }
    }
}

struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.is_empty())
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn require(&self, key: &str) -> Result<String> {
        self.get(key)
            .ok_or_else(|| anyhow!("Required environment variable '{key}' is not set"))
    }
}

fn pg_settings(env: &Env<'_>, app_env: AppEnv) -> Result<PgSettings> {
    let ensure_schema = matches!(env.or("ENSURE_SCHEMA", "false").as_str(), "true" | "1");

    if let Some(url) = env.get("DATABASE_URL") {
        return Ok(PgSettings {
            target: PgTarget::Url(url),
            user: String::new(),
            password: String::new(),
            database: String::new(),
            ensure_schema,
        });
    }

    let target = match app_env {
        AppEnv::Production => PgTarget::Socket {
            path: PathBuf::from(env.require("INSTANCE_UNIX_SOCKET")?),
        },
        AppEnv::Development => PgTarget::Tcp {
            host: env.or("DB_HOST", "localhost"),
            port: env
                .or("DB_PORT", "5432")
                .parse::<u16>()
                .context("DB_PORT must be a valid port number")?,
        },
    };

    Ok(PgSettings {
        target,
        user: env.require("DB_USER")?,
        password: env.get("DB_PASSWORD").unwrap_or_default(),
        database: env.require("DB_DATABASE")?,
        ensure_schema,
    })
}

fn is_plain_identifier(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with(|c: char| c.is_ascii_digit())
        && s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_development_postgres_uses_tcp_defaults() {
        let config = Config::from_vars(&vars(&[
            ("DB_USER", "tracker"),
            ("DB_PASSWORD", "secret"),
            ("DB_DATABASE", "jobs"),
        ]))
        .unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.collection, "applications");
        assert_eq!(config.status_validation, StatusValidation::Strict);
        assert_eq!(config.fallback_dataset, PathBuf::from("public/data.json"));
        match config.backend {
            StoreBackend::Postgres(pg) => {
                assert_eq!(
                    pg.target,
                    PgTarget::Tcp {
                        host: "localhost".to_string(),
                        port: 5432
                    }
                );
                assert!(!pg.ensure_schema);
            }
            other => panic!("expected postgres backend, got {other:?}"),
        }
    }

    #[test]
    fn test_production_postgres_requires_instance_socket() {
        let base = [
            ("APP_ENV", "production"),
            ("DB_USER", "tracker"),
            ("DB_DATABASE", "jobs"),
        ];
        let err = Config::from_vars(&vars(&base)).unwrap_err();
        assert!(err.to_string().contains("INSTANCE_UNIX_SOCKET"));

        let mut with_socket = vars(&base);
        with_socket.insert(
            "INSTANCE_UNIX_SOCKET".to_string(),
            "/cloudsql/project:region:instance".to_string(),
        );
        let config = Config::from_vars(&with_socket).unwrap();
        match config.backend {
            StoreBackend::Postgres(pg) => assert_eq!(
                pg.target,
                PgTarget::Socket {
                    path: PathBuf::from("/cloudsql/project:region:instance")
                }
            ),
            other => panic!("expected postgres backend, got {other:?}"),
        }
    }

    #[test]
    fn test_database_url_overrides_discrete_settings() {
        let config = Config::from_vars(&vars(&[(
            "DATABASE_URL",
            "postgres://u:p@db/jobs",
        )]))
        .unwrap();
        match config.backend {
            StoreBackend::Postgres(pg) => {
                assert_eq!(pg.target, PgTarget::Url("postgres://u:p@db/jobs".to_string()))
            }
            other => panic!("expected postgres backend, got {other:?}"),
        }
    }

    #[test]
    fn test_document_backend_requires_redis_url() {
        let err = Config::from_vars(&vars(&[("STORE_BACKEND", "document")])).unwrap_err();
        assert!(err.to_string().contains("REDIS_URL"));

        let config = Config::from_vars(&vars(&[
            ("STORE_BACKEND", "document"),
            ("REDIS_URL", "redis://127.0.0.1/"),
        ]))
        .unwrap();
        assert_eq!(config.backend.name(), "document");
    }

    #[test]
    fn test_collection_must_be_plain_identifier() {
        let err = Config::from_vars(&vars(&[
            ("STORE_BACKEND", "memory"),
            ("COLLECTION", "jobs; DROP TABLE jobs"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("COLLECTION"));

        let config = Config::from_vars(&vars(&[
            ("STORE_BACKEND", "memory"),
            ("COLLECTION", "jobs"),
        ]))
        .unwrap();
        assert_eq!(config.collection, "jobs");
    }

    #[test]
    fn test_rejects_unknown_modes_and_zero_pool() {
        assert!(Config::from_vars(&vars(&[("STORE_BACKEND", "mongo")])).is_err());
        assert!(Config::from_vars(&vars(&[
            ("STORE_BACKEND", "memory"),
            ("STATUS_VALIDATION", "lenient")
        ]))
        .is_err());
        assert!(Config::from_vars(&vars(&[
            ("STORE_BACKEND", "memory"),
            ("DB_POOL_MAX_CONNECTIONS", "0")
        ]))
        .is_err());
    }
}
