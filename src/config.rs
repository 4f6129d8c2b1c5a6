//! Service configuration parsed from environment variables.

use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_STORAGE_DIR: &str = "./storage";
pub const DEFAULT_FONT_FETCH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_UPLOAD_MAX_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}: {value}")]
    Invalid { var: &'static str, value: String },
    #[error("DATABASE_URL is required for the postgres backend")]
    MissingDatabaseUrl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub backend: BackendKind,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub storage_dir: PathBuf,
    pub public_base_url: String,
    pub font_fetch_timeout_secs: u64,
    pub upload_max_bytes: usize,
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `BACKEND`: `postgres` or `memory`; inferred from `DATABASE_URL` when absent
    /// - `DATABASE_URL`: required when the backend is `postgres`
    /// - `DB_MAX_CONNECTIONS`: default 5
    /// - `STORAGE_DIR`: default `./storage`
    /// - `PUBLIC_BASE_URL`: default `http://localhost:{PORT}`
    /// - `FONT_FETCH_TIMEOUT_SECS`: default 10
    /// - `UPLOAD_MAX_BYTES`: largest accepted upload body, default 50 MiB
    ///
    /// # Errors
    ///
    /// Returns `Invalid` for an unparseable `PORT` or unknown `BACKEND`, and
    /// `MissingDatabaseUrl` when `postgres` is requested without a URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`], reading variables through `var`.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_env`].
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match var("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid { var: "PORT", value: raw })?,
            None => DEFAULT_PORT,
        };

        let database_url = var("DATABASE_URL").filter(|url| !url.trim().is_empty());
        let backend = parse_backend(var("BACKEND").as_deref(), database_url.is_some())?;
        if backend == BackendKind::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        let storage_dir = var("STORAGE_DIR").map_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR), PathBuf::from);
        let public_base_url = var("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            port,
            backend,
            database_url,
            db_max_connections: parse_or(var("DB_MAX_CONNECTIONS"), DEFAULT_DB_MAX_CONNECTIONS),
            storage_dir,
            public_base_url,
            font_fetch_timeout_secs: parse_or(var("FONT_FETCH_TIMEOUT_SECS"), DEFAULT_FONT_FETCH_TIMEOUT_SECS),
            upload_max_bytes: parse_or(var("UPLOAD_MAX_BYTES"), DEFAULT_UPLOAD_MAX_BYTES),
        })
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.parse::<T>().ok()).unwrap_or(default)
}

fn parse_backend(raw: Option<&str>, has_database_url: bool) -> Result<BackendKind, ConfigError> {
    match raw {
        None | Some("") if has_database_url => Ok(BackendKind::Postgres),
        None | Some("") => Ok(BackendKind::Memory),
        Some("postgres") => Ok(BackendKind::Postgres),
        Some("memory") => Ok(BackendKind::Memory),
        Some(other) => Err(ConfigError::Invalid { var: "BACKEND", value: other.to_owned() }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
