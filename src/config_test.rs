use super::*;
use std::collections::HashMap;

fn from_pairs(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
    let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    AppConfig::from_vars(|key| vars.get(key).cloned())
}

/// # Safety
/// Tests must run with `--test-threads=1` to avoid env races.
unsafe fn clear_config_env() {
    unsafe {
        std::env::remove_var("PORT");
        std::env::remove_var("BACKEND");
        std::env::remove_var("DATABASE_URL");
        std::env::remove_var("DB_MAX_CONNECTIONS");
        std::env::remove_var("STORAGE_DIR");
        std::env::remove_var("PUBLIC_BASE_URL");
        std::env::remove_var("FONT_FETCH_TIMEOUT_SECS");
        std::env::remove_var("UPLOAD_MAX_BYTES");
    }
}

#[test]
fn parse_backend_infers_from_database_url() {
    assert_eq!(parse_backend(None, true).unwrap(), BackendKind::Postgres);
    assert_eq!(parse_backend(None, false).unwrap(), BackendKind::Memory);
    assert_eq!(parse_backend(Some(""), true).unwrap(), BackendKind::Postgres);
}

#[test]
fn parse_backend_honors_explicit_choice() {
    assert_eq!(parse_backend(Some("memory"), true).unwrap(), BackendKind::Memory);
    assert_eq!(parse_backend(Some("postgres"), false).unwrap(), BackendKind::Postgres);
    assert!(matches!(parse_backend(Some("sqlite"), false), Err(ConfigError::Invalid { var: "BACKEND", .. })));
}

#[test]
fn from_env_defaults_to_memory_backend() {
    unsafe { clear_config_env() };

    let cfg = AppConfig::from_env().unwrap();
    assert_eq!(cfg.port, DEFAULT_PORT);
    assert_eq!(cfg.backend, BackendKind::Memory);
    assert_eq!(cfg.database_url, None);
    assert_eq!(cfg.db_max_connections, DEFAULT_DB_MAX_CONNECTIONS);
    assert_eq!(cfg.storage_dir, PathBuf::from(DEFAULT_STORAGE_DIR));
    assert_eq!(cfg.public_base_url, "http://localhost:3000");
    assert_eq!(cfg.font_fetch_timeout_secs, DEFAULT_FONT_FETCH_TIMEOUT_SECS);
    assert_eq!(cfg.upload_max_bytes, DEFAULT_UPLOAD_MAX_BYTES);
}

#[test]
fn from_vars_parses_overrides() {
    let cfg = from_pairs(&[
        ("PORT", "8080"),
        ("DATABASE_URL", "postgres://localhost/designer"),
        ("DB_MAX_CONNECTIONS", "12"),
        ("STORAGE_DIR", "/var/lib/designer"),
        ("PUBLIC_BASE_URL", "https://designer.test/"),
        ("FONT_FETCH_TIMEOUT_SECS", "3"),
        ("UPLOAD_MAX_BYTES", "1048576"),
    ])
    .unwrap();

    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.backend, BackendKind::Postgres);
    assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/designer"));
    assert_eq!(cfg.db_max_connections, 12);
    assert_eq!(cfg.storage_dir, PathBuf::from("/var/lib/designer"));
    assert_eq!(cfg.public_base_url, "https://designer.test");
    assert_eq!(cfg.font_fetch_timeout_secs, 3);
    assert_eq!(cfg.upload_max_bytes, 1_048_576);
}

#[test]
fn public_base_url_follows_port() {
    let cfg = from_pairs(&[("PORT", "4100")]).unwrap();
    assert_eq!(cfg.public_base_url, "http://localhost:4100");
}

#[test]
fn memory_backend_can_be_forced_with_database_url_set() {
    let cfg = from_pairs(&[("BACKEND", "memory"), ("DATABASE_URL", "postgres://localhost/designer")]).unwrap();
    assert_eq!(cfg.backend, BackendKind::Memory);
}

#[test]
fn blank_database_url_counts_as_unset() {
    let cfg = from_pairs(&[("DATABASE_URL", "  ")]).unwrap();
    assert_eq!(cfg.backend, BackendKind::Memory);
    assert_eq!(cfg.database_url, None);
}

#[test]
fn unparseable_numbers_fall_back_to_defaults() {
    let cfg = from_pairs(&[("DB_MAX_CONNECTIONS", "lots"), ("FONT_FETCH_TIMEOUT_SECS", "-1")]).unwrap();
    assert_eq!(cfg.db_max_connections, DEFAULT_DB_MAX_CONNECTIONS);
    assert_eq!(cfg.font_fetch_timeout_secs, DEFAULT_FONT_FETCH_TIMEOUT_SECS);
}

#[test]
fn bad_port_is_rejected() {
    assert!(matches!(from_pairs(&[("PORT", "http")]), Err(ConfigError::Invalid { var: "PORT", .. })));
}

#[test]
fn postgres_requires_database_url() {
    assert!(matches!(from_pairs(&[("BACKEND", "postgres")]), Err(ConfigError::MissingDatabaseUrl)));
}
