mod backend;
mod config;
mod db;
mod model;
mod routes;
mod services;
mod state;
mod storage;

use std::sync::Arc;

use backend::{DesignBackend, MemoryBackend, PgBackend};
use config::{AppConfig, BackendKind};
use services::fonts::HttpFontSource;
use storage::BucketStore;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env().expect("invalid configuration");
    let storage = BucketStore::new(config.storage_dir.clone(), &config.public_base_url);
    let storage_root = storage.root().to_path_buf();

    let backend: Arc<dyn DesignBackend> = match (config.backend, config.database_url.as_deref()) {
        (BackendKind::Postgres, Some(database_url)) => {
            let pool = db::init_pool(database_url, config.db_max_connections)
                .await
                .expect("database init failed");
            Arc::new(PgBackend::new(pool, storage))
        }
        _ => {
            tracing::warn!("no database configured; screens and asset lists are not persisted");
            Arc::new(MemoryBackend::with_storage(storage))
        }
    };

    let font_source = HttpFontSource::new(config.font_fetch_timeout_secs).expect("font http client init failed");
    let state = state::AppState::new(backend, Arc::new(font_source));

    let app = routes::app(state.clone(), Some(storage_root), config.upload_max_bytes);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("failed to bind");

    // Bound first: font URLs may point back at our own /storage route.
    // The editor reports initial_loading until this finishes.
    let editor = state.editor.clone();
    tokio::spawn(async move { editor.initialize().await });

    tracing::info!(port = config.port, backend = ?config.backend, "signin designer listening");
    axum::serve(listener, app).await.expect("server failed");
}
