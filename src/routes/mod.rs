//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the editor's HTTP endpoints under a single Axum router.
//! The JSON API stands in for the editor UI; `/preview` serves the rendered
//! sign-in screen. Uploaded files are served from the bucket directory at
//! `/storage` when the backend writes them to disk.

pub mod editor;

use std::path::PathBuf;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::storage::STORAGE_ROUTE;

/// Editor API routes. Upload routes accept bodies up to `upload_max_bytes`.
fn api_routes(state: AppState, upload_max_bytes: usize) -> Router {
    let upload_limit = DefaultBodyLimit::max(upload_max_bytes);

    Router::new()
        .route("/api/editor", get(editor::get_editor))
        .route("/api/editor/screen", patch(editor::patch_screen))
        .route("/api/editor/save", post(editor::save_screen))
        .route("/api/editor/notifications/{id}", delete(editor::dismiss_notification))
        .route(
            "/api/images",
            get(editor::list_images).post(editor::upload_image).layer(upload_limit),
        )
        .route(
            "/api/fonts",
            get(editor::list_fonts).post(editor::upload_font).layer(upload_limit),
        )
        .route("/api/fonts/status", get(editor::font_status))
        .route("/api/fonts/faces", get(editor::font_faces))
        .route("/api/preview", get(editor::preview_json))
        .route("/preview", get(editor::preview_html))
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// Full application router. `storage_root` is the bucket directory to serve,
/// if uploads are written to disk.
pub fn app(state: AppState, storage_root: Option<PathBuf>, upload_max_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = api_routes(state, upload_max_bytes);
    if let Some(root) = storage_root {
        router = router.nest_service(STORAGE_ROUTE, ServeDir::new(root));
    }
    router.layer(cors).layer(TraceLayer::new_for_http())
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
