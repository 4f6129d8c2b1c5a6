//! Editor routes: HTTP translation over the editor shell.
//!
//! Store failures surface as `502 Bad Gateway`; the detail has already been
//! logged and turned into a notification by the shell.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, Json};
use serde::Deserialize;

use crate::model::{FontItem, ImageItem, Screen, ScreenDraft};
use crate::services::editor::{EditorError, EditorView, FontStatusEntry};
use crate::services::fonts::RegisteredFace;
use crate::services::preview::PreviewTree;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub name: String,
}

pub(crate) fn editor_error_to_status(err: EditorError) -> StatusCode {
    match err {
        EditorError::Busy(_) => StatusCode::CONFLICT,
        EditorError::Screen(_) | EditorError::Asset(_) => StatusCode::BAD_GATEWAY,
    }
}

/// `GET /api/editor`: full editor state.
pub async fn get_editor(State(state): State<AppState>) -> Json<EditorView> {
    Json(state.editor.view().await)
}

/// `PATCH /api/editor/screen`: merge the present fields into the working screen.
pub async fn patch_screen(State(state): State<AppState>, Json(patch): Json<ScreenDraft>) -> Json<ScreenDraft> {
    Json(state.editor.apply(patch).await)
}

/// `POST /api/editor/save`: persist the working screen.
pub async fn save_screen(State(state): State<AppState>) -> Result<Json<Screen>, StatusCode> {
    let screen = state.editor.save().await.map_err(editor_error_to_status)?;
    Ok(Json(screen))
}

/// `DELETE /api/editor/notifications/:id`
pub async fn dismiss_notification(State(state): State<AppState>, Path(id): Path<u64>) -> StatusCode {
    if state.editor.dismiss(id).await { StatusCode::NO_CONTENT } else { StatusCode::NOT_FOUND }
}

/// `GET /api/images`
pub async fn list_images(State(state): State<AppState>) -> Json<Vec<ImageItem>> {
    Json(state.editor.images().await)
}

/// `POST /api/images?name=<file>`: body is the raw file.
pub async fn upload_image(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<(StatusCode, Json<ImageItem>), StatusCode> {
    let image = state
        .editor
        .upload_image(&body, &params.name)
        .await
        .map_err(editor_error_to_status)?;
    Ok((StatusCode::CREATED, Json(image)))
}

/// `GET /api/fonts`
pub async fn list_fonts(State(state): State<AppState>) -> Json<Vec<FontItem>> {
    Json(state.editor.fonts().await)
}

/// `POST /api/fonts?name=<file>`: body is the raw file.
pub async fn upload_font(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<(StatusCode, Json<FontItem>), StatusCode> {
    let font = state
        .editor
        .upload_font(&body, &params.name)
        .await
        .map_err(editor_error_to_status)?;
    Ok((StatusCode::CREATED, Json(font)))
}

/// `GET /api/fonts/status`: load state per font in the list.
pub async fn font_status(State(state): State<AppState>) -> Json<Vec<FontStatusEntry>> {
    Json(state.editor.font_status().await)
}

/// `GET /api/fonts/faces`: faces registered for rendering, by family.
pub async fn font_faces(State(state): State<AppState>) -> Json<Vec<RegisteredFace>> {
    Json(state.editor.registered_faces().await)
}

/// `GET /api/preview`: preview tree as JSON.
pub async fn preview_json(State(state): State<AppState>) -> Json<PreviewTree> {
    let (tree, _) = state.editor.preview().await;
    Json(tree)
}

/// `GET /preview`: preview as a standalone HTML page.
pub async fn preview_html(State(state): State<AppState>) -> Html<String> {
    let (tree, fonts) = state.editor.preview().await;
    Html(tree.to_html(&fonts))
}

#[cfg(test)]
#[path = "editor_test.rs"]
mod tests;
