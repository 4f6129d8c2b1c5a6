use super::*;
use crate::backend::memory::Fault;
use crate::services::assets::AssetError;
use crate::services::screens::ScreenError;
use crate::backend::BackendError;
use crate::state::test_helpers::{TTF_BYTES, initialized_app_state, test_app_state};
use uuid::Uuid;

#[test]
fn editor_error_to_status_maps_busy_to_conflict() {
    assert_eq!(editor_error_to_status(EditorError::Busy("save in progress")), StatusCode::CONFLICT);
}

#[test]
fn editor_error_to_status_maps_store_failures_to_bad_gateway() {
    let screen = EditorError::Screen(ScreenError::Save(BackendError::NotFound(Uuid::nil())));
    let asset = EditorError::Asset(AssetError::Upload(BackendError::Unavailable("down".into())));
    assert_eq!(editor_error_to_status(screen), StatusCode::BAD_GATEWAY);
    assert_eq!(editor_error_to_status(asset), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn save_before_initialize_is_conflict() {
    let (state, _) = test_app_state();
    let status = save_screen(State(state)).await.unwrap_err();
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn patch_then_save_persists_patched_fields() {
    let (state, backend) = initialized_app_state().await;
    let bg = Uuid::new_v4();
    let patch: ScreenDraft = serde_json::from_value(serde_json::json!({ "background_image_id": bg })).unwrap();

    let Json(working) = patch_screen(State(state.clone()), Json(patch)).await;
    assert_eq!(working.background_image_id(), Some(bg));

    let Json(saved) = save_screen(State(state)).await.unwrap();
    assert_eq!(saved.background_image_id, Some(bg));
    assert_eq!(backend.screen_count().await, 1);
}

#[tokio::test]
async fn patch_with_null_clears_field() {
    let (state, _) = initialized_app_state().await;
    state.editor.select_background(Some(Uuid::new_v4())).await;
    let patch: ScreenDraft = serde_json::from_value(serde_json::json!({ "background_image_id": null })).unwrap();

    let Json(working) = patch_screen(State(state), Json(patch)).await;
    assert_eq!(working.background_image_id, Some(None));
}

#[tokio::test]
async fn save_failure_is_bad_gateway() {
    let (state, backend) = initialized_app_state().await;
    backend.set_fault(Fault::ScreenWrite, true);
    let status = save_screen(State(state)).await.unwrap_err();
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn upload_image_returns_created_and_lists_it() {
    let (state, _) = initialized_app_state().await;
    let params = UploadParams { name: "bg.png".into() };

    let (status, Json(image)) = upload_image(State(state.clone()), Query(params), Bytes::from_static(b"png"))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(image.name.as_deref(), Some("bg.png"));

    let Json(listed) = list_images(State(state)).await;
    assert_eq!(listed, vec![image]);
}

#[tokio::test]
async fn upload_font_failure_is_bad_gateway() {
    let (state, backend) = initialized_app_state().await;
    backend.set_fault(Fault::InsertAsset, true);
    let params = UploadParams { name: "Serif.ttf".into() };

    let status = upload_font(State(state), Query(params), Bytes::from_static(TTF_BYTES))
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn uploaded_font_reports_loaded_status() {
    let (state, _) = initialized_app_state().await;
    let params = UploadParams { name: "open_sans-bold.ttf".into() };
    let (_, Json(font)) = upload_font(State(state.clone()), Query(params), Bytes::from_static(TTF_BYTES))
        .await
        .unwrap();
    assert_eq!(font.name, "open sans bold");

    let Json(listed) = list_fonts(State(state.clone())).await;
    assert_eq!(listed.len(), 1);
    let Json(status) = font_status(State(state.clone())).await;
    assert_eq!(status[0].id, font.id);
    assert!(status[0].status.is_some());
    let Json(faces) = font_faces(State(state)).await;
    assert_eq!(faces.len(), 1);
    assert_eq!(faces[0].family, "open sans bold");
}

#[tokio::test]
async fn dismiss_unknown_notification_is_not_found() {
    let (state, _) = initialized_app_state().await;
    assert_eq!(dismiss_notification(State(state), Path(42)).await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dismiss_save_notification_is_no_content() {
    let (state, _) = initialized_app_state().await;
    save_screen(State(state.clone())).await.unwrap();
    let Json(view) = get_editor(State(state.clone())).await;
    let notification = view.notification.expect("save notification");

    assert_eq!(dismiss_notification(State(state.clone()), Path(notification.id)).await, StatusCode::NO_CONTENT);
    let Json(view) = get_editor(State(state)).await;
    assert!(view.notification.is_none());
}

#[tokio::test]
async fn preview_routes_agree() {
    let (state, _) = initialized_app_state().await;
    let Json(tree) = preview_json(State(state.clone())).await;
    let Html(html) = preview_html(State(state.clone())).await;
    assert_eq!(tree.children.len(), 6);
    assert!(html.contains("Sign In"));

    let Json(view) = get_editor(State(state)).await;
    assert!(!view.initial_loading);
}
