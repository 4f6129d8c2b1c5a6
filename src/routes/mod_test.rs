use super::*;
use crate::state::test_helpers::initialized_app_state;

const MIB: usize = 1024 * 1024;

/// Serve `app` on an ephemeral local port and return its base URL.
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn healthz_is_ok() {
    let (state, _) = initialized_app_state().await;
    let base = serve(app(state, None, MIB)).await;
    let status = reqwest::get(format!("{base}/healthz")).await.unwrap().status();
    assert_eq!(status.as_u16(), 200);
}

#[tokio::test]
async fn image_upload_above_axum_default_limit_is_accepted() {
    let (state, _) = initialized_app_state().await;
    let base = serve(app(state.clone(), None, 8 * MIB)).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/images?name=bg.png"))
        .body(vec![0_u8; 3 * MIB])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    assert_eq!(state.editor.images().await.len(), 1);
}

#[tokio::test]
async fn font_upload_above_configured_limit_is_rejected() {
    let (state, _) = initialized_app_state().await;
    let base = serve(app(state.clone(), None, MIB)).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/fonts?name=big.ttf"))
        .body(vec![0_u8; MIB + 1024])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 413);
    assert!(state.editor.fonts().await.is_empty());
}
