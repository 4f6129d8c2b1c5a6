use super::*;

#[tokio::test]
async fn insert_asset_stores_row_with_registered_name() {
    let backend = MemoryBackend::new();
    let row = backend
        .insert_asset(AssetKind::Font, "memory://fonts/a.ttf", "Open Sans")
        .await
        .unwrap();
    assert_eq!(row.name.as_deref(), Some("Open Sans"));

    let listed = backend.list_assets(AssetKind::Font).await.unwrap();
    assert_eq!(listed, vec![row]);
    assert!(backend.list_assets(AssetKind::Image).await.unwrap().is_empty());
}

#[tokio::test]
async fn insert_asset_honors_fault() {
    let backend = MemoryBackend::new();
    backend.set_fault(Fault::InsertAsset, true);
    let err = backend.insert_asset(AssetKind::Image, "u", "a.png").await.unwrap_err();
    assert!(matches!(err, BackendError::Unavailable(_)));
    assert!(backend.list_assets(AssetKind::Image).await.unwrap().is_empty());
}

#[tokio::test]
async fn put_object_without_storage_keeps_blob_in_memory() {
    let backend = MemoryBackend::new();
    backend.put_object(AssetKind::Image, "k.png", b"png").await.unwrap();
    assert_eq!(backend.blob_count(AssetKind::Image).await, 1);
    assert_eq!(backend.public_url(AssetKind::Image, "k.png"), "memory://images/k.png");
}
