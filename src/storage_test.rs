use super::*;
use uuid::Uuid;

fn temp_root() -> PathBuf {
    std::env::temp_dir().join(format!("signin-designer-storage-{}", Uuid::new_v4()))
}

#[test]
fn storage_key_keeps_original_extension() {
    let key = storage_key("My Font.ttf");
    let (token, ext) = key.split_once('.').unwrap();
    assert_eq!(token.len(), 32);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(ext, "ttf");
}

#[test]
fn storage_key_is_random() {
    assert_ne!(storage_key("a.png"), storage_key("a.png"));
}

#[test]
fn storage_key_without_dot_uses_whole_name() {
    let key = storage_key("logo");
    assert!(key.ends_with(".logo"));
}

#[test]
fn storage_key_strips_unsafe_extension_chars() {
    let key = storage_key("evil.p/../ng");
    assert!(key.ends_with(".ng"));
    let key = storage_key("trailing.");
    assert!(key.ends_with(".bin"));
}

#[test]
fn public_url_joins_base_bucket_and_key() {
    let store = BucketStore::new("/tmp/unused", "https://designer.test/");
    assert_eq!(
        store.public_url(AssetKind::Font, "abc.ttf"),
        "https://designer.test/storage/fonts/abc.ttf"
    );
}

#[tokio::test]
async fn put_writes_into_kind_bucket() {
    let root = temp_root();
    let store = BucketStore::new(&root, "http://localhost:3000");
    store.put(AssetKind::Image, "abc.png", b"png-bytes").await.unwrap();

    let written = tokio::fs::read(root.join("images").join("abc.png")).await.unwrap();
    assert_eq!(written, b"png-bytes");
    let _ = tokio::fs::remove_dir_all(&root).await;
}

#[tokio::test]
async fn put_rejects_path_traversal_keys() {
    let root = temp_root();
    let store = BucketStore::new(&root, "http://localhost:3000");
    let err = store.put(AssetKind::Image, "../escape", b"x").await.unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
}
