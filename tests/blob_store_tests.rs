use bytes::Bytes;
use imageable::{BlobStore, BlobStoreError, LocalStore, Visibility};

#[tokio::test]
async fn test_local_store_put_get() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path(), "/storage").unwrap();

    let data = Bytes::from("hello world");
    store
        .put("test-key", data.clone(), Visibility::Public)
        .await
        .unwrap();

    let retrieved = store.get("test-key").await.unwrap();
    assert_eq!(retrieved, data);
}

#[tokio::test]
async fn test_local_store_nested_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path(), "/storage").unwrap();

    // Attachment keys always carry an upload dir prefix
    store
        .put("avatars/a.png", Bytes::from("png"), Visibility::Public)
        .await
        .unwrap();

    assert!(store.exists("avatars/a.png").await.unwrap());
    assert_eq!(store.get("avatars/a.png").await.unwrap(), Bytes::from("png"));
}

#[tokio::test]
async fn test_local_store_exists() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path(), "/storage").unwrap();

    assert!(!store.exists("missing").await.unwrap());

    store
        .put("present", Bytes::from("data"), Visibility::Private)
        .await
        .unwrap();
    assert!(store.exists("present").await.unwrap());
}

#[tokio::test]
async fn test_local_store_delete() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path(), "/storage").unwrap();

    store
        .put("to-delete", Bytes::from("data"), Visibility::Public)
        .await
        .unwrap();
    assert!(store.exists("to-delete").await.unwrap());

    store.delete("to-delete").await.unwrap();
    assert!(!store.exists("to-delete").await.unwrap());
}

#[tokio::test]
async fn test_local_store_delete_nonexistent() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path(), "/storage").unwrap();

    // Deleting a nonexistent key should not error
    store.delete("nonexistent").await.unwrap();
}

#[tokio::test]
async fn test_local_store_get_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path(), "/storage").unwrap();

    let result = store.get("missing").await;
    assert!(result.is_err());
    assert!(matches!(result.unwrap_err(), BlobStoreError::NotFound(_)));
}

#[tokio::test]
async fn test_local_store_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path(), "/storage").unwrap();

    store
        .put("key", Bytes::from("first"), Visibility::Public)
        .await
        .unwrap();
    store
        .put("key", Bytes::from("second"), Visibility::Public)
        .await
        .unwrap();

    let data = store.get("key").await.unwrap();
    assert_eq!(data, Bytes::from("second"));
}

#[tokio::test]
async fn test_local_store_url_and_path_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path(), "http://localhost:8080/storage/").unwrap();

    // Trailing slash on the base URL is normalized away
    assert_eq!(
        store.url("avatars/a.png"),
        "http://localhost:8080/storage/avatars/a.png"
    );

    let path = store.path("avatars/a.png");
    assert!(path.starts_with(dir.path().to_str().unwrap()));
    assert!(path.ends_with("avatars/a.png"));
}
