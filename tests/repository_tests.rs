use std::sync::Arc;

use bytes::Bytes;
use imageable::{AttachmentRepository, BlobStore, LocalStore, Visibility};

fn repo(dir: &tempfile::TempDir) -> (AttachmentRepository, Arc<LocalStore>) {
    let store = Arc::new(LocalStore::new(dir.path(), "/storage").unwrap());
    (AttachmentRepository::new(store.clone()), store)
}

#[tokio::test]
async fn test_empty_filename_short_circuits() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, _) = repo(&dir);

    assert!(!repo.image_exists("avatars", "").await.unwrap());
    assert!(!repo.thumbnail_exists("avatars", "").await.unwrap());
    assert!(repo.image_url("avatars", "").await.unwrap().is_none());
    assert!(repo.image_path("avatars", "").await.unwrap().is_none());
    // Delete of nothing is success
    repo.delete_image("avatars", "").await.unwrap();
}

#[tokio::test]
async fn test_store_and_query_image() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, _) = repo(&dir);

    repo.store_image("avatars", "a.png", Bytes::from("png data"))
        .await
        .unwrap();

    assert!(repo.image_exists("avatars", "a.png").await.unwrap());
    assert!(!repo.thumbnail_exists("avatars", "a.png").await.unwrap());

    assert_eq!(
        repo.image_url("avatars", "a.png").await.unwrap().unwrap(),
        "/storage/avatars/a.png"
    );

    let path = repo.image_path("avatars", "a.png").await.unwrap().unwrap();
    assert_eq!(std::fs::read(path).unwrap(), b"png data");
}

#[tokio::test]
async fn test_url_is_none_for_missing_image() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, _) = repo(&dir);

    assert!(repo.image_url("avatars", "ghost.png").await.unwrap().is_none());
    assert!(repo
        .thumbnail_url("avatars", "ghost.png")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_delete_image_removes_thumbnail_first() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, store) = repo(&dir);

    repo.store_image("avatars", "a.png", Bytes::from("primary"))
        .await
        .unwrap();
    repo.store_thumbnail("avatars", "a.png", Bytes::from("thumb"))
        .await
        .unwrap();
    assert!(store.exists("avatars/thumb_a.png").await.unwrap());

    repo.delete_image("avatars", "a.png").await.unwrap();

    assert!(!store.exists("avatars/a.png").await.unwrap());
    assert!(!store.exists("avatars/thumb_a.png").await.unwrap());
}

#[tokio::test]
async fn test_delete_image_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, _) = repo(&dir);

    repo.store_image("avatars", "a.png", Bytes::from("data"))
        .await
        .unwrap();

    repo.delete_image("avatars", "a.png").await.unwrap();
    // Second delete is a no-op returning success
    repo.delete_image("avatars", "a.png").await.unwrap();
}

#[tokio::test]
async fn test_delete_thumbnail_leaves_primary() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, store) = repo(&dir);

    repo.store_image("avatars", "a.png", Bytes::from("primary"))
        .await
        .unwrap();
    repo.store_thumbnail("avatars", "a.png", Bytes::from("thumb"))
        .await
        .unwrap();

    repo.delete_thumbnail("avatars", "a.png").await.unwrap();

    assert!(store.exists("avatars/a.png").await.unwrap());
    assert!(!store.exists("avatars/thumb_a.png").await.unwrap());
}

#[tokio::test]
async fn test_visibility_does_not_affect_local_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path(), "/storage").unwrap();

    store
        .put("k1", Bytes::from("a"), Visibility::Public)
        .await
        .unwrap();
    store
        .put("k2", Bytes::from("b"), Visibility::Private)
        .await
        .unwrap();

    assert!(store.exists("k1").await.unwrap());
    assert!(store.exists("k2").await.unwrap());
}
