mod gcs;
mod local;

pub use gcs::GcsStore;
pub use local::LocalStore;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Blob not found: {0}")]
    NotFound(String),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Access level requested when writing a blob.
/// Backends without per-object ACLs may ignore this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// Abstraction over blob storage backends.
/// Keys are path-like (`<upload_dir>/<filename>`); backends must tolerate
/// slashes in keys.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, data: Bytes, visibility: Visibility)
        -> Result<(), BlobStoreError>;
    async fn get(&self, key: &str) -> Result<Bytes, BlobStoreError>;
    /// Deleting an absent key is success.
    async fn delete(&self, key: &str) -> Result<(), BlobStoreError>;
    async fn exists(&self, key: &str) -> Result<bool, BlobStoreError>;
    /// Publicly servable URL for a key. Pure resolution, no existence check.
    fn url(&self, key: &str) -> String;
    /// Backend-native path for a key (filesystem path, `gs://` URI, ...).
    fn path(&self, key: &str) -> String;
}
