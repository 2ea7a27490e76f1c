//! Key derivation and filename-keyed queries over the blob store.
//!
//! A record's attachment lives at `<upload_dir>/<filename>` with its optional
//! thumbnail at `<upload_dir>/thumb_<filename>`. Nothing here re-derives
//! filenames; callers hand in whatever the record field holds.

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::blob_store::{BlobStore, BlobStoreError, Visibility};
use crate::model::THUMB_PREFIX;

#[derive(Clone)]
pub struct AttachmentRepository {
    store: Arc<dyn BlobStore>,
}

impl AttachmentRepository {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    pub fn image_key(upload_dir: &str, filename: &str) -> String {
        format!("{upload_dir}/{filename}")
    }

    pub fn thumbnail_key(upload_dir: &str, filename: &str) -> String {
        format!("{upload_dir}/{THUMB_PREFIX}{filename}")
    }

    // ========================================================================
    // Existence
    // ========================================================================

    /// True only when the filename is non-empty and its blob is live.
    pub async fn image_exists(
        &self,
        upload_dir: &str,
        filename: &str,
    ) -> Result<bool, BlobStoreError> {
        if filename.is_empty() {
            return Ok(false);
        }
        self.store
            .exists(&Self::image_key(upload_dir, filename))
            .await
    }

    pub async fn thumbnail_exists(
        &self,
        upload_dir: &str,
        filename: &str,
    ) -> Result<bool, BlobStoreError> {
        if filename.is_empty() {
            return Ok(false);
        }
        self.store
            .exists(&Self::thumbnail_key(upload_dir, filename))
            .await
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Public URL of the primary image, or `None` when it does not exist.
    pub async fn image_url(
        &self,
        upload_dir: &str,
        filename: &str,
    ) -> Result<Option<String>, BlobStoreError> {
        if !self.image_exists(upload_dir, filename).await? {
            return Ok(None);
        }
        Ok(Some(self.store.url(&Self::image_key(upload_dir, filename))))
    }

    /// Backend-native path of the primary image, or `None` when it does not
    /// exist.
    pub async fn image_path(
        &self,
        upload_dir: &str,
        filename: &str,
    ) -> Result<Option<String>, BlobStoreError> {
        if !self.image_exists(upload_dir, filename).await? {
            return Ok(None);
        }
        Ok(Some(self.store.path(&Self::image_key(upload_dir, filename))))
    }

    pub async fn thumbnail_url(
        &self,
        upload_dir: &str,
        filename: &str,
    ) -> Result<Option<String>, BlobStoreError> {
        if !self.thumbnail_exists(upload_dir, filename).await? {
            return Ok(None);
        }
        Ok(Some(
            self.store.url(&Self::thumbnail_key(upload_dir, filename)),
        ))
    }

    // ========================================================================
    // Content
    // ========================================================================

    /// Raw bytes of the primary image.
    pub async fn read_image(
        &self,
        upload_dir: &str,
        filename: &str,
    ) -> Result<Bytes, BlobStoreError> {
        self.store.get(&Self::image_key(upload_dir, filename)).await
    }

    /// Write the primary image bytes, publicly readable.
    pub async fn store_image(
        &self,
        upload_dir: &str,
        filename: &str,
        data: Bytes,
    ) -> Result<(), BlobStoreError> {
        let key = Self::image_key(upload_dir, filename);
        debug!(key, bytes = data.len(), "storing image");
        self.store.put(&key, data, Visibility::Public).await
    }

    /// Write thumbnail bytes, overwriting any previous thumbnail.
    pub async fn store_thumbnail(
        &self,
        upload_dir: &str,
        filename: &str,
        data: Bytes,
    ) -> Result<(), BlobStoreError> {
        let key = Self::thumbnail_key(upload_dir, filename);
        debug!(key, bytes = data.len(), "storing thumbnail");
        self.store.put(&key, data, Visibility::Public).await
    }

    // ========================================================================
    // Deletion
    // ========================================================================

    /// Delete the primary image and its thumbnail. Success when the image
    /// does not exist.
    ///
    /// The thumbnail goes first: if the primary delete then fails, the
    /// attachment is still whole by the invariant that a thumbnail never
    /// outlives its primary.
    pub async fn delete_image(
        &self,
        upload_dir: &str,
        filename: &str,
    ) -> Result<(), BlobStoreError> {
        if !self.image_exists(upload_dir, filename).await? {
            return Ok(());
        }

        self.delete_thumbnail(upload_dir, filename).await?;

        let key = Self::image_key(upload_dir, filename);
        debug!(key, "deleting image");
        self.store.delete(&key).await
    }

    /// Delete the thumbnail alone. Success when absent.
    pub async fn delete_thumbnail(
        &self,
        upload_dir: &str,
        filename: &str,
    ) -> Result<(), BlobStoreError> {
        if !self.thumbnail_exists(upload_dir, filename).await? {
            return Ok(());
        }

        let key = Self::thumbnail_key(upload_dir, filename);
        debug!(key, "deleting thumbnail");
        self.store.delete(&key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_share_the_filename() {
        assert_eq!(
            AttachmentRepository::image_key("avatars", "a.png"),
            "avatars/a.png"
        );
        assert_eq!(
            AttachmentRepository::thumbnail_key("avatars", "a.png"),
            "avatars/thumb_a.png"
        );
    }
}
