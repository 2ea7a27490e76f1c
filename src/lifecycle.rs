//! The attachment lifecycle engine.
//!
//! One engine is constructed per record type, with that type's declared image
//! fields. The persistence layer calls [`LifecycleEngine::on_creating`] /
//! [`LifecycleEngine::on_updating`] before its durable write and
//! [`LifecycleEngine::on_deleted`] after removing the record, and applies the
//! returned [`FieldChange`]s itself. The engine keeps no state between
//! invocations; everything it needs is in the record snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::blob_store::BlobStoreError;
use crate::codec::{CodecError, ImageCodec};
use crate::filename;
use crate::model::{FieldChange, FieldValue, ImageField, RecordImages, ThumbnailBox, UploadedImage};
use crate::repository::AttachmentRepository;

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("Blob store error: {0}")]
    Store(#[from] BlobStoreError),
    #[error("Image codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("Attribute is not a declared image field: {0}")]
    UnknownField(String),
    #[error("Image field declared twice: {0}")]
    DuplicateField(String),
}

pub struct LifecycleEngine {
    fields: Vec<ImageField>,
    repo: AttachmentRepository,
    codec: Arc<dyn ImageCodec>,
}

impl std::fmt::Debug for LifecycleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleEngine")
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl LifecycleEngine {
    /// Build an engine for a record type from its declared image fields.
    /// Field declaration order is processing order. Duplicate attribute names
    /// are rejected here, at registration, not at first use.
    pub fn new(
        fields: Vec<ImageField>,
        repo: AttachmentRepository,
        codec: Arc<dyn ImageCodec>,
    ) -> Result<Self, AttachmentError> {
        let mut seen = std::collections::HashSet::new();
        for field in &fields {
            if !seen.insert(field.attribute.as_str()) {
                return Err(AttachmentError::DuplicateField(field.attribute.clone()));
            }
        }
        Ok(Self {
            fields,
            repo,
            codec,
        })
    }

    pub fn fields(&self) -> &[ImageField] {
        &self.fields
    }

    pub fn repository(&self) -> &AttachmentRepository {
        &self.repo
    }

    // ========================================================================
    // Lifecycle hooks
    // ========================================================================

    /// Pre-insert hook. Uploads every field holding a raw upload, then
    /// generates thumbnails for fields that declare one. Returns the field
    /// mutations the persistence layer must apply before the durable write.
    pub async fn on_creating(
        &self,
        record: &RecordImages,
    ) -> Result<Vec<FieldChange>, AttachmentError> {
        let (changes, stored) = self.upload_pass(record).await?;
        self.thumbnail_pass(&record.upload_dir, &stored).await?;
        Ok(changes)
    }

    /// Pre-update hook. Same upload step as creation; additionally deletes
    /// the previously persisted attachment of any field whose filename
    /// changed (including fields cleared to empty). Re-saving an unchanged
    /// filename leaves the live file untouched.
    ///
    /// Known limitation: old-file deletion is not reference-counted. If two
    /// fields or two records share an upload dir and a filename, replacing
    /// one reference deletes the blob out from under the other.
    pub async fn on_updating(
        &self,
        record: &RecordImages,
    ) -> Result<Vec<FieldChange>, AttachmentError> {
        let (changes, stored) = self.upload_pass(record).await?;

        for field in &self.fields {
            let old = match record.original(&field.attribute) {
                Some(old) => old,
                None => continue,
            };
            if stored.get(&field.attribute).map(String::as_str) != Some(old) {
                debug!(
                    attribute = field.attribute,
                    filename = old,
                    "deleting replaced attachment"
                );
                self.repo.delete_image(&record.upload_dir, old).await?;
            }
        }

        self.thumbnail_pass(&record.upload_dir, &stored).await?;
        Ok(changes)
    }

    /// Post-delete hook. Deletes every field's attachment, best-effort: the
    /// record is already gone, so failures are logged and swallowed.
    pub async fn on_deleted(&self, record: &RecordImages) {
        for field in &self.fields {
            let filename = match record.field(&field.attribute).as_stored() {
                Some(name) => name,
                None => continue,
            };
            if let Err(e) = self.repo.delete_image(&record.upload_dir, filename).await {
                warn!(
                    attribute = field.attribute,
                    filename,
                    error = %e,
                    "failed to delete attachment of removed record"
                );
            }
        }
    }

    // ========================================================================
    // Uploads and thumbnails
    // ========================================================================

    /// Store a single upload under a freshly generated filename and return
    /// that filename. No thumbnail, no old-file cleanup; for callers managing
    /// a field by hand outside the hook flow.
    pub async fn upload(
        &self,
        upload_dir: &str,
        upload: &UploadedImage,
    ) -> Result<String, AttachmentError> {
        let stored = filename::generate(&upload.original_name, &upload.extension);
        self.repo
            .store_image(upload_dir, &stored, upload.bytes.clone())
            .await?;
        debug!(
            original = upload.original_name,
            filename = stored,
            "uploaded image"
        );
        Ok(stored)
    }

    /// Resize the primary image into its `thumb_` sibling, overwriting any
    /// previous thumbnail. Returns false without touching the store when the
    /// primary does not exist.
    pub async fn generate_thumbnail(
        &self,
        upload_dir: &str,
        stored_filename: &str,
        size: ThumbnailBox,
    ) -> Result<bool, AttachmentError> {
        if !self.repo.image_exists(upload_dir, stored_filename).await? {
            return Ok(false);
        }

        let data = self.repo.read_image(upload_dir, stored_filename).await?;
        let thumb = self.codec.resize(&data, size.width, size.height, true)?;
        self.repo
            .store_thumbnail(upload_dir, stored_filename, thumb)
            .await?;
        Ok(true)
    }

    /// First pass: upload raw-upload fields in declaration order. Returns the
    /// mutations plus the effective stored filename per field, so the later
    /// passes always see final names.
    async fn upload_pass(
        &self,
        record: &RecordImages,
    ) -> Result<(Vec<FieldChange>, HashMap<String, String>), AttachmentError> {
        let mut changes = Vec::new();
        let mut stored = HashMap::new();

        for field in &self.fields {
            match record.field(&field.attribute) {
                FieldValue::Upload(upload) => {
                    let name = self.upload(&record.upload_dir, upload).await?;
                    changes.push(FieldChange {
                        attribute: field.attribute.clone(),
                        filename: Some(name.clone()),
                    });
                    stored.insert(field.attribute.clone(), name);
                }
                // Plain strings pass through untouched; re-running against a
                // value that is not a raw upload never re-uploads.
                FieldValue::Stored(name) => {
                    stored.insert(field.attribute.clone(), name.clone());
                }
                FieldValue::Empty => {}
            }
        }

        Ok((changes, stored))
    }

    /// Second pass: thumbnails for every field declaring a box, against the
    /// filenames the upload pass settled on.
    async fn thumbnail_pass(
        &self,
        upload_dir: &str,
        stored: &HashMap<String, String>,
    ) -> Result<(), AttachmentError> {
        for field in &self.fields {
            let size = match field.thumbnail {
                Some(size) => size,
                None => continue,
            };
            if let Some(name) = stored.get(&field.attribute) {
                self.generate_thumbnail(upload_dir, name, size).await?;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Record-keyed queries
    // ========================================================================

    fn declared(&self, attribute: &str) -> Result<&ImageField, AttachmentError> {
        self.fields
            .iter()
            .find(|f| f.attribute == attribute)
            .ok_or_else(|| AttachmentError::UnknownField(attribute.to_string()))
    }

    /// Stored filename currently held by a declared field. A pending upload
    /// has no stored attachment yet.
    fn stored_filename<'a>(
        &self,
        record: &'a RecordImages,
        attribute: &str,
    ) -> Result<Option<&'a str>, AttachmentError> {
        self.declared(attribute)?;
        Ok(record.field(attribute).as_stored())
    }

    pub async fn has_image(
        &self,
        record: &RecordImages,
        attribute: &str,
    ) -> Result<bool, AttachmentError> {
        match self.stored_filename(record, attribute)? {
            Some(name) => Ok(self.repo.image_exists(&record.upload_dir, name).await?),
            None => Ok(false),
        }
    }

    pub async fn has_thumbnail(
        &self,
        record: &RecordImages,
        attribute: &str,
    ) -> Result<bool, AttachmentError> {
        match self.stored_filename(record, attribute)? {
            Some(name) => Ok(self.repo.thumbnail_exists(&record.upload_dir, name).await?),
            None => Ok(false),
        }
    }

    pub async fn image_url(
        &self,
        record: &RecordImages,
        attribute: &str,
    ) -> Result<Option<String>, AttachmentError> {
        match self.stored_filename(record, attribute)? {
            Some(name) => Ok(self.repo.image_url(&record.upload_dir, name).await?),
            None => Ok(None),
        }
    }

    pub async fn image_path(
        &self,
        record: &RecordImages,
        attribute: &str,
    ) -> Result<Option<String>, AttachmentError> {
        match self.stored_filename(record, attribute)? {
            Some(name) => Ok(self.repo.image_path(&record.upload_dir, name).await?),
            None => Ok(None),
        }
    }

    pub async fn thumbnail_url(
        &self,
        record: &RecordImages,
        attribute: &str,
    ) -> Result<Option<String>, AttachmentError> {
        match self.stored_filename(record, attribute)? {
            Some(name) => Ok(self.repo.thumbnail_url(&record.upload_dir, name).await?),
            None => Ok(None),
        }
    }

    /// Delete a field's attachment (primary plus thumbnail). Success when
    /// nothing is stored.
    pub async fn delete_image(
        &self,
        record: &RecordImages,
        attribute: &str,
    ) -> Result<(), AttachmentError> {
        if let Some(name) = self.stored_filename(record, attribute)? {
            self.repo.delete_image(&record.upload_dir, name).await?;
        }
        Ok(())
    }

    /// Delete a field's thumbnail alone, leaving the primary in place.
    pub async fn delete_thumbnail(
        &self,
        record: &RecordImages,
        attribute: &str,
    ) -> Result<(), AttachmentError> {
        if let Some(name) = self.stored_filename(record, attribute)? {
            self.repo.delete_thumbnail(&record.upload_dir, name).await?;
        }
        Ok(())
    }
}
