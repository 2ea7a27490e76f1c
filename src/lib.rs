//! imageable - Image attachment lifecycle management for persistent records
//!
//! This crate keeps uploaded images and their derived thumbnails in sync with
//! the lifecycle of the records that own them:
//! - Swappable blob storage backends (local filesystem, GCS)
//! - Collision-resistant stored filenames (`<slug>-<random>.<ext>`)
//! - Aspect-preserving thumbnail generation, addressed by a `thumb_` prefix
//! - Create/update/delete hooks that never orphan a file or leak a stale one
//!
//! The persistence layer stays external: a record type declares its image
//! fields, holds a [`LifecycleEngine`], calls the hooks around its own durable
//! writes, and applies the returned field mutations.
//!
//! ```no_run
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use imageable::{
//!     AttachmentRepository, FieldValue, ImageField, ImageRsCodec, LifecycleEngine, LocalStore,
//!     RecordImages, UploadedImage,
//! };
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(LocalStore::new("./storage", "/storage")?);
//! let engine = LifecycleEngine::new(
//!     vec![ImageField::with_thumbnail("avatar", 150, 150)],
//!     AttachmentRepository::new(store),
//!     Arc::new(ImageRsCodec),
//! )?;
//!
//! let record = RecordImages::new("users").with_field(
//!     "avatar",
//!     FieldValue::Upload(UploadedImage::new("Me.png", "png", Bytes::from_static(b"..."))),
//! );
//! let changes = engine.on_creating(&record).await?;
//! // apply `changes` to the record, then persist it
//! # Ok(())
//! # }
//! ```

pub mod blob_store;
pub mod codec;
pub mod config;
pub mod filename;
pub mod lifecycle;
pub mod model;
pub mod repository;

pub use blob_store::{BlobStore, BlobStoreError, GcsStore, LocalStore, Visibility};
pub use codec::{CodecError, ImageCodec, ImageRsCodec};
pub use config::{StorageBackend, StorageConfig};
pub use lifecycle::{AttachmentError, LifecycleEngine};
pub use model::{
    FieldChange, FieldValue, ImageField, RecordImages, ThumbnailBox, UploadedImage, THUMB_PREFIX,
};
pub use repository::AttachmentRepository;
