use std::collections::HashMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Key prefix distinguishing a thumbnail blob from its primary image.
pub const THUMB_PREFIX: &str = "thumb_";

/// A raw uploaded file as handed over by whatever extracted it from the
/// request: client-supplied name, extension, and the bytes themselves.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub original_name: String,
    pub extension: String,
    pub bytes: Bytes,
}

impl UploadedImage {
    pub fn new(original_name: impl Into<String>, extension: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            original_name: original_name.into(),
            extension: extension.into(),
            bytes,
        }
    }

    /// MIME type guessed from the extension (the content is not sniffed).
    pub fn content_type(&self) -> String {
        mime_guess::from_ext(&self.extension)
            .first_or_octet_stream()
            .to_string()
    }
}

/// Current value of an image-bearing field on a record.
#[derive(Debug, Clone, Default)]
pub enum FieldValue {
    /// No attachment (null or empty string).
    #[default]
    Empty,
    /// A stored filename (or pre-set plain string, passed through untouched).
    Stored(String),
    /// A raw upload awaiting persistence.
    Upload(UploadedImage),
}

impl FieldValue {
    /// Normalize a persisted string value: empty becomes `Empty`.
    pub fn from_stored(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            FieldValue::Empty
        } else {
            FieldValue::Stored(value)
        }
    }

    /// The stored filename, if this field currently holds one.
    pub fn as_stored(&self) -> Option<&str> {
        match self {
            FieldValue::Stored(name) => Some(name),
            _ => None,
        }
    }
}

/// Maximum bounding box for a generated thumbnail. The image is scaled to
/// fit inside it with aspect ratio preserved, so the result may be smaller
/// in one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailBox {
    pub width: u32,
    pub height: u32,
}

impl ThumbnailBox {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for ThumbnailBox {
    fn default() -> Self {
        Self {
            width: 150,
            height: 150,
        }
    }
}

/// Declaration of one image-bearing field on a record type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageField {
    pub attribute: String,
    #[serde(default)]
    pub thumbnail: Option<ThumbnailBox>,
}

impl ImageField {
    /// A plain image field with no derived thumbnail.
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            thumbnail: None,
        }
    }

    /// An image field with a thumbnail bounded by `width` x `height`.
    pub fn with_thumbnail(attribute: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            attribute: attribute.into(),
            thumbnail: Some(ThumbnailBox::new(width, height)),
        }
    }
}

/// Snapshot of one record instance's image fields, as seen by the lifecycle
/// hooks. `original` holds the previously persisted filenames and is only
/// consulted by the update path.
#[derive(Debug, Clone, Default)]
pub struct RecordImages {
    pub upload_dir: String,
    current: HashMap<String, FieldValue>,
    original: HashMap<String, String>,
}

impl RecordImages {
    pub fn new(upload_dir: impl Into<String>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            current: HashMap::new(),
            original: HashMap::new(),
        }
    }

    /// Set a field's current value.
    pub fn with_field(mut self, attribute: impl Into<String>, value: FieldValue) -> Self {
        self.current.insert(attribute.into(), value);
        self
    }

    /// Record the previously persisted filename for a field (update path).
    pub fn with_original(mut self, attribute: impl Into<String>, filename: impl Into<String>) -> Self {
        let filename = filename.into();
        if !filename.is_empty() {
            self.original.insert(attribute.into(), filename);
        }
        self
    }

    /// Current value of a field; unset fields read as `Empty`.
    pub fn field(&self, attribute: &str) -> &FieldValue {
        static EMPTY: FieldValue = FieldValue::Empty;
        self.current.get(attribute).unwrap_or(&EMPTY)
    }

    /// Previously persisted filename for a field, if any.
    pub fn original(&self, attribute: &str) -> Option<&str> {
        self.original.get(attribute).map(String::as_str)
    }
}

/// A field mutation produced by a lifecycle hook. The persistence layer
/// applies these to the record before the durable write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub attribute: String,
    /// New stored filename, or `None` when the field was cleared.
    pub filename: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_normalizes_to_empty() {
        assert!(matches!(FieldValue::from_stored(""), FieldValue::Empty));
        assert!(matches!(
            FieldValue::from_stored("a.png"),
            FieldValue::Stored(_)
        ));
    }

    #[test]
    fn content_type_from_extension() {
        let upload = UploadedImage::new("a.png", "png", Bytes::new());
        assert_eq!(upload.content_type(), "image/png");

        let unknown = UploadedImage::new("a.zzz", "zzz", Bytes::new());
        assert_eq!(unknown.content_type(), "application/octet-stream");
    }

    #[test]
    fn unset_fields_read_as_empty() {
        let record = RecordImages::new("avatars");
        assert!(matches!(record.field("missing"), FieldValue::Empty));
        assert!(record.original("missing").is_none());
    }
}
