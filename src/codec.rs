//! Image resizing behind a trait seam, so lifecycle logic can be tested
//! without real image crunching and a different codec can be swapped in.

use std::io::Cursor;

use bytes::Bytes;
use image::imageops::FilterType;
use image::ImageFormat;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
    #[error("Unrecognized image format")]
    UnsupportedFormat,
}

/// Opaque resize capability. Synchronous: resizing is CPU-bound and the
/// lifecycle engine never overlaps it with other work.
pub trait ImageCodec: Send + Sync {
    /// Resize to fit within `max_width` x `max_height`. With
    /// `preserve_aspect_ratio` the box is a maximum, not a forced size; the
    /// output keeps the source format.
    fn resize(
        &self,
        data: &Bytes,
        max_width: u32,
        max_height: u32,
        preserve_aspect_ratio: bool,
    ) -> Result<Bytes, CodecError>;
}

/// Production codec backed by the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageRsCodec;

impl ImageCodec for ImageRsCodec {
    fn resize(
        &self,
        data: &Bytes,
        max_width: u32,
        max_height: u32,
        preserve_aspect_ratio: bool,
    ) -> Result<Bytes, CodecError> {
        let format = image::guess_format(data).map_err(|_| CodecError::UnsupportedFormat)?;
        let img = image::load_from_memory_with_format(data, format)
            .map_err(|e| CodecError::Decode(e.to_string()))?;

        let resized = if preserve_aspect_ratio {
            img.resize(max_width, max_height, FilterType::Lanczos3)
        } else {
            img.resize_exact(max_width, max_height, FilterType::Lanczos3)
        };

        let mut out = Cursor::new(Vec::new());
        // JPEG cannot carry an alpha channel; flatten before re-encoding
        let resized = match format {
            ImageFormat::Jpeg => image::DynamicImage::ImageRgb8(resized.to_rgb8()),
            _ => resized,
        };
        resized
            .write_to(&mut out, format)
            .map_err(|e| CodecError::Encode(e.to_string()))?;

        Ok(Bytes::from(out.into_inner()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Bytes {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        Bytes::from(out.into_inner())
    }

    #[test]
    fn resize_preserves_aspect_ratio_within_box() {
        let codec = ImageRsCodec;
        let resized = codec.resize(&png_bytes(400, 200), 100, 100, true).unwrap();

        let thumb = image::load_from_memory(&resized).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (100, 50));
    }

    #[test]
    fn resize_exact_forces_dimensions() {
        let codec = ImageRsCodec;
        let resized = codec.resize(&png_bytes(400, 200), 100, 100, false).unwrap();

        let thumb = image::load_from_memory(&resized).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (100, 100));
    }

    #[test]
    fn output_keeps_source_format() {
        let codec = ImageRsCodec;
        let resized = codec.resize(&png_bytes(64, 64), 16, 16, true).unwrap();
        assert_eq!(image::guess_format(&resized).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn garbage_input_is_rejected() {
        let codec = ImageRsCodec;
        let err = codec
            .resize(&Bytes::from_static(b"not an image"), 10, 10, true)
            .unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnsupportedFormat | CodecError::Decode(_)
        ));
    }
}
