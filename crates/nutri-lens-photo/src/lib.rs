#![warn(missing_docs)]
//! # nutri-lens-photo
//!
//! ## Purpose
//! Turns raw camera frames and imported files into upload-ready photos.
//!
//! ## Responsibilities
//! - Encode live-stream frames as full-resolution JPEG data URLs.
//! - Decode imported files, bound them to the import size limit with
//!   aspect-ratio-preserving downscale, and re-encode at import quality.
//! - Provide the pure fit-within geometry used by the downscale.
//!
//! ## Data flow
//! [`nutri_lens_core::PhotoFrame`] or raw file bytes -> encode/prepare ->
//! [`nutri_lens_core::CapturedPhoto`] consumed by review and upload.
//!
//! ## Ownership and lifetimes
//! Outputs own their encoded buffers, so review and upload hold the photo
//! without borrowing camera or file memory.
//!
//! ## Error model
//! Undecodable imports and encoder failures fail with [`PhotoError`].
//! Callers decide visibility; import decode failures are log-only there.
//!
//! ## Security and privacy notes
//! Encoded payloads are returned to the caller and never written to disk or
//! logged by this crate.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use image::GenericImageView;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use nutri_lens_core::{CapturedPhoto, DataUrl, JPEG_MEDIA_TYPE, PhotoFrame, PhotoSource};
use thiserror::Error;

/// JPEG quality for stills grabbed from the live stream.
pub const STILL_JPEG_QUALITY: u8 = 92;
/// JPEG quality for re-encoded file imports.
pub const IMPORT_JPEG_QUALITY: u8 = 80;
/// Upper bound applied to either dimension of an imported image.
pub const IMPORT_MAX_DIMENSION: u32 = 1_024;

/// Encodes one live-stream frame as a still photo at native resolution.
///
/// # Errors
/// Returns [`PhotoError::Encode`] when JPEG encoding fails.
pub fn encode_still(frame: &PhotoFrame) -> Result<CapturedPhoto, PhotoError> {
    let pixels = (frame.width as usize) * (frame.height as usize);
    let mut rgb = Vec::with_capacity(pixels * 3);
    for chunk in frame.rgba.chunks_exact(4) {
        rgb.extend_from_slice(&chunk[..3]);
    }

    let data_url = encode_jpeg_data_url(&rgb, frame.width, frame.height, STILL_JPEG_QUALITY)?;
    Ok(CapturedPhoto::new(
        data_url,
        frame.width,
        frame.height,
        PhotoSource::CameraStill,
    ))
}

/// Prepares a user-imported file for review and upload.
///
/// Images whose larger dimension exceeds [`IMPORT_MAX_DIMENSION`] are
/// downscaled proportionally so that dimension lands exactly on the bound.
/// The result is re-encoded at [`IMPORT_JPEG_QUALITY`] even when no resize
/// happened, so every import leaves as a JPEG of predictable weight.
///
/// # Errors
/// Returns [`PhotoError::Decode`] when the bytes are not a decodable image
/// and [`PhotoError::Encode`] when re-encoding fails.
pub fn prepare_import(file_bytes: &[u8]) -> Result<CapturedPhoto, PhotoError> {
    let decoded = image::load_from_memory(file_bytes)?;
    let (width, height) = decoded.dimensions();
    let (target_width, target_height) = fit_within(width, height, IMPORT_MAX_DIMENSION);

    let sized = if (target_width, target_height) == (width, height) {
        decoded
    } else {
        decoded.resize_exact(target_width, target_height, FilterType::Triangle)
    };

    let rgb = sized.to_rgb8();
    let data_url = encode_jpeg_data_url(
        rgb.as_raw(),
        target_width,
        target_height,
        IMPORT_JPEG_QUALITY,
    )?;
    Ok(CapturedPhoto::new(
        data_url,
        target_width,
        target_height,
        PhotoSource::FileImport,
    ))
}

/// Scales `(width, height)` down so neither side exceeds `max_dimension`,
/// preserving aspect ratio. In-bounds inputs are returned unchanged. The
/// larger dimension lands exactly on the bound; the other is rounded to the
/// nearest pixel, floored at one.
pub fn fit_within(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if max_dimension == 0 || (width <= max_dimension && height <= max_dimension) {
        return (width, height);
    }

    if width > height {
        (max_dimension, scale_minor(height, width, max_dimension))
    } else {
        (scale_minor(width, height, max_dimension), max_dimension)
    }
}

fn scale_minor(minor: u32, major: u32, max_dimension: u32) -> u32 {
    let scaled =
        ((minor as u64) * (max_dimension as u64) + (major as u64) / 2) / (major as u64);
    scaled.max(1) as u32
}

fn encode_jpeg_data_url(
    rgb: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<DataUrl, PhotoError> {
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality)
        .encode(rgb, width, height, image::ColorType::Rgb8.into())
        .map_err(|error| PhotoError::Encode(error.to_string()))?;

    let payload = BASE64_STANDARD.encode(&jpeg);
    Ok(DataUrl::new(JPEG_MEDIA_TYPE, payload)?)
}

/// Error type for photo preparation.
#[derive(Debug, Error)]
pub enum PhotoError {
    /// Imported bytes are not a decodable image.
    #[error("image decode failure: {0}")]
    Decode(#[from] image::ImageError),
    /// JPEG encoding failed.
    #[error("jpeg encode failure: {0}")]
    Encode(String),
    /// Core validation rejected the encoded artifact.
    #[error("photo artifact invalid: {0}")]
    Core(#[from] nutri_lens_core::CoreError),
}

#[cfg(test)]
mod tests {
    //! Unit tests for encode and fit-within behavior.

    use std::io::Cursor;

    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let buffer = image::RgbImage::from_pixel(width, height, image::Rgb([120, 30, 200]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(buffer)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("png encode should work");
        bytes
    }

    #[test]
    fn fit_within_bounds_only_oversized_inputs() {
        assert_eq!(fit_within(800, 600, 1_024), (800, 600));
        assert_eq!(fit_within(1_024, 1_024, 1_024), (1_024, 1_024));
        assert_eq!(fit_within(2_048, 1_024, 1_024), (1_024, 512));
        assert_eq!(fit_within(1_024, 2_048, 1_024), (512, 1_024));
        assert_eq!(fit_within(3_000, 3_000, 1_024), (1_024, 1_024));
        assert_eq!(fit_within(5_000, 1, 1_024), (1_024, 1));
    }

    #[test]
    fn encode_still_keeps_native_resolution() {
        let frame = PhotoFrame::new(8, 6, vec![200; 8 * 6 * 4]).expect("frame should be valid");
        let photo = encode_still(&frame).expect("encode should work");

        assert_eq!(photo.width, 8);
        assert_eq!(photo.height, 6);
        assert_eq!(photo.source, PhotoSource::CameraStill);
        assert_eq!(photo.data_url.media_type, JPEG_MEDIA_TYPE);

        let jpeg = photo.data_url.decode_bytes().expect("payload should decode");
        let reloaded = image::load_from_memory(&jpeg).expect("jpeg should decode");
        assert_eq!(reloaded.dimensions(), (8, 6));
    }

    #[test]
    fn prepare_import_downscales_oversized_images() {
        let photo = prepare_import(&png_bytes(2_048, 1_024)).expect("import should work");
        assert_eq!((photo.width, photo.height), (1_024, 512));
        assert_eq!(photo.source, PhotoSource::FileImport);
        assert_eq!(photo.data_url.media_type, JPEG_MEDIA_TYPE);
    }

    #[test]
    fn prepare_import_reencodes_in_bounds_images_unchanged() {
        let photo = prepare_import(&png_bytes(100, 50)).expect("import should work");
        assert_eq!((photo.width, photo.height), (100, 50));
        assert_eq!(photo.data_url.media_type, JPEG_MEDIA_TYPE);
    }

    #[test]
    fn prepare_import_rejects_undecodable_bytes() {
        let error = prepare_import(b"not an image").expect_err("import should fail");
        assert!(matches!(error, PhotoError::Decode(_)));
    }
}
