#![warn(missing_docs)]
//! # nutri-lens-core
//!
//! ## Purpose
//! Defines the pure data model used across the `nutri-lens` workspace.
//!
//! ## Responsibilities
//! - Represent raw camera frames with validated RGBA geometry.
//! - Represent encoded photos as self-describing data URLs.
//! - Encode/decode captured-photo artifacts for staging and transport.
//!
//! ## Data flow
//! Camera code emits [`PhotoFrame`] objects. Photo preparation encodes a
//! frame (or imported file bytes) into a [`DataUrl`] and wraps it together
//! with its dimensions and origin into a [`CapturedPhoto`], which is what the
//! upload layer transmits.
//!
//! ## Ownership and lifetimes
//! Frames and photos own their backing buffers (`Vec<u8>`/`String`) to avoid
//! hidden borrow/lifetime coupling between pipeline stages.
//!
//! ## Error model
//! Validation failures (shape mismatch, malformed data URL, bad base64)
//! return [`CoreError`] variants with caller-actionable categorization.
//!
//! ## Security and privacy notes
//! This crate intentionally avoids logging pixel bytes or encoded payloads.
//! Data-URL payloads are treated as opaque values; log-safe identification
//! lives in the upload layer.
//!
//! ## Example
//! ```rust
//! use nutri_lens_core::{CapturedPhoto, DataUrl, PhotoSource, JPEG_MEDIA_TYPE};
//!
//! let data_url = DataUrl::new(JPEG_MEDIA_TYPE, "aGVsbG8=").expect("valid payload");
//! let photo = CapturedPhoto::new(data_url, 640, 480, PhotoSource::CameraStill);
//! assert_eq!(photo.data_url.to_string(), "data:image/jpeg;base64,aGVsbG8=");
//! ```

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Media type produced by every photo-encoding path in this workspace.
pub const JPEG_MEDIA_TYPE: &str = "image/jpeg";

/// Represents one raw frame grabbed from an active camera stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Raw RGBA pixel buffer (`width * height * 4` bytes).
    pub rgba: Vec<u8>,
}

impl PhotoFrame {
    /// Constructs a validated frame.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidFrameShape`] when the pixel buffer length
    /// is not exactly `width * height * 4`, and
    /// [`CoreError::InvalidFrameGeometry`] when the declared dimensions are
    /// zero or overflow the addressable buffer size.
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, CoreError> {
        let expected_len = required_rgba_len(width, height)?;
        if rgba.len() != expected_len {
            return Err(CoreError::InvalidFrameShape {
                expected: expected_len,
                actual: rgba.len(),
            });
        }

        Ok(Self {
            width,
            height,
            rgba,
        })
    }
}

/// Encoded image carried as a `data:` URL (media type plus base64 payload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataUrl {
    /// Declared media type, e.g. `image/jpeg`.
    pub media_type: String,
    /// Base64-encoded image bytes (standard alphabet, padded).
    pub base64_data: String,
}

impl DataUrl {
    /// Constructs a validated data URL from its two components.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidMediaType`] when the media type is blank
    /// and [`CoreError::Base64`] when the payload is not valid base64.
    pub fn new(
        media_type: impl Into<String>,
        base64_data: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let media_type = media_type.into();
        if media_type.trim().is_empty() {
            return Err(CoreError::InvalidMediaType);
        }

        let base64_data = base64_data.into();
        BASE64_STANDARD.decode(base64_data.as_bytes())?;

        Ok(Self {
            media_type,
            base64_data,
        })
    }

    /// Parses a full `data:<media-type>;base64,<payload>` string.
    ///
    /// # Errors
    /// Returns [`CoreError::MalformedDataUrl`] when the scheme or base64
    /// marker is missing, plus the component errors from [`DataUrl::new`].
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let body = raw
            .strip_prefix("data:")
            .ok_or_else(|| CoreError::MalformedDataUrl("missing data: scheme".to_string()))?;
        let (media_type, payload) = body.split_once(";base64,").ok_or_else(|| {
            CoreError::MalformedDataUrl("missing ;base64, marker".to_string())
        })?;

        Self::new(media_type, payload)
    }

    /// Decodes the base64 payload back into raw encoded-image bytes.
    ///
    /// # Errors
    /// Returns [`CoreError::Base64`] when the stored payload fails to decode.
    pub fn decode_bytes(&self) -> Result<Vec<u8>, CoreError> {
        Ok(BASE64_STANDARD.decode(self.base64_data.as_bytes())?)
    }
}

impl std::fmt::Display for DataUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "data:{};base64,{}", self.media_type, self.base64_data)
    }
}

impl TryFrom<String> for DataUrl {
    type Error = CoreError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<DataUrl> for String {
    fn from(value: DataUrl) -> Self {
        value.to_string()
    }
}

/// Origin of a captured photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoSource {
    /// Grabbed from the live camera stream.
    CameraStill,
    /// Imported from a user-selected file.
    FileImport,
}

/// Upload-ready photo produced by capture or import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedPhoto {
    /// Encoded image reference presented to the user and transmitted.
    pub data_url: DataUrl,
    /// Encoded image width in pixels.
    pub width: u32,
    /// Encoded image height in pixels.
    pub height: u32,
    /// Whether the photo came from the camera or a file import.
    pub source: PhotoSource,
}

impl CapturedPhoto {
    /// Wraps an encoded image and its presentation facts into one artifact.
    pub fn new(data_url: DataUrl, width: u32, height: u32, source: PhotoSource) -> Self {
        Self {
            data_url,
            width,
            height,
            source,
        }
    }

    /// Serializes the photo to compact JSON bytes for staging.
    ///
    /// # Errors
    /// Returns [`CoreError::Codec`] when JSON serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, CoreError> {
        serde_json::to_vec(self).map_err(CoreError::Codec)
    }

    /// Deserializes a staged photo from JSON bytes.
    ///
    /// # Errors
    /// Returns [`CoreError::Codec`] when JSON decoding fails.
    pub fn from_json_bytes(raw: &[u8]) -> Result<Self, CoreError> {
        serde_json::from_slice(raw).map_err(CoreError::Codec)
    }
}

/// Error type for core domain validation and codec failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Frame buffer shape does not match declared geometry.
    #[error("invalid frame shape: expected {expected} bytes, got {actual}")]
    InvalidFrameShape {
        /// Expected RGBA byte count.
        expected: usize,
        /// Actual RGBA byte count.
        actual: usize,
    },
    /// Frame dimensions are zero or overflow the buffer size.
    #[error("invalid frame geometry: {0}")]
    InvalidFrameGeometry(String),
    /// Media type cannot be blank.
    #[error("media type is empty")]
    InvalidMediaType,
    /// Data URL string is structurally invalid.
    #[error("malformed data url: {0}")]
    MalformedDataUrl(String),
    /// Base64 payload failed to decode.
    #[error("data url payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// JSON encoding/decoding error.
    #[error("photo codec failure: {0}")]
    Codec(#[from] serde_json::Error),
}

fn required_rgba_len(width: u32, height: u32) -> Result<usize, CoreError> {
    if width == 0 || height == 0 {
        return Err(CoreError::InvalidFrameGeometry(
            "frame dimensions must be non-zero".to_string(),
        ));
    }

    let pixels = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| CoreError::InvalidFrameGeometry("frame dimensions overflow".to_string()))?;

    pixels
        .checked_mul(4)
        .ok_or_else(|| CoreError::InvalidFrameGeometry("rgba length overflow".to_string()))
}
