#![warn(missing_docs)]
//! # nutri-lens-upload
//!
//! ## Purpose
//! Submits encoded photos to the analysis endpoint and resolves the verdict.
//!
//! ## Responsibilities
//! - Validate upload endpoint policy (`/api/upload`, HTTPS).
//! - Execute one upload attempt through an injectable transport abstraction.
//! - Provide log-safe payload fingerprints for traceability.
//!
//! ## Data flow
//! [`nutri_lens_core::CapturedPhoto`] -> request body ->
//! [`UploadTransport::send`] -> raw reply -> contract interpretation ->
//! [`nutri_lens_analysis_contract::ScanVerdict`] for the controller.
//!
//! ## Ownership and lifetimes
//! The client owns its endpoint string and shares the transport behind an
//! `Arc`, so worker threads can hold a cheap clone.
//!
//! ## Error model
//! Endpoint policy violations, transport failures, and contract violations
//! surface as [`UploadError`]. A server-side rejection is not an error; it
//! arrives as `ScanVerdict::Rejected` with its display message. Each attempt
//! is final: there is no retry policy, the user decides whether to try again.
//!
//! ## Security and privacy notes
//! Encoded image payloads are never logged by this crate; callers log the
//! [`image_fingerprint`] instead.

use std::sync::Arc;

use nutri_lens_analysis_contract::{
    AnalysisContractError, ScanVerdict, UploadRequest, interpret_response, parse_upload_response,
};
use nutri_lens_core::CapturedPhoto;
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

/// Required upload path suffix for v1.
pub const UPLOAD_PATH_SUFFIX: &str = "/api/upload";

/// Length of the hex fingerprint used in logs.
const FINGERPRINT_HEX_LEN: usize = 16;

/// Raw reply delivered by an upload transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportReply {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl TransportReply {
    /// Returns `true` for 2xx status codes.
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

/// Abstract transport used by the upload client.
pub trait UploadTransport: Send + Sync {
    /// Sends one JSON request body to the endpoint.
    ///
    /// # Errors
    /// Returns [`UploadError::Transport`] when the request never produced an
    /// HTTP reply (network failure, timeout).
    fn send(&self, endpoint: &str, body_json: &[u8]) -> Result<TransportReply, UploadError>;
}

/// Upload client that validates endpoint policy and executes one attempt.
#[derive(Clone)]
pub struct UploadClient {
    endpoint: String,
    transport: Arc<dyn UploadTransport>,
}

impl UploadClient {
    /// Creates a validated upload client.
    ///
    /// # Errors
    /// Returns [`UploadError::InvalidEndpoint`] when the URL is not HTTPS or
    /// does not include the required `/api/upload` path.
    pub fn new(
        endpoint: impl Into<String>,
        transport: Arc<dyn UploadTransport>,
    ) -> Result<Self, UploadError> {
        let endpoint = endpoint.into();
        validate_upload_endpoint(&endpoint)?;
        Ok(Self {
            endpoint,
            transport,
        })
    }

    /// Submits one photo and resolves the server's verdict.
    ///
    /// # Errors
    /// Returns [`UploadError::Transport`] when no reply was produced and
    /// [`UploadError::Contract`] when the reply body cannot be interpreted.
    pub fn submit_photo(&self, photo: &CapturedPhoto) -> Result<ScanVerdict, UploadError> {
        let request = UploadRequest::new(photo.data_url.to_string());
        let body = request.to_json_bytes()?;

        let reply = self.transport.send(&self.endpoint, &body)?;
        let response = parse_upload_response(&reply.body)?;
        Ok(interpret_response(reply.is_success(), &response)?)
    }

    /// Returns the configured upload endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Validates v1 upload endpoint constraints.
///
/// # Errors
/// Returns [`UploadError::InvalidEndpoint`] for non-HTTPS or path mismatch.
pub fn validate_upload_endpoint(endpoint: &str) -> Result<(), UploadError> {
    let parsed = Url::parse(endpoint)
        .map_err(|error| UploadError::InvalidEndpoint(format!("invalid upload url: {error}")))?;

    if parsed.scheme() != "https" {
        return Err(UploadError::InvalidEndpoint(
            "upload endpoint must use https".to_string(),
        ));
    }

    if !parsed.path().ends_with(UPLOAD_PATH_SUFFIX) {
        return Err(UploadError::InvalidEndpoint(format!(
            "upload endpoint path must end with {UPLOAD_PATH_SUFFIX}"
        )));
    }

    Ok(())
}

/// Computes a short hex fingerprint of an encoded image reference.
///
/// The fingerprint identifies a payload in logs without reproducing any of
/// its content.
pub fn image_fingerprint(image_data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(image_data.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..FINGERPRINT_HEX_LEN].to_string()
}

/// Errors produced by upload client logic.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Endpoint violates security or contract requirements.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// Transport failure before any HTTP reply existed.
    #[error("upload transport failure: {0}")]
    Transport(String),
    /// Reply violated the analysis contract.
    #[error("upload contract failure: {0}")]
    Contract(#[from] AnalysisContractError),
}

#[cfg(test)]
mod tests {
    //! Unit tests for endpoint policy and verdict resolution.

    use nutri_lens_core::{DataUrl, JPEG_MEDIA_TYPE, PhotoSource};

    use super::*;

    struct CannedTransport {
        status: u16,
        body: String,
    }

    impl UploadTransport for CannedTransport {
        fn send(&self, _endpoint: &str, _body_json: &[u8]) -> Result<TransportReply, UploadError> {
            Ok(TransportReply {
                status: self.status,
                body: self.body.clone(),
            })
        }
    }

    fn sample_photo() -> CapturedPhoto {
        let data_url = DataUrl::new(JPEG_MEDIA_TYPE, "aGVsbG8=").expect("valid payload");
        CapturedPhoto::new(data_url, 4, 4, PhotoSource::CameraStill)
    }

    #[test]
    fn validates_expected_endpoint_policy() {
        validate_upload_endpoint("https://example.test/api/upload").expect("endpoint should pass");
        assert!(validate_upload_endpoint("http://example.test/api/upload").is_err());
        assert!(validate_upload_endpoint("https://example.test/api/other").is_err());
    }

    #[test]
    fn submit_resolves_success_reply_to_proceed() {
        let transport = Arc::new(CannedTransport {
            status: 200,
            body: r#"{"success": true, "redirect_url": "/results/9"}"#.to_string(),
        });
        let client =
            UploadClient::new("https://example.test/api/upload", transport).expect("valid client");

        let verdict = client
            .submit_photo(&sample_photo())
            .expect("submit should resolve");
        assert_eq!(
            verdict,
            ScanVerdict::Proceed {
                redirect_url: "/results/9".to_string()
            }
        );
    }

    #[test]
    fn submit_resolves_server_rejection_to_message() {
        let transport = Arc::new(CannedTransport {
            status: 422,
            body: r#"{"success": false, "error": "Could not identify product"}"#.to_string(),
        });
        let client =
            UploadClient::new("https://example.test/api/upload", transport).expect("valid client");

        let verdict = client
            .submit_photo(&sample_photo())
            .expect("submit should resolve");
        assert_eq!(
            verdict,
            ScanVerdict::Rejected {
                message: "Could not identify product".to_string()
            }
        );
    }

    #[test]
    fn submit_reports_unparsable_reply_as_contract_failure() {
        let transport = Arc::new(CannedTransport {
            status: 200,
            body: "<html>gateway error</html>".to_string(),
        });
        let client =
            UploadClient::new("https://example.test/api/upload", transport).expect("valid client");

        let error = client
            .submit_photo(&sample_photo())
            .expect_err("submit should fail");
        assert!(matches!(error, UploadError::Contract(_)));
    }

    #[test]
    fn fingerprint_is_short_and_stable() {
        let first = image_fingerprint("data:image/jpeg;base64,aGVsbG8=");
        let second = image_fingerprint("data:image/jpeg;base64,aGVsbG8=");
        let other = image_fingerprint("data:image/jpeg;base64,b3RoZXI=");

        assert_eq!(first, second);
        assert_eq!(first.len(), 16);
        assert_ne!(first, other);
    }
}
