#![warn(missing_docs)]
//! # nutri-lens-analysis-contract
//!
//! ## Purpose
//! Defines the upload wire contract and client-side verdict interpretation.
//!
//! ## Responsibilities
//! - Shape the upload request body (`image_data`).
//! - Parse analysis response payloads (`success`, `redirect_url`, `error`).
//! - Reduce transport status plus response into one [`ScanVerdict`].
//!
//! ## Data flow
//! Encoded photo -> [`UploadRequest`] -> server -> raw JSON ->
//! [`parse_upload_response`] -> [`interpret_response`] -> controller
//! resolution (navigate or reject with a display message).
//!
//! ## Ownership and lifetimes
//! Parsed values are owned structs to avoid borrowing from transient network
//! buffers.
//!
//! ## Error model
//! Invalid JSON or contract-violating success responses return
//! [`AnalysisContractError`]. Server-reported rejection is not an error here;
//! it is a [`ScanVerdict::Rejected`] value carrying its display message.
//!
//! ## Security and privacy notes
//! This crate shapes and reads wire payloads only; it never logs the encoded
//! image carried inside a request.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Display message used when the server rejects without an explanation.
pub const GENERIC_FAILURE_MESSAGE: &str = "Analysis failed";

/// Request body submitted to the analysis endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRequest {
    /// Encoded photo as a full data-URL string.
    pub image_data: String,
}

impl UploadRequest {
    /// Wraps an encoded photo reference into the wire shape.
    pub fn new(image_data: impl Into<String>) -> Self {
        Self {
            image_data: image_data.into(),
        }
    }

    /// Serializes the request to compact JSON bytes.
    ///
    /// # Errors
    /// Returns [`AnalysisContractError::Decode`] when serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, AnalysisContractError> {
        serde_json::to_vec(self).map_err(AnalysisContractError::Decode)
    }
}

/// Parsed analysis response from the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Whether the server accepted and analyzed the photo.
    pub success: bool,
    /// Results destination, present on success.
    #[serde(default)]
    pub redirect_url: Option<String>,
    /// Human-readable rejection reason, present on failure.
    #[serde(default)]
    pub error: Option<String>,
}

/// Final outcome of one analysis attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanVerdict {
    /// Analysis succeeded; navigate to the results destination.
    Proceed {
        /// Destination delivered by the server.
        redirect_url: String,
    },
    /// Analysis was rejected; show the message and stay on review.
    Rejected {
        /// Display message, server-provided or the generic fallback.
        message: String,
    },
}

/// Parses raw JSON into a validated analysis response.
///
/// # Errors
/// Returns [`AnalysisContractError::Decode`] for invalid JSON or a missing
/// `success` field.
pub fn parse_upload_response(raw: &str) -> Result<UploadResponse, AnalysisContractError> {
    serde_json::from_str(raw).map_err(AnalysisContractError::Decode)
}

/// Reduces transport status plus parsed response into one verdict.
///
/// Navigation requires both an HTTP success status and `success: true`; any
/// other combination is a rejection whose display message is the server's
/// `error` when non-blank, else [`GENERIC_FAILURE_MESSAGE`].
///
/// # Errors
/// Returns [`AnalysisContractError::InvalidContract`] when a successful
/// response carries no usable `redirect_url`.
pub fn interpret_response(
    http_success: bool,
    response: &UploadResponse,
) -> Result<ScanVerdict, AnalysisContractError> {
    if http_success && response.success {
        let redirect_url = response
            .redirect_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                AnalysisContractError::InvalidContract(
                    "success response is missing redirect_url".to_string(),
                )
            })?;

        return Ok(ScanVerdict::Proceed {
            redirect_url: redirect_url.to_string(),
        });
    }

    let message = response
        .error
        .as_deref()
        .map(str::trim)
        .filter(|error| !error.is_empty())
        .unwrap_or(GENERIC_FAILURE_MESSAGE)
        .to_string();

    Ok(ScanVerdict::Rejected { message })
}

/// Analysis contract errors.
#[derive(Debug, Error)]
pub enum AnalysisContractError {
    /// JSON decode failure.
    #[error("analysis decode failure: {0}")]
    Decode(#[from] serde_json::Error),
    /// Parsed payload violates contract invariants.
    #[error("analysis contract violation: {0}")]
    InvalidContract(String),
}

#[cfg(test)]
mod tests {
    //! Unit tests for response parsing and verdict interpretation.

    use super::*;

    #[test]
    fn success_with_destination_proceeds() {
        let response = parse_upload_response(
            r#"{"success": true, "redirect_url": "/results/42"}"#,
        )
        .expect("response should parse");

        let verdict = interpret_response(true, &response).expect("verdict should resolve");
        assert_eq!(
            verdict,
            ScanVerdict::Proceed {
                redirect_url: "/results/42".to_string()
            }
        );
    }

    #[test]
    fn success_without_destination_violates_contract() {
        let response =
            parse_upload_response(r#"{"success": true}"#).expect("response should parse");
        assert!(matches!(
            interpret_response(true, &response),
            Err(AnalysisContractError::InvalidContract(_))
        ));
    }

    #[test]
    fn rejection_prefers_server_message_over_fallback() {
        let response = parse_upload_response(
            r#"{"success": false, "error": "Could not identify product"}"#,
        )
        .expect("response should parse");
        let verdict = interpret_response(true, &response).expect("verdict should resolve");
        assert_eq!(
            verdict,
            ScanVerdict::Rejected {
                message: "Could not identify product".to_string()
            }
        );

        let blank = parse_upload_response(r#"{"success": false, "error": "  "}"#)
            .expect("response should parse");
        let verdict = interpret_response(true, &blank).expect("verdict should resolve");
        assert_eq!(
            verdict,
            ScanVerdict::Rejected {
                message: GENERIC_FAILURE_MESSAGE.to_string()
            }
        );
    }

    #[test]
    fn http_failure_rejects_even_when_body_claims_success() {
        let response = parse_upload_response(
            r#"{"success": true, "redirect_url": "/results/7"}"#,
        )
        .expect("response should parse");
        let verdict = interpret_response(false, &response).expect("verdict should resolve");
        assert!(matches!(verdict, ScanVerdict::Rejected { .. }));
    }
}
