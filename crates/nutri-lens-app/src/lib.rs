#![warn(missing_docs)]
//! # nutri-lens-app
//!
//! ## Purpose
//! Orchestrates camera, photo, upload, and view state for `nutri-lens`.
//!
//! ## Responsibilities
//! - Drive the live/review/uploading flow through [`CaptureController`].
//! - Map camera failures to the single user-visible access banner.
//! - Resolve analysis attempts into navigation or a failure banner.
//! - Provide kill-switch, redaction, and runtime status helpers for shells.
//!
//! ## Data flow
//! Camera session frames -> photo encoding -> review -> upload verdict ->
//! navigation or banner, with the view state projected for rendering.
//!
//! ## Ownership and lifetimes
//! The controller owns both the camera session and the view state, so every
//! stage transition and its side effects happen behind one `&mut self`.
//!
//! ## Error model
//! Subsystem failures are wrapped in [`AppError`]. Only two categories reach
//! the user: the camera-access banner and the analysis-failure banner.
//! Everything else (focus, preview, import decode) is returned for logging.
//!
//! ## Security and privacy notes
//! - Kill-switch env var can disable camera startup at runtime.
//! - Encoded photos are logged only as fingerprints via redaction helpers.

use std::sync::Arc;

use nutri_lens_analysis_contract::ScanVerdict;
use nutri_lens_camera::{
    CameraBackend, CameraError, CameraSession, FocusOutcome, FocusTap, StreamStartReport,
};
use nutri_lens_core::CapturedPhoto;
use nutri_lens_photo::{PhotoError, encode_still, prepare_import};
use nutri_lens_ui::{ViewStage, ViewState};
use nutri_lens_upload::{UploadClient, UploadError, image_fingerprint};
use thiserror::Error;

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("NUTRI_LENS_VERSION");

/// Banner text shown whenever camera acquisition fails.
pub const CAMERA_ACCESS_ERROR: &str =
    "Could not access camera. Please ensure you have granted permissions.";

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Everything one clock tick produced, for shell rendering and logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Focus revert that fired on this tick, log-only.
    pub focus_revert: Option<FocusOutcome>,
    /// Fresh narrative status line while an upload is in flight.
    pub status_line: Option<String>,
}

/// Terminal outcome of one analysis attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisResolution {
    /// Leave this view for the results destination.
    Navigate {
        /// Destination delivered by the server.
        redirect_url: String,
        /// Whether this resolution tore the narrative down.
        narrative_cleared: bool,
    },
    /// Stay in review with the failure banner shown.
    Failed {
        /// Banner text, server-provided or generic.
        message: String,
        /// Whether this resolution tore the narrative down.
        narrative_cleared: bool,
    },
}

/// Owns the capture flow: camera session plus view state.
pub struct CaptureController {
    session: CameraSession,
    view: ViewState,
}

impl CaptureController {
    /// Creates a controller in the live stage with no stream attached.
    pub fn new(backend: Arc<dyn CameraBackend>) -> Self {
        Self {
            session: CameraSession::new(backend),
            view: ViewState::new(APP_VERSION),
        }
    }

    /// Read access to the rendered view state.
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Read access to the camera session (facing, stream liveness).
    pub fn session(&self) -> &CameraSession {
        &self.session
    }

    /// Starts the camera with the current facing preference.
    ///
    /// On success the error banner is cleared. On failure the banner shows
    /// [`CAMERA_ACCESS_ERROR`], the view stays live with no stream, and the
    /// error is returned for logging.
    ///
    /// # Errors
    /// Returns [`AppError::WrongStage`] outside the live stage and
    /// [`AppError::Camera`] when acquisition fails.
    pub fn start_camera(&mut self) -> Result<StreamStartReport, AppError> {
        self.require_stage(ViewStage::Live)?;
        self.acquire_stream(CameraSession::start)
    }

    /// Flips the facing preference and restarts the stream.
    ///
    /// The flipped preference is kept even when acquisition fails, so the
    /// next start attempt targets the camera the user asked for.
    ///
    /// # Errors
    /// Same as [`CaptureController::start_camera`].
    pub fn rotate_camera(&mut self) -> Result<StreamStartReport, AppError> {
        self.require_stage(ViewStage::Live)?;
        self.acquire_stream(CameraSession::rotate)
    }

    /// Grabs the current frame at native stream resolution and presents it,
    /// entering review. The stream keeps running hidden behind the photo.
    ///
    /// # Errors
    /// Returns [`AppError::WrongStage`] outside the live stage,
    /// [`AppError::Camera`] without a live stream, and [`AppError::Photo`]
    /// when encoding fails. None of these touch the banner.
    pub fn capture_photo(&mut self) -> Result<(), AppError> {
        self.require_stage(ViewStage::Live)?;

        let frame = self.session.grab_frame()?;
        let photo = encode_still(&frame)?;
        self.view.present_photo(photo);
        Ok(())
    }

    /// Prepares user-selected file bytes and presents them, entering review.
    ///
    /// # Errors
    /// Returns [`AppError::Photo`] when the bytes cannot be decoded. The
    /// failure is silent for the user: no banner, view stays live.
    pub fn import_photo(&mut self, file_bytes: &[u8]) -> Result<(), AppError> {
        self.require_stage(ViewStage::Live)?;

        let photo = prepare_import(file_bytes)?;
        self.view.present_photo(photo);
        Ok(())
    }

    /// Leaves review for the live preview, re-acquiring a stream only when
    /// none is active.
    ///
    /// Returns `Ok(Some(report))` when a stream was re-acquired, `Ok(None)`
    /// when the existing stream was still running.
    ///
    /// # Errors
    /// Returns [`AppError::Camera`] when re-acquisition fails; the view is
    /// already live at that point with the access banner shown.
    pub fn retake(&mut self) -> Result<Option<StreamStartReport>, AppError> {
        self.require_stage(ViewStage::Review)?;
        self.view.return_to_live();

        if self.session.has_active_stream() {
            return Ok(None);
        }
        self.acquire_stream(CameraSession::start).map(Some)
    }

    /// Forwards a tap-to-focus gesture to the session while live.
    ///
    /// Returns `None` outside the live stage or without a stream; the
    /// outcome inside the tap is log-only either way.
    pub fn tap_focus(&mut self, x: u32, y: u32, now_ms: u64) -> Option<FocusTap> {
        if self.view.stage != ViewStage::Live {
            return None;
        }
        self.session.tap_focus(x, y, now_ms)
    }

    /// Advances time-driven behavior: pending focus revert and the upload
    /// narrative.
    pub fn tick(&mut self, now_ms: u64) -> TickReport {
        TickReport {
            focus_revert: self.session.tick(now_ms),
            status_line: self.view.advance_narrative(now_ms),
        }
    }

    /// Starts one analysis attempt: review controls disabled, loader and
    /// narrative up, banner cleared. Returns the photo for transport.
    ///
    /// # Errors
    /// Returns [`AppError::WrongStage`] unless the view is in review with a
    /// presented photo.
    pub fn begin_analysis(&mut self, now_ms: u64) -> Result<CapturedPhoto, AppError> {
        if !self.view.can_analyze() {
            return Err(AppError::WrongStage {
                expected: ViewStage::Review,
                actual: self.view.stage,
            });
        }
        let Some(photo) = self.view.photo.clone() else {
            return Err(AppError::WrongStage {
                expected: ViewStage::Review,
                actual: self.view.stage,
            });
        };

        self.view.begin_upload(now_ms);
        Ok(photo)
    }

    /// Resolves one analysis attempt exactly once.
    ///
    /// A `Proceed` verdict clears the narrative and reports the navigation
    /// destination while the loader stays up. Everything else restores the
    /// review controls and shows the display message: the server's verdict
    /// message, or the upload error rendered as text.
    pub fn finish_analysis(
        &mut self,
        outcome: Result<ScanVerdict, UploadError>,
    ) -> AnalysisResolution {
        match outcome {
            Ok(ScanVerdict::Proceed { redirect_url }) => {
                let narrative_cleared = self.view.complete_upload();
                AnalysisResolution::Navigate {
                    redirect_url,
                    narrative_cleared,
                }
            }
            Ok(ScanVerdict::Rejected { message }) => {
                let narrative_cleared = self.view.finish_upload_failure(message.clone());
                AnalysisResolution::Failed {
                    message,
                    narrative_cleared,
                }
            }
            Err(error) => {
                let message = error.to_string();
                let narrative_cleared = self.view.finish_upload_failure(message.clone());
                AnalysisResolution::Failed {
                    message,
                    narrative_cleared,
                }
            }
        }
    }

    /// Runs one full analysis attempt synchronously through the client.
    ///
    /// # Errors
    /// Returns [`AppError::WrongStage`] from [`CaptureController::begin_analysis`];
    /// transport and contract failures resolve into the returned
    /// [`AnalysisResolution::Failed`] instead of erroring.
    pub fn analyze_photo(
        &mut self,
        client: &UploadClient,
        now_ms: u64,
    ) -> Result<AnalysisResolution, AppError> {
        let photo = self.begin_analysis(now_ms)?;
        let outcome = client.submit_photo(&photo);
        Ok(self.finish_analysis(outcome))
    }

    /// Releases the camera stream, the page-unload analog.
    pub fn shutdown(&mut self) {
        self.session.stop();
    }

    fn require_stage(&self, expected: ViewStage) -> Result<(), AppError> {
        if self.view.stage == expected {
            return Ok(());
        }
        Err(AppError::WrongStage {
            expected,
            actual: self.view.stage,
        })
    }

    fn acquire_stream(
        &mut self,
        acquire: fn(&mut CameraSession) -> Result<StreamStartReport, CameraError>,
    ) -> Result<StreamStartReport, AppError> {
        match acquire(&mut self.session) {
            Ok(report) => {
                self.view.clear_error_banner();
                Ok(report)
            }
            Err(error) => {
                self.view.set_error_banner(CAMERA_ACCESS_ERROR);
                Err(AppError::Camera(error))
            }
        }
    }
}

/// Consolidated runtime status snapshot for simple shell projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeStatus {
    /// App version string.
    pub version: String,
    /// Current view stage as human-readable string.
    pub stage: String,
    /// Current camera facing preference.
    pub camera_facing: String,
    /// Whether a live stream is attached.
    pub stream_active: bool,
    /// Whether the env kill-switch currently allows the camera.
    pub camera_enabled: bool,
    /// Log-safe fingerprint of the presented photo, if any.
    pub photo_fingerprint: Option<String>,
    /// Visible error banner text, if any.
    pub error_banner: Option<String>,
}

/// Projects controller state into a flat status snapshot.
pub fn project_runtime_status(view: &ViewState, session: &CameraSession) -> RuntimeStatus {
    RuntimeStatus {
        version: view.version.clone(),
        stage: format!("{:?}", view.stage),
        camera_facing: session.facing().to_string(),
        stream_active: session.has_active_stream(),
        camera_enabled: camera_enabled_from_env(),
        photo_fingerprint: view
            .photo
            .as_ref()
            .map(|photo| image_fingerprint(&photo.data_url.to_string())),
        error_banner: view.error_banner.clone(),
    }
}

/// Checks the runtime kill-switch env var.
///
/// Semantics:
/// - Unset => camera enabled.
/// - `0`, `false`, `off` (case-insensitive) => camera disabled.
/// - Any other value => camera enabled.
pub fn camera_enabled_from_env() -> bool {
    match std::env::var("NUTRI_LENS_CAMERA_ENABLED") {
        Ok(value) => {
            let normalized = value.trim().to_ascii_lowercase();
            !(normalized == "0" || normalized == "false" || normalized == "off")
        }
        Err(_) => true,
    }
}

/// Redacts encoded image payloads from log-safe output.
///
/// Everything from the first `data:` marker onward is replaced with a byte
/// count, so neither pixels nor base64 text ever reach a log line.
pub fn redact_image_data(input: &str) -> String {
    if let Some(position) = input.find("data:") {
        let prefix = &input[..position];
        let redacted_len = input.len() - position;
        return format!("{prefix}data:<redacted {redacted_len} bytes>");
    }
    input.to_string()
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Camera subsystem error.
    #[error("camera error: {0}")]
    Camera(#[from] CameraError),
    /// Photo preparation error.
    #[error("photo error: {0}")]
    Photo(#[from] PhotoError),
    /// Operation attempted in the wrong view stage.
    #[error("operation requires {expected:?} stage, current stage is {actual:?}")]
    WrongStage {
        /// Stage the operation is legal in.
        expected: ViewStage,
        /// Stage the view was actually in.
        actual: ViewStage,
    },
}
