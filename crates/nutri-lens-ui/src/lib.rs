#![warn(missing_docs)]
//! # nutri-lens-ui
//!
//! ## Purpose
//! Defines the view state model for the capture flow.
//!
//! ## Responsibilities
//! - Represent the three view stages (live, review, uploading) explicitly.
//! - Project each stage into its visible/enabled control set.
//! - Own the presented photo, the inline error banner, and the upload
//!   progress narrative with its exactly-once teardown.
//!
//! ## Data flow
//! Controller events mutate [`ViewState`]; shells render the projected
//! [`ControlSet`] plus [`ViewState::status_line`] each frame.
//!
//! ## Ownership and lifetimes
//! `ViewState` owns all photo/string values to simplify event reducers and
//! minimize cross-thread borrowing complexity.
//!
//! ## Error model
//! This crate favors explicit state over recoverable errors. Invalid
//! combinations are prevented by guard methods and by the stage projection.
//!
//! ## Security and privacy notes
//! View state holds the encoded photo for presentation but never renders it
//! into status text or the error banner.

use nutri_lens_core::CapturedPhoto;

/// Status messages cycled while an upload is in flight. Purely cosmetic;
/// progression is time-based, not tied to actual backend stages.
pub const SCAN_STATUS_MESSAGES: [&str; 4] = [
    "Scanning image",
    "Identifying product",
    "Checking ingredients",
    "Generating audio",
];

/// Wall-clock interval between narrative steps.
pub const STATUS_TICK_INTERVAL_MS: u64 = 500;

/// Steps shown per message before advancing to the next one.
pub const TICKS_PER_MESSAGE: u32 = 7;

/// The three mutually exclusive view stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStage {
    /// Camera preview with capture controls.
    Live,
    /// Still photo with analyze/retake controls.
    Review,
    /// Upload in flight; review controls shown but disabled.
    Uploading,
}

/// Per-stage projection of which controls are visible and usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlSet {
    /// Capture, rotate, import, and tap-to-focus surface.
    pub live_controls_visible: bool,
    /// Analyze and retake buttons plus the presented photo.
    pub review_controls_visible: bool,
    /// Whether analyze/retake accept input.
    pub review_controls_enabled: bool,
    /// Full-screen loading overlay.
    pub loader_visible: bool,
    /// Animated upload progress bar.
    pub progress_bar_animating: bool,
}

/// Time-driven status narrative shown while an upload is in flight.
///
/// Every step appends one trailing dot (wrapping after three) and every
/// [`TICKS_PER_MESSAGE`] steps the message advances, clamping at the last
/// entry of [`SCAN_STATUS_MESSAGES`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressNarrative {
    started_at_ms: u64,
    steps_applied: u64,
    ticks_in_message: u32,
    message_index: usize,
    dot_count: u8,
}

impl ProgressNarrative {
    /// Starts the narrative at the first message with no dots.
    pub fn new(now_ms: u64) -> Self {
        Self {
            started_at_ms: now_ms,
            steps_applied: 0,
            ticks_in_message: 0,
            message_index: 0,
            dot_count: 0,
        }
    }

    /// Applies every whole step elapsed since start, returning how many were
    /// applied by this call. Steps never rewind for non-monotonic clocks.
    pub fn advance_to(&mut self, now_ms: u64) -> u64 {
        let steps_due = now_ms.saturating_sub(self.started_at_ms) / STATUS_TICK_INTERVAL_MS;
        let mut applied = 0;
        while self.steps_applied < steps_due {
            self.step();
            applied += 1;
        }
        applied
    }

    fn step(&mut self) {
        self.steps_applied += 1;
        self.dot_count = (self.dot_count + 1) % 4;
        self.ticks_in_message += 1;
        if self.ticks_in_message >= TICKS_PER_MESSAGE {
            self.ticks_in_message = 0;
            if self.message_index < SCAN_STATUS_MESSAGES.len() - 1 {
                self.message_index += 1;
            }
        }
    }

    /// Index of the message currently shown.
    pub fn message_index(&self) -> usize {
        self.message_index
    }

    /// Rendered status text: current message plus trailing dots.
    pub fn status_line(&self) -> String {
        let mut line = SCAN_STATUS_MESSAGES[self.message_index].to_string();
        for _ in 0..self.dot_count {
            line.push('.');
        }
        line
    }
}

/// Aggregate view state for one run of the capture flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    /// App version string sourced from root `VERSION`.
    pub version: String,
    /// Current stage; drives the control-set projection.
    pub stage: ViewStage,
    /// Photo presented during review and upload.
    pub photo: Option<CapturedPhoto>,
    /// Inline error banner text, `None` when hidden.
    pub error_banner: Option<String>,
    // Narrative is private so teardown stays exactly-once via `take`.
    narrative: Option<ProgressNarrative>,
}

impl ViewState {
    /// Creates the initial live-stage view.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            stage: ViewStage::Live,
            photo: None,
            error_banner: None,
            narrative: None,
        }
    }

    /// Projects the current stage into its control set.
    pub fn control_set(&self) -> ControlSet {
        ControlSet {
            live_controls_visible: self.stage == ViewStage::Live,
            review_controls_visible: matches!(self.stage, ViewStage::Review | ViewStage::Uploading),
            review_controls_enabled: self.stage == ViewStage::Review,
            loader_visible: self.stage == ViewStage::Uploading,
            progress_bar_animating: self.stage == ViewStage::Uploading,
        }
    }

    /// Shows the error banner with the given text.
    pub fn set_error_banner(&mut self, message: impl Into<String>) {
        self.error_banner = Some(message.into());
    }

    /// Hides the error banner.
    pub fn clear_error_banner(&mut self) {
        self.error_banner = None;
    }

    /// Presents a freshly captured or imported photo, entering review.
    pub fn present_photo(&mut self, photo: CapturedPhoto) {
        self.photo = Some(photo);
        self.stage = ViewStage::Review;
    }

    /// Returns to the live preview, dropping the reviewed photo.
    pub fn return_to_live(&mut self) {
        self.photo = None;
        self.stage = ViewStage::Live;
    }

    /// Returns `true` when an analysis may start from the current state.
    pub fn can_analyze(&self) -> bool {
        self.stage == ViewStage::Review && self.photo.is_some()
    }

    /// Enters the uploading stage: banner hidden, narrative started.
    pub fn begin_upload(&mut self, now_ms: u64) {
        self.error_banner = None;
        self.narrative = Some(ProgressNarrative::new(now_ms));
        self.stage = ViewStage::Uploading;
    }

    /// Advances the narrative to `now_ms`, returning the fresh status line
    /// while an upload is in flight.
    pub fn advance_narrative(&mut self, now_ms: u64) -> Option<String> {
        let narrative = self.narrative.as_mut()?;
        narrative.advance_to(now_ms);
        Some(narrative.status_line())
    }

    /// Current narrative status line, if an upload is in flight.
    pub fn status_line(&self) -> Option<String> {
        self.narrative.as_ref().map(ProgressNarrative::status_line)
    }

    /// Resolves the upload as failed: narrative torn down, review controls
    /// restored, banner set to the display message.
    ///
    /// Returns `true` when this call tore the narrative down, `false` when it
    /// was already gone.
    pub fn finish_upload_failure(&mut self, message: impl Into<String>) -> bool {
        let cleared = self.narrative.take().is_some();
        self.stage = ViewStage::Review;
        self.error_banner = Some(message.into());
        cleared
    }

    /// Resolves the upload as succeeded: narrative torn down while the
    /// loader stays visible until navigation replaces this view.
    ///
    /// Returns `true` when this call tore the narrative down, `false` when it
    /// was already gone.
    pub fn complete_upload(&mut self) -> bool {
        self.narrative.take().is_some()
    }
}
