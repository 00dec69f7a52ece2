#![warn(missing_docs)]
//! # nutri-lens-camera
//!
//! ## Purpose
//! Provides camera stream acquisition and live-session abstractions.
//!
//! ## Responsibilities
//! - Define a backend-agnostic camera trait with facing-mode constraints.
//! - Own the single live stream through [`CameraSession`] (stop before open).
//! - Model tap-to-focus adjustment with its delayed continuous-mode revert.
//! - Expose deterministic synthetic camera hardware for CI and unit tests.
//!
//! ## Data flow
//! App starts/rotates a session -> backend opens one [`CameraStream`] ->
//! the session grabs [`nutri_lens_core::PhotoFrame`] stills on demand ->
//! frames enter the photo encoding pipeline.
//!
//! ## Ownership and lifetimes
//! The session owns its stream exclusively (`Option<Box<dyn CameraStream>>`);
//! there is never more than one live stream, and acquiring a new one always
//! stops the previous one first.
//!
//! ## Error model
//! Access denials, missing devices, and backend failures are reported as
//! [`CameraError`] values. Focus and preview failures are demoted to
//! loggable report values because they must never surface to the user.
//!
//! ## Security and privacy notes
//! Camera backends must not persist raw frame bytes to disk; frames live in
//! memory only for the duration of one encode.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use nutri_lens_core::PhotoFrame;
use thiserror::Error;

/// Ideal stream width requested from every backend.
pub const IDEAL_STREAM_WIDTH: u32 = 1_920;
/// Ideal stream height requested from every backend.
pub const IDEAL_STREAM_HEIGHT: u32 = 1_080;
/// Delay before a tap-to-focus adjustment reverts to continuous mode.
pub const FOCUS_REVERT_DELAY_MS: u64 = 1_000;

/// Camera facing preference carried by stream constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    /// Front camera, toward the user.
    User,
    /// Back camera, away from the user. The default for product scanning.
    Environment,
}

impl Facing {
    /// Returns the other facing, used by camera rotation.
    pub fn opposite(self) -> Self {
        match self {
            Self::User => Self::Environment,
            Self::Environment => Self::User,
        }
    }
}

impl std::fmt::Display for Facing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Environment => write!(f, "environment"),
        }
    }
}

/// Constraints passed to a backend when opening a stream.
///
/// Width and height are ideals, not requirements; backends may deliver any
/// resolution they can provide for the requested facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConstraints {
    /// Requested camera facing.
    pub facing: Facing,
    /// Ideal stream width in pixels.
    pub ideal_width: u32,
    /// Ideal stream height in pixels.
    pub ideal_height: u32,
}

impl StreamConstraints {
    /// Builds the standard constraint set for one facing.
    pub fn for_facing(facing: Facing) -> Self {
        Self {
            facing,
            ideal_width: IDEAL_STREAM_WIDTH,
            ideal_height: IDEAL_STREAM_HEIGHT,
        }
    }
}

/// Focus modes a stream may support or have applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusMode {
    /// One-shot autofocus triggered by a tap.
    Auto,
    /// Hardware-driven continuous refocus, the steady-state mode.
    Continuous,
    /// Manually positioned focus, never requested by this workspace.
    Manual,
}

impl std::fmt::Display for FocusMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Continuous => write!(f, "continuous"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// Focus capability set reported by an active stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusCapabilities {
    /// Focus modes the stream accepts, empty when focus is fixed.
    pub modes: Vec<FocusMode>,
}

impl FocusCapabilities {
    /// Returns `true` when any focus-mode adjustment is possible.
    pub fn is_adjustable(&self) -> bool {
        !self.modes.is_empty()
    }

    /// Returns `true` when the given mode is accepted.
    pub fn supports(&self, mode: FocusMode) -> bool {
        self.modes.contains(&mode)
    }
}

/// Trait implemented by concrete camera providers.
pub trait CameraBackend: Send + Sync {
    /// Opens one stream satisfying the constraints.
    ///
    /// # Errors
    /// Returns [`CameraError::PermissionDenied`] when access is refused and
    /// [`CameraError::NoDevice`] when no camera matches the facing.
    fn open_stream(&self, constraints: &StreamConstraints)
    -> Result<Box<dyn CameraStream>, CameraError>;
}

/// One live camera stream owned by a [`CameraSession`].
pub trait CameraStream: Send {
    /// Facing the stream was opened with.
    fn facing(&self) -> Facing;

    /// Native frame dimensions delivered by this stream.
    fn frame_size(&self) -> (u32, u32);

    /// Grabs the current frame at native resolution.
    ///
    /// # Errors
    /// Returns [`CameraError::Backend`] when the hardware read fails and
    /// [`CameraError::NoActiveStream`] when the stream was stopped.
    fn grab_frame(&self) -> Result<PhotoFrame, CameraError>;

    /// Reports which focus modes this stream accepts.
    fn focus_capabilities(&self) -> FocusCapabilities;

    /// Applies one focus mode.
    ///
    /// # Errors
    /// Returns [`CameraError::UnsupportedFocusMode`] for modes outside the
    /// capability set and [`CameraError::Backend`] on hardware failure.
    fn apply_focus_mode(&self, mode: FocusMode) -> Result<(), CameraError>;

    /// Starts live preview playback.
    ///
    /// # Errors
    /// Returns [`CameraError::Preview`] when playback cannot start. Callers
    /// treat this as loggable, never user-visible.
    fn begin_preview(&self) -> Result<(), CameraError>;

    /// Stops the stream and releases its tracks.
    fn stop(&self);

    /// Returns `true` while the stream is delivering frames.
    fn is_active(&self) -> bool;
}

/// Report produced by a successful stream start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamStartReport {
    /// Facing of the freshly opened stream.
    pub facing: Facing,
    /// Native frame width in pixels.
    pub frame_width: u32,
    /// Native frame height in pixels.
    pub frame_height: u32,
    /// Preview playback failure, swallowed for log-only reporting.
    pub preview_failure: Option<String>,
}

/// Outcome of one focus-mode adjustment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusOutcome {
    /// The mode was applied; a continuous-mode revert may be pending.
    Applied {
        /// Mode that was applied.
        mode: FocusMode,
        /// Whether a delayed revert to continuous mode was scheduled.
        revert_scheduled: bool,
    },
    /// The stream exposes no focus-mode control; nothing was attempted.
    Unsupported,
    /// The backend rejected the adjustment. Loggable, never user-visible.
    Failed(String),
}

/// Result of one tap-to-focus gesture on an active stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusTap {
    /// Tap x position in preview coordinates, where the ring is drawn.
    pub x: u32,
    /// Tap y position in preview coordinates.
    pub y: u32,
    /// What happened to the hardware focus, independent of the ring.
    pub outcome: FocusOutcome,
}

/// Owns the live camera stream and its facing preference.
///
/// The session enforces the single-stream invariant: every acquisition stops
/// the previous stream before asking the backend for a new one.
pub struct CameraSession {
    backend: Arc<dyn CameraBackend>,
    facing: Facing,
    stream: Option<Box<dyn CameraStream>>,
    focus_revert_at_ms: Option<u64>,
}

impl CameraSession {
    /// Creates a session with the default environment-facing preference.
    pub fn new(backend: Arc<dyn CameraBackend>) -> Self {
        Self {
            backend,
            facing: Facing::Environment,
            stream: None,
            focus_revert_at_ms: None,
        }
    }

    /// Current facing preference, kept even while no stream is live.
    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Returns `true` when a live stream is attached and delivering frames.
    pub fn has_active_stream(&self) -> bool {
        self.stream.as_ref().is_some_and(|stream| stream.is_active())
    }

    /// Native frame size of the live stream, if any.
    pub fn frame_size(&self) -> Option<(u32, u32)> {
        self.stream.as_ref().map(|stream| stream.frame_size())
    }

    /// Stops and releases any current stream, then opens a new one with the
    /// current facing preference. Preview is started best-effort; its failure
    /// is carried in the report instead of failing the start.
    ///
    /// # Errors
    /// Returns the backend's [`CameraError`] when the stream cannot be
    /// opened. The previous stream is already stopped at that point, so the
    /// session is left with no live stream.
    pub fn start(&mut self) -> Result<StreamStartReport, CameraError> {
        if let Some(stream) = self.stream.take() {
            stream.stop();
        }
        self.focus_revert_at_ms = None;

        let constraints = StreamConstraints::for_facing(self.facing);
        let stream = self.backend.open_stream(&constraints)?;

        let preview_failure = stream.begin_preview().err().map(|error| error.to_string());
        let (frame_width, frame_height) = stream.frame_size();
        let facing = stream.facing();
        self.stream = Some(stream);

        Ok(StreamStartReport {
            facing,
            frame_width,
            frame_height,
            preview_failure,
        })
    }

    /// Flips the facing preference, then restarts the stream.
    ///
    /// The flip is applied before acquisition, so a failed restart leaves the
    /// new preference in place and the next start attempt uses it.
    ///
    /// # Errors
    /// Same as [`CameraSession::start`].
    pub fn rotate(&mut self) -> Result<StreamStartReport, CameraError> {
        self.facing = self.facing.opposite();
        self.start()
    }

    /// Starts a stream only when none is live, used when returning from
    /// photo review.
    ///
    /// # Errors
    /// Same as [`CameraSession::start`].
    pub fn ensure_active(&mut self) -> Result<Option<StreamStartReport>, CameraError> {
        if self.has_active_stream() {
            return Ok(None);
        }
        self.start().map(Some)
    }

    /// Grabs one frame from the live stream at native resolution.
    ///
    /// # Errors
    /// Returns [`CameraError::NoActiveStream`] when no stream is live,
    /// otherwise propagates the stream's grab error.
    pub fn grab_frame(&self) -> Result<PhotoFrame, CameraError> {
        let stream = self
            .stream
            .as_ref()
            .filter(|stream| stream.is_active())
            .ok_or(CameraError::NoActiveStream)?;
        stream.grab_frame()
    }

    /// Handles one tap-to-focus gesture.
    ///
    /// Returns `None` when no stream is live (no ring, no adjustment). With a
    /// live stream the tap always yields a ring placement; the hardware
    /// adjustment outcome is carried alongside and is log-only. When the
    /// stream supports continuous focus, a revert is scheduled
    /// [`FOCUS_REVERT_DELAY_MS`] after `now_ms` and fired by
    /// [`CameraSession::tick`].
    pub fn tap_focus(&mut self, x: u32, y: u32, now_ms: u64) -> Option<FocusTap> {
        let stream = self.stream.as_ref().filter(|stream| stream.is_active())?;

        let capabilities = stream.focus_capabilities();
        let outcome = if !capabilities.is_adjustable() {
            FocusOutcome::Unsupported
        } else {
            match stream.apply_focus_mode(FocusMode::Auto) {
                Ok(()) => {
                    let revert_scheduled = capabilities.supports(FocusMode::Continuous);
                    if revert_scheduled {
                        self.focus_revert_at_ms = Some(now_ms + FOCUS_REVERT_DELAY_MS);
                    }
                    FocusOutcome::Applied {
                        mode: FocusMode::Auto,
                        revert_scheduled,
                    }
                }
                Err(error) => FocusOutcome::Failed(error.to_string()),
            }
        };

        Some(FocusTap { x, y, outcome })
    }

    /// Advances session time, firing the pending focus revert when due.
    ///
    /// Returns the revert outcome when one fired, for log-only reporting.
    pub fn tick(&mut self, now_ms: u64) -> Option<FocusOutcome> {
        let due = self.focus_revert_at_ms.is_some_and(|at_ms| now_ms >= at_ms);
        if !due {
            return None;
        }
        self.focus_revert_at_ms = None;

        let stream = self.stream.as_ref().filter(|stream| stream.is_active())?;
        let outcome = match stream.apply_focus_mode(FocusMode::Continuous) {
            Ok(()) => FocusOutcome::Applied {
                mode: FocusMode::Continuous,
                revert_scheduled: false,
            },
            Err(error) => FocusOutcome::Failed(error.to_string()),
        };
        Some(outcome)
    }

    /// Stops the live stream and clears pending focus work.
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.stop();
        }
        self.focus_revert_at_ms = None;
    }
}

/// Observable synthetic camera event, recorded in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraEvent {
    /// A stream was opened with the given facing.
    StreamOpened {
        /// Facing of the opened stream.
        facing: Facing,
    },
    /// A stream was stopped.
    StreamStopped {
        /// Facing of the stopped stream.
        facing: Facing,
    },
    /// Preview playback began.
    PreviewStarted {
        /// Facing of the previewing stream.
        facing: Facing,
    },
    /// A focus mode was applied to the active stream.
    FocusModeApplied {
        /// Mode that was applied.
        mode: FocusMode,
    },
}

/// Deterministic synthetic camera hardware for tests and CI.
///
/// Records every observable action into a shared event log so tests can
/// assert ordering guarantees such as stop-before-open.
pub struct SyntheticCameraBackend {
    frame_width: u32,
    frame_height: u32,
    focus_modes: Mutex<Vec<FocusMode>>,
    deny_message: Mutex<Option<String>>,
    events: Arc<Mutex<Vec<CameraEvent>>>,
    sequence: Arc<Mutex<u64>>,
}

impl SyntheticCameraBackend {
    /// Creates a backend delivering small frames with full focus support.
    pub fn new() -> Self {
        Self::with_frame_size(64, 48)
    }

    /// Creates a backend delivering frames of the given size.
    pub fn with_frame_size(frame_width: u32, frame_height: u32) -> Self {
        Self {
            frame_width,
            frame_height,
            focus_modes: Mutex::new(vec![FocusMode::Auto, FocusMode::Continuous]),
            deny_message: Mutex::new(None),
            events: Arc::new(Mutex::new(Vec::new())),
            sequence: Arc::new(Mutex::new(0)),
        }
    }

    /// Makes every subsequent open attempt fail with a permission denial.
    pub fn deny_access(&self, message: impl Into<String>) {
        if let Ok(mut deny) = self.deny_message.lock() {
            *deny = Some(message.into());
        }
    }

    /// Restores camera access for subsequent open attempts.
    pub fn allow_access(&self) {
        if let Ok(mut deny) = self.deny_message.lock() {
            *deny = None;
        }
    }

    /// Replaces the focus capability set reported by future streams.
    pub fn set_focus_modes(&self, modes: Vec<FocusMode>) {
        if let Ok(mut focus_modes) = self.focus_modes.lock() {
            *focus_modes = modes;
        }
    }

    /// Snapshot of all recorded events in call order.
    pub fn events(&self) -> Vec<CameraEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl Default for SyntheticCameraBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for SyntheticCameraBackend {
    fn open_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn CameraStream>, CameraError> {
        let denied = self
            .deny_message
            .lock()
            .map_err(|_| CameraError::Backend("synthetic deny lock poisoned".to_string()))?
            .clone();
        if let Some(message) = denied {
            return Err(CameraError::PermissionDenied(message));
        }

        let focus_modes = self
            .focus_modes
            .lock()
            .map_err(|_| CameraError::Backend("synthetic focus lock poisoned".to_string()))?
            .clone();

        record_event(
            &self.events,
            CameraEvent::StreamOpened {
                facing: constraints.facing,
            },
        );

        Ok(Box::new(SyntheticCameraStream {
            facing: constraints.facing,
            frame_width: self.frame_width,
            frame_height: self.frame_height,
            focus_modes,
            active: AtomicBool::new(true),
            events: Arc::clone(&self.events),
            sequence: Arc::clone(&self.sequence),
        }))
    }
}

struct SyntheticCameraStream {
    facing: Facing,
    frame_width: u32,
    frame_height: u32,
    focus_modes: Vec<FocusMode>,
    active: AtomicBool,
    events: Arc<Mutex<Vec<CameraEvent>>>,
    sequence: Arc<Mutex<u64>>,
}

impl CameraStream for SyntheticCameraStream {
    fn facing(&self) -> Facing {
        self.facing
    }

    fn frame_size(&self) -> (u32, u32) {
        (self.frame_width, self.frame_height)
    }

    fn grab_frame(&self) -> Result<PhotoFrame, CameraError> {
        if !self.is_active() {
            return Err(CameraError::NoActiveStream);
        }

        let mut sequence = self
            .sequence
            .lock()
            .map_err(|_| CameraError::Backend("synthetic sequence lock poisoned".to_string()))?;
        *sequence += 1;

        let byte = (*sequence % 255) as u8;
        let rgba_len = (self.frame_width as usize) * (self.frame_height as usize) * 4;
        PhotoFrame::new(self.frame_width, self.frame_height, vec![byte; rgba_len])
            .map_err(|error| CameraError::Backend(error.to_string()))
    }

    fn focus_capabilities(&self) -> FocusCapabilities {
        FocusCapabilities {
            modes: self.focus_modes.clone(),
        }
    }

    fn apply_focus_mode(&self, mode: FocusMode) -> Result<(), CameraError> {
        if !self.is_active() {
            return Err(CameraError::NoActiveStream);
        }
        if !self.focus_modes.contains(&mode) {
            return Err(CameraError::UnsupportedFocusMode(mode));
        }
        record_event(&self.events, CameraEvent::FocusModeApplied { mode });
        Ok(())
    }

    fn begin_preview(&self) -> Result<(), CameraError> {
        record_event(
            &self.events,
            CameraEvent::PreviewStarted {
                facing: self.facing,
            },
        );
        Ok(())
    }

    fn stop(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            record_event(
                &self.events,
                CameraEvent::StreamStopped {
                    facing: self.facing,
                },
            );
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

fn record_event(events: &Arc<Mutex<Vec<CameraEvent>>>, event: CameraEvent) {
    if let Ok(mut events) = events.lock() {
        events.push(event);
    }
}

/// Camera layer error type.
#[derive(Debug, Error)]
pub enum CameraError {
    /// User or platform refused camera access.
    #[error("camera access denied: {0}")]
    PermissionDenied(String),
    /// No device satisfies the requested facing.
    #[error("no matching camera device: {0}")]
    NoDevice(String),
    /// Operation requires a live stream.
    #[error("no active camera stream")]
    NoActiveStream,
    /// Requested focus mode is outside the stream's capability set.
    #[error("unsupported focus mode: {0}")]
    UnsupportedFocusMode(FocusMode),
    /// Preview playback failure, log-only by convention.
    #[error("preview failure: {0}")]
    Preview(String),
    /// Backend runtime failure.
    #[error("camera backend failure: {0}")]
    Backend(String),
}
