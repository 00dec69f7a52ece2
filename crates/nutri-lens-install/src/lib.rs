#![warn(missing_docs)]
//! # nutri-lens-install
//!
//! ## Purpose
//! Adapts the platform's deferred install-prompt lifecycle to one visible
//! install button.
//!
//! ## Responsibilities
//! - Retain the platform's single-use prompt token while suppressing its
//!   default UI.
//! - Drive button visibility (availability, debug reveal, installed signal).
//! - Present the prompt through an injectable driver and report the choice.
//!
//! ## Data flow
//! Platform availability event -> [`InstallPromptHandler::on_install_available`]
//! -> user clicks -> [`InstallPromptHandler::activate`] moves the token into
//! [`PromptDriver::present`] -> choice returned for logging.
//!
//! ## Ownership and lifetimes
//! [`PromptToken`] is intentionally non-clonable and consumed by move, so the
//! platform's prompt-once contract is enforced by the type system.
//!
//! ## Error model
//! Driver failures surface as [`InstallError`]; the token is gone either way
//! because the platform invalidates it on first presentation.
//!
//! ## Security and privacy notes
//! Token identifiers are opaque labels for logs; no user data is attached.
//!
//! ## Example
//! ```rust
//! use nutri_lens_install::{InstallPromptHandler, PromptToken};
//!
//! let mut handler = InstallPromptHandler::new();
//! handler.on_install_available(PromptToken::new("prompt-1"));
//! assert!(handler.button_visible());
//! ```

use thiserror::Error;

/// Query-string fragment that reveals the button for manual testing.
pub const DEBUG_REVEAL_QUERY: &str = "debug=true";

/// Single-use handle to the platform's deferred install prompt.
///
/// Deliberately neither `Clone` nor `Copy`: presenting it consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct PromptToken {
    id: String,
}

impl PromptToken {
    /// Wraps a platform prompt handle under an opaque log label.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Opaque label used in logs.
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// User decision reported by the platform prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallChoice {
    /// The user accepted the install.
    Accepted,
    /// The user dismissed the prompt.
    Dismissed,
}

/// Abstract presenter for the platform install prompt.
pub trait PromptDriver {
    /// Presents the prompt, consuming the token, and waits for the choice.
    ///
    /// # Errors
    /// Returns [`InstallError::Driver`] when the platform fails to present.
    /// The token is invalid afterwards in every case.
    fn present(&self, token: PromptToken) -> Result<InstallChoice, InstallError>;
}

/// Install-button state machine over the deferred prompt lifecycle.
#[derive(Debug, Default)]
pub struct InstallPromptHandler {
    deferred: Option<PromptToken>,
    button_visible: bool,
    installed: bool,
}

impl InstallPromptHandler {
    /// Creates a handler with no prompt and a hidden button.
    pub fn new() -> Self {
        Self::default()
    }

    /// Retains a freshly deferred prompt token and reveals the button.
    ///
    /// The platform's default prompt UI is suppressed by the caller before
    /// handing the token over; from here on this handler is the only path to
    /// presentation.
    pub fn on_install_available(&mut self, token: PromptToken) {
        self.deferred = Some(token);
        self.button_visible = true;
    }

    /// Reveals the button when the query string carries the debug marker.
    ///
    /// Returns `true` when the marker matched. No token is attached by this
    /// path, so a later activation is a visible no-op.
    pub fn reveal_for_debug_query(&mut self, query: &str) -> bool {
        if query.contains(DEBUG_REVEAL_QUERY) {
            self.button_visible = true;
            return true;
        }
        false
    }

    /// Handles an install-button click.
    ///
    /// The button is hidden immediately. When a token is retained it is moved
    /// into the driver and the user's choice is returned for logging; without
    /// a token the activation resolves to `Ok(None)`.
    ///
    /// # Errors
    /// Propagates [`InstallError::Driver`] from presentation. The token is
    /// consumed even then.
    pub fn activate(
        &mut self,
        driver: &dyn PromptDriver,
    ) -> Result<Option<InstallChoice>, InstallError> {
        self.button_visible = false;

        let Some(token) = self.deferred.take() else {
            return Ok(None);
        };

        let choice = driver.present(token)?;
        Ok(Some(choice))
    }

    /// Handles the platform's installed signal: button hidden, any retained
    /// token discarded.
    pub fn on_app_installed(&mut self) {
        self.deferred = None;
        self.button_visible = false;
        self.installed = true;
    }

    /// Returns `true` while the install button should be rendered.
    pub fn button_visible(&self) -> bool {
        self.button_visible
    }

    /// Returns `true` when a presentable token is retained.
    pub fn has_deferred_prompt(&self) -> bool {
        self.deferred.is_some()
    }

    /// Returns `true` once the installed signal was observed.
    pub fn is_installed(&self) -> bool {
        self.installed
    }
}

/// Errors produced by prompt presentation.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The platform failed to present the prompt.
    #[error("install prompt driver failure: {0}")]
    Driver(String),
}
