//! QR decode session for the join-a-location flow.
//!
//! The session is a small state machine driven by camera callbacks. The
//! camera itself lives behind [`CameraDevice`] so the decode logic is
//! testable without hardware; the shell wires a real device in.
//!
//! At most one decode per session is honored - a QR code held in front of
//! the camera produces the same text on every frame, and without the latch
//! each frame would submit another join. The first decode wins even when
//! the text is not a valid join code: the candidate is handed to the caller
//! so the subsequent lookup can tell the user what was wrong, rather than
//! leaving the camera silently scanning.

use std::sync::LazyLock;

use regex::Regex;

/// Join deep links look like `https://host/join/CAFE01`; the token is the
/// last path segment.
static JOIN_PATH: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"(?i)/join/([A-Z0-9]+)").unwrap()
});

pub const PERMISSION_DENIED_MESSAGE: &str =
    "Camera permission denied. Please allow camera access in your browser settings.";
pub const CAMERA_UNAVAILABLE_MESSAGE: &str =
    "Could not start camera. Try entering the code manually.";

/// A camera stream the session can acquire and release.
///
/// `stop` must be safe to call more than once; the session guarantees it is
/// called before the session is dropped, decode or no decode.
pub trait CameraDevice {
    /// Acquire the stream and begin delivering frames.
    ///
    /// # Errors
    ///
    /// Returns the device's own failure message; the session classifies it
    /// into a user-facing one.
    fn start(&mut self) -> Result<(), String>;

    /// Release the stream.
    fn stop(&mut self);
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanPhase {
    /// Constructed, camera not yet requested.
    Idle,
    /// Stream acquisition in progress.
    Starting,
    /// Receiving frames, waiting for a decode.
    Scanning,
    /// A join candidate was extracted; the device has been released.
    Decoded(String),
    /// The device could not start or failed mid-scan; the message is
    /// user-facing and the UI offers manual entry instead of retrying.
    Failed(String),
    /// Closed without a decode.
    Stopped,
}

/// One scanner lifetime: open, decode at most once, release.
pub struct DecodeSession<D: CameraDevice> {
    device: D,
    phase: ScanPhase,
    latched: bool,
    released: bool,
}

impl<D: CameraDevice> DecodeSession<D> {
    #[must_use]
    pub const fn new(device: D) -> Self {
        Self {
            device,
            phase: ScanPhase::Idle,
            latched: false,
            released: false,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> &ScanPhase {
        &self.phase
    }

    /// Acquire the camera. A start failure is terminal: the session moves
    /// to `Failed` with a classified message and the device is released.
    pub fn start(&mut self) {
        if self.phase != ScanPhase::Idle {
            return;
        }
        self.phase = ScanPhase::Starting;

        match self.device.start() {
            Ok(()) => self.phase = ScanPhase::Scanning,
            Err(message) => {
                tracing::warn!(%message, "camera start failed");
                self.release();
                self.phase = ScanPhase::Failed(classify_device_error(&message));
            }
        }
    }

    /// Handle a decoded frame. The first non-empty decode latches the
    /// session: the join candidate (deep-link token or the scanned text
    /// itself, uppercased) is returned and the device released. Repeat
    /// decodes and decodes outside the scanning phase are ignored.
    pub fn handle_decode(&mut self, text: &str) -> Option<String> {
        if self.latched || self.phase != ScanPhase::Scanning {
            return None;
        }

        let candidate = extract_join_candidate(text)?;
        self.latched = true;
        self.release();
        self.phase = ScanPhase::Decoded(candidate.clone());
        tracing::debug!(%candidate, "join candidate decoded");
        Some(candidate)
    }

    /// Handle a device failure reported after a successful start.
    pub fn handle_error(&mut self, message: &str) {
        if self.phase != ScanPhase::Scanning {
            return;
        }
        tracing::warn!(%message, "camera failed mid-scan");
        self.release();
        self.phase = ScanPhase::Failed(classify_device_error(message));
    }

    /// Explicit close (navigating away, tapping cancel). Releases the
    /// device regardless of phase.
    pub fn close(&mut self) {
        self.release();
        if !matches!(self.phase, ScanPhase::Decoded(_) | ScanPhase::Failed(_)) {
            self.phase = ScanPhase::Stopped;
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.device.stop();
        }
    }
}

impl<D: CameraDevice> Drop for DecodeSession<D> {
    /// The device is released even if the session is dropped mid-scan;
    /// leaking a camera stream keeps the indicator light on and blocks
    /// other apps.
    fn drop(&mut self) {
        self.release();
    }
}

/// Extract the join candidate from scanned text: the deep-link token if the
/// text looks like a join link, otherwise the text itself, trimmed and
/// uppercased. Validation happens downstream at the join lookup - handing
/// back a wrong code lets the lookup report what was scanned. Empty frames
/// yield nothing.
fn extract_join_candidate(text: &str) -> Option<String> {
    let candidate = JOIN_PATH
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map_or(text, |token| token.as_str())
        .trim()
        .to_uppercase();

    if candidate.is_empty() {
        None
    } else {
        Some(candidate)
    }
}

/// Map a raw device failure onto one of the two user-facing messages.
/// Browsers report permission refusals with "NotAllowed" or the word
/// "permission" somewhere in the message.
fn classify_device_error(message: &str) -> String {
    let lowered = message.to_lowercase();
    if lowered.contains("permission") || lowered.contains("notallowed") {
        PERMISSION_DENIED_MESSAGE.to_string()
    } else {
        CAMERA_UNAVAILABLE_MESSAGE.to_string()
    }
}
