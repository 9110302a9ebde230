#![forbid(unsafe_code)]

//! Background double-tap detection (fullscreen trigger).
//!
//! Timestamps are supplied by the host so detection is deterministic. A
//! second tap within the window fires once and clears the detector, so a
//! third quick tap starts a new pair instead of firing again.

/// Two-tap window detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoubleTapDetector {
    window_ms: f64,
    last_tap_ms: Option<f64>,
}

impl DoubleTapDetector {
    #[must_use]
    pub const fn new(window_ms: f64) -> Self {
        Self {
            window_ms,
            last_tap_ms: None,
        }
    }

    /// Record a tap at `now_ms`. Returns `true` when it completes a double tap.
    pub fn tap(&mut self, now_ms: f64) -> bool {
        match self.last_tap_ms {
            Some(last) if now_ms - last <= self.window_ms && now_ms >= last => {
                self.last_tap_ms = None;
                true
            }
            _ => {
                self.last_tap_ms = Some(now_ms);
                false
            }
        }
    }

    /// Forget any pending first tap.
    pub fn reset(&mut self) {
        self.last_tap_ms = None;
    }
}

impl Default for DoubleTapDetector {
    fn default() -> Self {
        Self::new(300.0)
    }
}
