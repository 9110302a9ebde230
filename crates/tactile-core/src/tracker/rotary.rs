#![forbid(unsafe_code)]

//! Rotational motion shared by the spinner and the dial.
//!
//! The pointer angle around the element center is sampled with `atan2`; each
//! step's difference is normalized to the shortest path and accumulated, in
//! degrees, into an unbounded rotation. Wrapping the rotation to 0–360 would
//! make `floor(rotation / notch)` jump at the seam, so it is never wrapped.

use crate::config::RotaryConfig;
use crate::geometry::{bucket, normalize_angle_delta, pointer_angle};
use crate::haptics::HapticPattern;
use crate::momentum::{Momentum, MomentumState};
use crate::tracker::{PointerSample, ZoneMotion};
use crate::zone::{ZoneKind, ZoneVisual};

#[derive(Debug, Clone, Copy, PartialEq)]
struct AngleSample {
    angle: f64,
    timestamp_ms: f64,
}

/// Spinner/dial motion.
#[derive(Debug, Clone)]
pub struct RotaryMotion {
    kind: ZoneKind,
    config: RotaryConfig,
    notch: HapticPattern,
    track_velocity: bool,
    rotation: f64,
    velocity: f64,
    last: Option<AngleSample>,
}

impl RotaryMotion {
    /// Spinner: 30° notches, velocity recorded for momentum.
    #[must_use]
    pub fn spinner(config: RotaryConfig) -> Self {
        Self::new(ZoneKind::Spinner, config, HapticPattern::SpinTick, true)
    }

    /// Dial: 15° notches, no momentum.
    #[must_use]
    pub fn dial(config: RotaryConfig) -> Self {
        Self::new(ZoneKind::Dial, config, HapticPattern::DialNotch, false)
    }

    fn new(
        kind: ZoneKind,
        config: RotaryConfig,
        notch: HapticPattern,
        track_velocity: bool,
    ) -> Self {
        Self {
            kind,
            config,
            notch,
            track_velocity,
            rotation: 0.0,
            velocity: 0.0,
            last: None,
        }
    }

    /// Accumulated rotation in degrees (unbounded).
    #[inline]
    #[must_use]
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Degrees per normalized frame.
    #[inline]
    #[must_use]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Advance rotation by `degrees`, requesting at most one notch haptic.
    ///
    /// Only a bucket change matters: a step that skips several notches still
    /// emits one haptic.
    pub fn rotate_by(&mut self, degrees: f64, out: &mut Vec<HapticPattern>) {
        let previous = self.rotation;
        self.rotation += degrees;
        let step = self.config.notch_deg;
        if bucket(previous, step) != bucket(self.rotation, step) {
            out.push(self.notch);
        }
    }

    /// One free-spin frame. No haptics: feedback needs a fresh gesture.
    pub fn coast(&mut self, momentum: &Momentum) -> MomentumState {
        momentum.step(&mut self.rotation, &mut self.velocity)
    }
}

impl ZoneMotion for RotaryMotion {
    fn kind(&self) -> ZoneKind {
        self.kind
    }

    fn begin(&mut self, sample: &PointerSample, _out: &mut Vec<HapticPattern>) {
        self.last = Some(AngleSample {
            angle: pointer_angle(&sample.bounds, sample.position),
            timestamp_ms: sample.timestamp_ms,
        });
        // Grabbing the spinner stops any free spin.
        self.velocity = 0.0;
    }

    fn apply(&mut self, sample: &PointerSample, out: &mut Vec<HapticPattern>) {
        let Some(last) = self.last else {
            return;
        };
        let angle = pointer_angle(&sample.bounds, sample.position);
        let degrees = normalize_angle_delta(angle - last.angle).to_degrees();
        self.rotate_by(degrees, out);

        if self.track_velocity {
            let elapsed = sample.timestamp_ms - last.timestamp_ms;
            let elapsed = if elapsed > 0.0 { elapsed } else { 1.0 };
            self.velocity = degrees / elapsed * self.config.velocity_frame_ms;
        }

        self.last = Some(AngleSample {
            angle,
            timestamp_ms: sample.timestamp_ms,
        });
    }

    fn release(&mut self, _out: &mut Vec<HapticPattern>) {
        self.last = None;
    }

    fn abort(&mut self) {
        self.last = None;
        self.velocity = 0.0;
    }

    fn visual(&self) -> ZoneVisual {
        ZoneVisual::Rotation {
            degrees: self.rotation,
        }
    }
}
