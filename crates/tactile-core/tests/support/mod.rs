//! Shared test doubles.

#![allow(dead_code)]

use tactile_core::PlatformError;
use tactile_core::geometry::{Bounds, Point};
use tactile_core::haptics::{HapticBackend, HapticCapabilities, ImpactTier};
use tactile_core::tracker::PointerSample;

/// Haptic backend that records every platform call.
#[derive(Debug)]
pub struct RecordingHaptics {
    pub caps: HapticCapabilities,
    pub impacts: Vec<ImpactTier>,
    pub patterns: Vec<Vec<u32>>,
}

impl RecordingHaptics {
    pub fn pattern_only() -> Self {
        Self::with(HapticCapabilities {
            impact: false,
            pattern: true,
        })
    }

    pub fn with(caps: HapticCapabilities) -> Self {
        Self {
            caps,
            impacts: Vec::new(),
            patterns: Vec::new(),
        }
    }

    pub fn calls(&self) -> usize {
        self.impacts.len() + self.patterns.len()
    }
}

impl HapticBackend for RecordingHaptics {
    fn detect(&self) -> HapticCapabilities {
        self.caps
    }

    fn impact(&mut self, tier: ImpactTier) -> Result<(), PlatformError> {
        self.impacts.push(tier);
        Ok(())
    }

    fn vibrate(&mut self, pattern: &[u32]) -> Result<bool, PlatformError> {
        self.patterns.push(pattern.to_vec());
        Ok(true)
    }
}

pub const DISC: Bounds = Bounds::new(0.0, 0.0, 200.0, 200.0);
pub const TRACK: Bounds = Bounds::new(20.0, 0.0, 300.0, 40.0);

/// Sample on a 100px circle around the disc center at `deg` degrees.
pub fn on_circle(id: u32, deg: f64, t: f64) -> PointerSample {
    let c = DISC.center();
    let rad = deg.to_radians();
    PointerSample::new(
        id,
        Point::new(c.x + 100.0 * rad.cos(), c.y + 100.0 * rad.sin()),
        DISC,
        t,
    )
}

/// Sample on the slider track at `percent` of its width.
pub fn on_track(id: u32, percent: f64, t: f64) -> PointerSample {
    PointerSample::new(
        id,
        Point::new(TRACK.left + TRACK.width * percent / 100.0, 20.0),
        TRACK,
        t,
    )
}

pub fn at(id: u32, x: f64, y: f64, t: f64) -> PointerSample {
    PointerSample::new(id, Point::new(x, y), DISC, t)
}
