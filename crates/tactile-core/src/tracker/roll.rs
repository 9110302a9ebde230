#![forbid(unsafe_code)]

//! Free 2-D motion for the roll ball.
//!
//! Raw pixel deltas accumulate into unbounded `x`/`y`; the tilt shown to the
//! user is the displacement times `visual_scale`. Path length is integrated
//! separately: once it exceeds `haptic_distance_px` a `roll` haptic fires and
//! the integrator resets to zero (not a modulus, so one long step fires once).

use crate::config::RollConfig;
use crate::geometry::Point;
use crate::haptics::HapticPattern;
use crate::tracker::{PointerSample, ZoneMotion};
use crate::zone::{ZoneKind, ZoneVisual};

/// Roll ball motion.
#[derive(Debug, Clone)]
pub struct RollMotion {
    config: RollConfig,
    x: f64,
    y: f64,
    distance: f64,
    last: Option<Point>,
}

impl RollMotion {
    #[must_use]
    pub fn new(config: RollConfig) -> Self {
        Self {
            config,
            x: 0.0,
            y: 0.0,
            distance: 0.0,
            last: None,
        }
    }

    /// Accumulated displacement in pixels.
    #[must_use]
    pub fn offset(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Path length since the last roll haptic.
    #[inline]
    #[must_use]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Tilt angles `(x, y)` in degrees. Vertical motion tips the ball about
    /// the X axis, horizontal motion about the Y axis.
    #[must_use]
    pub fn tilt(&self) -> (f64, f64) {
        let scale = self.config.visual_scale;
        (-self.y * scale, self.x * scale)
    }
}

impl ZoneMotion for RollMotion {
    fn kind(&self) -> ZoneKind {
        ZoneKind::Roll
    }

    fn begin(&mut self, sample: &PointerSample, _out: &mut Vec<HapticPattern>) {
        self.last = Some(sample.position);
    }

    fn apply(&mut self, sample: &PointerSample, out: &mut Vec<HapticPattern>) {
        let Some(last) = self.last else {
            return;
        };
        let position = sample.position;
        self.x += position.x - last.x;
        self.y += position.y - last.y;

        self.distance += last.distance(position);
        if self.distance > self.config.haptic_distance_px {
            out.push(HapticPattern::Roll);
            self.distance = 0.0;
        }
        self.last = Some(position);
    }

    fn release(&mut self, _out: &mut Vec<HapticPattern>) {
        self.last = None;
    }

    fn abort(&mut self) {
        self.last = None;
    }

    fn visual(&self) -> ZoneVisual {
        let (tilt_x, tilt_y) = self.tilt();
        ZoneVisual::Roll {
            x: self.x,
            y: self.y,
            tilt_x,
            tilt_y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Bounds;
    use crate::tracker::Tracker;

    fn at(x: f64, y: f64) -> PointerSample {
        PointerSample::new(1, Point::new(x, y), Bounds::new(0.0, 0.0, 120.0, 120.0), 0.0)
    }

    fn roll() -> Tracker<RollMotion> {
        Tracker::new(RollMotion::new(RollConfig::default()))
    }

    #[test]
    fn displacement_accumulates_and_tilts() {
        let mut t = roll();
        t.pointer_down(&at(60.0, 60.0));
        t.pointer_move(&at(70.0, 56.0));
        t.pointer_up(1);
        t.pointer_down(&at(10.0, 10.0));
        t.pointer_move(&at(20.0, 10.0));

        assert_eq!(t.motion().offset(), Point::new(20.0, -4.0));
        assert_eq!(
            t.snapshot().visual,
            ZoneVisual::Roll {
                x: 20.0,
                y: -4.0,
                tilt_x: 2.0,
                tilt_y: 10.0,
            }
        );
    }

    #[test]
    fn haptic_fires_after_twenty_pixels_of_path() {
        let mut t = roll();
        t.pointer_down(&at(0.0, 0.0));
        let mut fired = 0;
        // Back and forth: no net displacement, still path length.
        for (i, x) in [5.0, 0.0, 5.0, 0.0, 5.0].into_iter().enumerate() {
            fired += t.pointer_move(&at(x, 0.0)).count(HapticPattern::Roll);
            if i < 4 {
                assert_eq!(fired, 0);
            }
        }
        // 25px traveled: exactly 20 does not fire, 25 does.
        assert_eq!(fired, 1);
        assert_eq!(t.motion().distance(), 0.0);
    }

    #[test]
    fn long_step_fires_once_and_resets() {
        let mut t = roll();
        t.pointer_down(&at(0.0, 0.0));
        let d = t.pointer_move(&at(0.0, 100.0));
        assert_eq!(d.count(HapticPattern::Roll), 1);
        assert_eq!(t.motion().distance(), 0.0);
    }

    #[test]
    fn new_gesture_measures_from_its_own_origin() {
        let mut t = roll();
        t.pointer_down(&at(0.0, 0.0));
        t.pointer_move(&at(3.0, 4.0));
        t.cancel(None);
        // The jump from (3,4) to (100,100) is not a drag step.
        t.pointer_down(&at(100.0, 100.0));
        t.pointer_move(&at(100.0, 101.0));
        assert_eq!(t.motion().offset(), Point::new(3.0, 5.0));
        assert!((t.motion().distance() - 6.0).abs() < 1e-9);
    }
}
