#![forbid(unsafe_code)]

//! Linear motion for the slider.
//!
//! The knob follows the pointer's horizontal position on the track, clamped to
//! `[min_percent, max_percent]` so it never sits at the very ends. A tick is
//! requested whenever `round(percent / tick_step)` changes. Releasing snaps to
//! the nearest multiple of `snap_step` through the same clamp/tick path and
//! finishes with a click.

use crate::config::SliderConfig;
use crate::haptics::HapticPattern;
use crate::tracker::{PointerSample, ZoneMotion};
use crate::zone::{ZoneKind, ZoneVisual};

/// Slider motion.
#[derive(Debug, Clone)]
pub struct SliderMotion {
    config: SliderConfig,
    percent: f64,
}

impl SliderMotion {
    #[must_use]
    pub fn new(config: SliderConfig) -> Self {
        let percent = config
            .initial_percent
            .clamp(config.min_percent, config.max_percent);
        Self { config, percent }
    }

    /// Knob position in percent, always within the clamp range.
    #[inline]
    #[must_use]
    pub fn percent(&self) -> f64 {
        self.percent
    }

    /// Move the knob to `raw` percent (clamped), requesting a tick on a
    /// bucket change.
    pub fn set_percent(&mut self, raw: f64, out: &mut Vec<HapticPattern>) {
        let next = raw.clamp(self.config.min_percent, self.config.max_percent);
        let step = self.config.tick_step;
        if (self.percent / step).round() != (next / step).round() {
            out.push(HapticPattern::Tick);
        }
        self.percent = next;
    }

    /// Nearest snap position for the current knob.
    #[must_use]
    pub fn snap_target(&self) -> f64 {
        let step = self.config.snap_step;
        (self.percent / step).round() * step
    }
}

impl ZoneMotion for SliderMotion {
    fn kind(&self) -> ZoneKind {
        ZoneKind::Slider
    }

    fn begin(&mut self, sample: &PointerSample, out: &mut Vec<HapticPattern>) {
        self.set_percent(sample.bounds.percent_x(sample.position.x), out);
    }

    fn apply(&mut self, sample: &PointerSample, out: &mut Vec<HapticPattern>) {
        self.set_percent(sample.bounds.percent_x(sample.position.x), out);
    }

    fn release(&mut self, out: &mut Vec<HapticPattern>) {
        let target = self.snap_target();
        self.set_percent(target, out);
        out.push(HapticPattern::Click);
    }

    fn abort(&mut self) {}

    fn visual(&self) -> ZoneVisual {
        ZoneVisual::Slider {
            percent: self.percent,
        }
    }
}
