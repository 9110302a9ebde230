#![forbid(unsafe_code)]

//! Press-style zones: the click button and the toggle switch.

use crate::haptics::HapticPattern;
use crate::tracker::{GesturePhase, PointerSample, ZoneDispatch, ZoneMotion};
use crate::zone::{ZoneFlags, ZoneKind, ZoneSnapshot, ZoneVisual};

/// Click button. Down presses (with the shared `tap`), up taps again only if
/// the button was actually pressed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PressMotion {
    pressed: bool,
}

impl PressMotion {
    #[must_use]
    pub const fn new() -> Self {
        Self { pressed: false }
    }

    #[inline]
    #[must_use]
    pub const fn is_pressed(&self) -> bool {
        self.pressed
    }
}

impl ZoneMotion for PressMotion {
    fn kind(&self) -> ZoneKind {
        ZoneKind::Click
    }

    fn begin(&mut self, _sample: &PointerSample, _out: &mut Vec<HapticPattern>) {
        self.pressed = true;
    }

    fn apply(&mut self, _sample: &PointerSample, _out: &mut Vec<HapticPattern>) {}

    fn release(&mut self, out: &mut Vec<HapticPattern>) {
        if self.pressed {
            out.push(HapticPattern::Tap);
        }
        self.pressed = false;
    }

    fn abort(&mut self) {
        self.pressed = false;
    }

    fn visual(&self) -> ZoneVisual {
        ZoneVisual::Press {
            pressed: self.pressed,
        }
    }

    fn flags(&self) -> ZoneFlags {
        if self.pressed {
            ZoneFlags::PRESSED
        } else {
            ZoneFlags::empty()
        }
    }
}

/// Toggle switch: no drag, each activation flips the state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToggleSwitch {
    on: bool,
}

impl ToggleSwitch {
    #[must_use]
    pub const fn new() -> Self {
        Self { on: false }
    }

    #[inline]
    #[must_use]
    pub const fn is_on(&self) -> bool {
        self.on
    }

    /// Flip the switch and request the `toggle` haptic.
    pub fn activate(&mut self, pointer_id: u32) -> ZoneDispatch {
        self.on = !self.on;
        ZoneDispatch::updated(
            ZoneKind::Toggle,
            GesturePhase::Down,
            Some(pointer_id),
            vec![HapticPattern::Toggle],
        )
    }

    #[must_use]
    pub fn snapshot(&self) -> ZoneSnapshot {
        ZoneSnapshot {
            zone: ZoneKind::Toggle,
            flags: if self.on {
                ZoneFlags::ON
            } else {
                ZoneFlags::empty()
            },
            visual: ZoneVisual::Switch { on: self.on },
        }
    }
}
