#![forbid(unsafe_code)]

//! Application context: every zone, the activation flag, haptics, momentum,
//! the double-tap detector, and the update controller in one owned value.
//!
//! The host routes browser events here by [`ZoneKind`]; every call returns
//! the [`ZoneDispatch`] record after its haptic requests have been sent.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::config::TactileConfig;
use crate::double_tap::DoubleTapDetector;
use crate::haptics::{HapticAdapter, HapticBackend, UserActivation};
use crate::momentum::{Momentum, MomentumState};
use crate::tracker::linear::SliderMotion;
use crate::tracker::press::{PressMotion, ToggleSwitch};
use crate::tracker::roll::RollMotion;
use crate::tracker::rotary::RotaryMotion;
use crate::tracker::{DragZone, GesturePhase, IgnoredReason, PointerSample, Tracker, ZoneDispatch};
use crate::update::UpdateController;
use crate::zone::{ZoneKind, ZoneSnapshot};

/// Serializable view of every zone, in [`ZoneKind::ALL`] order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Whether a user gesture has unlocked haptics.
    pub activated: bool,
    pub zones: Vec<ZoneSnapshot>,
}

impl EngineSnapshot {
    #[must_use]
    pub fn zone(&self, kind: ZoneKind) -> Option<&ZoneSnapshot> {
        self.zones.iter().find(|z| z.zone == kind)
    }
}

/// The process-wide state container, passed explicitly.
#[derive(Debug)]
pub struct TactileEngine<B> {
    config: TactileConfig,
    activation: UserActivation,
    haptics: HapticAdapter<B>,
    spinner: Tracker<RotaryMotion>,
    dial: Tracker<RotaryMotion>,
    slider: Tracker<SliderMotion>,
    click: Tracker<PressMotion>,
    roll: Tracker<RollMotion>,
    toggle: ToggleSwitch,
    momentum: Momentum,
    double_tap: DoubleTapDetector,
    update: UpdateController,
}

impl<B: HapticBackend> TactileEngine<B> {
    pub fn new(config: TactileConfig, backend: B) -> Self {
        Self {
            activation: UserActivation::new(),
            haptics: HapticAdapter::new(backend),
            spinner: Tracker::new(RotaryMotion::spinner(config.spinner.clone())),
            dial: Tracker::new(RotaryMotion::dial(config.dial.clone())),
            slider: Tracker::new(SliderMotion::new(config.slider.clone())),
            click: Tracker::new(PressMotion::new()),
            roll: Tracker::new(RollMotion::new(config.roll.clone())),
            toggle: ToggleSwitch::new(),
            momentum: Momentum::new(&config.momentum),
            double_tap: DoubleTapDetector::new(config.shell.double_tap_window_ms),
            update: UpdateController::new(&config.update),
            config,
        }
    }

    /// Engine with the shipped tuning.
    pub fn with_defaults(backend: B) -> Self {
        Self::new(TactileConfig::default(), backend)
    }

    #[must_use]
    pub fn config(&self) -> &TactileConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn activation(&self) -> UserActivation {
        self.activation
    }

    #[must_use]
    pub fn haptics(&self) -> &HapticAdapter<B> {
        &self.haptics
    }

    pub fn haptics_mut(&mut self) -> &mut HapticAdapter<B> {
        &mut self.haptics
    }

    #[must_use]
    pub fn update(&self) -> &UpdateController {
        &self.update
    }

    pub fn update_mut(&mut self) -> &mut UpdateController {
        &mut self.update
    }

    #[must_use]
    pub fn spinner(&self) -> &Tracker<RotaryMotion> {
        &self.spinner
    }

    #[must_use]
    pub fn dial(&self) -> &Tracker<RotaryMotion> {
        &self.dial
    }

    #[must_use]
    pub fn slider(&self) -> &Tracker<SliderMotion> {
        &self.slider
    }

    #[must_use]
    pub fn click(&self) -> &Tracker<PressMotion> {
        &self.click
    }

    #[must_use]
    pub fn roll(&self) -> &Tracker<RollMotion> {
        &self.roll
    }

    #[must_use]
    pub fn toggle(&self) -> &ToggleSwitch {
        &self.toggle
    }

    /// Record a real user gesture. Haptics stay silent until this happens.
    pub fn record_activation(&mut self) {
        if self.activation.activate() {
            info!("user activation recorded; haptics unlocked");
        }
    }

    pub fn pointer_down(&mut self, zone: ZoneKind, sample: &PointerSample) -> ZoneDispatch {
        self.record_activation();
        let dispatch = match self.tracker_mut(zone) {
            Some(tracker) => tracker.pointer_down(sample),
            None => self.toggle.activate(sample.pointer_id),
        };
        self.finish(dispatch)
    }

    pub fn pointer_move(&mut self, zone: ZoneKind, sample: &PointerSample) -> ZoneDispatch {
        let dispatch = match self.tracker_mut(zone) {
            Some(tracker) => tracker.pointer_move(sample),
            None => ZoneDispatch::ignored(
                zone,
                GesturePhase::Move,
                Some(sample.pointer_id),
                IgnoredReason::NotDraggable,
            ),
        };
        self.finish(dispatch)
    }

    pub fn pointer_up(&mut self, zone: ZoneKind, pointer_id: u32) -> ZoneDispatch {
        let dispatch = match self.tracker_mut(zone) {
            Some(tracker) => tracker.pointer_up(pointer_id),
            None => ZoneDispatch::ignored(
                zone,
                GesturePhase::Up,
                Some(pointer_id),
                IgnoredReason::NotDraggable,
            ),
        };
        self.finish(dispatch)
    }

    /// Browser `pointercancel` / `touchcancel`.
    pub fn pointer_cancel(&mut self, zone: ZoneKind, pointer_id: Option<u32>) -> ZoneDispatch {
        let dispatch = match self.tracker_mut(zone) {
            Some(tracker) => tracker.cancel(pointer_id),
            None => ZoneDispatch::ignored(
                zone,
                GesturePhase::Cancel,
                pointer_id,
                IgnoredReason::NotDraggable,
            ),
        };
        self.finish(dispatch)
    }

    /// Window blur or page hidden: cancel every active gesture and forget a
    /// pending first background tap.
    pub fn interrupt(&mut self) -> Vec<ZoneDispatch> {
        self.double_tap.reset();
        let mut ended = Vec::new();
        for zone in ZoneKind::ALL {
            let Some(tracker) = self.tracker_mut(zone) else {
                continue;
            };
            if tracker.is_active() {
                ended.push(tracker.cancel(None));
            }
        }
        if !ended.is_empty() {
            debug!(count = ended.len(), "gestures interrupted");
        }
        ended
    }

    /// One display frame of spinner free spin. Skipped while the spinner is
    /// held.
    pub fn frame(&mut self) -> MomentumState {
        if self.spinner.is_active() {
            return MomentumState::AtRest;
        }
        self.spinner.motion_mut().coast(&self.momentum)
    }

    /// A tap on the page background at `now_ms`. Returns `true` when it
    /// completes a double tap and the host should request fullscreen.
    pub fn background_tap(&mut self, now_ms: f64) -> bool {
        self.record_activation();
        let fire = self.double_tap.tap(now_ms);
        if fire {
            debug!(now_ms, "double tap; fullscreen requested");
        }
        fire
    }

    #[must_use]
    pub fn zone_snapshot(&self, zone: ZoneKind) -> ZoneSnapshot {
        match zone {
            ZoneKind::Spinner => self.spinner.snapshot(),
            ZoneKind::Slider => self.slider.snapshot(),
            ZoneKind::Click => self.click.snapshot(),
            ZoneKind::Dial => self.dial.snapshot(),
            ZoneKind::Toggle => self.toggle.snapshot(),
            ZoneKind::Roll => self.roll.snapshot(),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            activated: self.activation.is_active(),
            zones: ZoneKind::ALL
                .into_iter()
                .map(|zone| self.zone_snapshot(zone))
                .collect(),
        }
    }

    /// Drag-capable tracker for `zone`. The toggle has none.
    fn tracker_mut(&mut self, zone: ZoneKind) -> Option<&mut dyn DragZone> {
        match zone {
            ZoneKind::Spinner => Some(&mut self.spinner),
            ZoneKind::Slider => Some(&mut self.slider),
            ZoneKind::Click => Some(&mut self.click),
            ZoneKind::Dial => Some(&mut self.dial),
            ZoneKind::Roll => Some(&mut self.roll),
            ZoneKind::Toggle => None,
        }
    }

    fn finish(&mut self, dispatch: ZoneDispatch) -> ZoneDispatch {
        if dispatch.is_ignored() {
            debug!(
                zone = dispatch.zone.as_str(),
                phase = ?dispatch.phase,
                outcome = ?dispatch.outcome,
                "input ignored"
            );
            return dispatch;
        }
        trace!(
            zone = dispatch.zone.as_str(),
            phase = ?dispatch.phase,
            pointer_id = ?dispatch.pointer_id,
            haptics = dispatch.haptics.len(),
            "dispatch"
        );
        for &pattern in &dispatch.haptics {
            self.haptics.vibrate(self.activation, pattern).ignore();
        }
        dispatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlatformError;
    use crate::geometry::{Bounds, Point};
    use crate::haptics::{HapticCapabilities, HapticPattern, ImpactTier};
    use crate::zone::{ZoneFlags, ZoneVisual};

    #[derive(Debug, Default)]
    struct Vibrations(Vec<Vec<u32>>);

    impl HapticBackend for Vibrations {
        fn detect(&self) -> HapticCapabilities {
            HapticCapabilities {
                impact: false,
                pattern: true,
            }
        }

        fn impact(&mut self, _tier: ImpactTier) -> Result<(), PlatformError> {
            Err(PlatformError::Unavailable("impact"))
        }

        fn vibrate(&mut self, pattern: &[u32]) -> Result<bool, PlatformError> {
            self.0.push(pattern.to_vec());
            Ok(true)
        }
    }

    fn engine() -> TactileEngine<Vibrations> {
        TactileEngine::with_defaults(Vibrations::default())
    }

    fn sample(id: u32, x: f64, y: f64, t: f64) -> PointerSample {
        PointerSample::new(id, Point::new(x, y), Bounds::new(0.0, 0.0, 100.0, 100.0), t)
    }

    #[test]
    fn first_down_unlocks_and_taps() {
        let mut e = engine();
        assert!(!e.activation().is_active());
        e.pointer_down(ZoneKind::Roll, &sample(1, 50.0, 50.0, 0.0));
        assert!(e.activation().is_active());
        assert_eq!(e.haptics().backend().0, vec![HapticPattern::Tap.durations().to_vec()]);
    }

    #[test]
    fn toggle_routes_without_a_tracker() {
        let mut e = engine();
        let d = e.pointer_down(ZoneKind::Toggle, &sample(2, 0.0, 0.0, 0.0));
        assert_eq!(d.haptics, vec![HapticPattern::Toggle]);
        assert!(e.toggle().is_on());
        assert!(e.pointer_move(ZoneKind::Toggle, &sample(2, 9.0, 9.0, 1.0)).is_ignored());
        assert!(e.pointer_up(ZoneKind::Toggle, 2).is_ignored());
        assert_eq!(e.haptics().backend().0, vec![vec![20, 30, 20]]);
    }

    #[test]
    fn zones_are_independent() {
        let mut e = engine();
        e.pointer_down(ZoneKind::Roll, &sample(1, 50.0, 50.0, 0.0));
        let d = e.pointer_down(ZoneKind::Click, &sample(2, 5.0, 5.0, 0.0));
        assert!(!d.is_ignored());
        assert!(e.roll().is_active());
        assert!(e.click().is_active());
    }

    #[test]
    fn interrupt_cancels_all_active_gestures() {
        let mut e = engine();
        e.pointer_down(ZoneKind::Slider, &sample(1, 30.0, 50.0, 0.0));
        e.pointer_down(ZoneKind::Click, &sample(2, 5.0, 5.0, 0.0));
        let before = e.haptics().backend().0.len();

        let ended = e.interrupt();
        assert_eq!(ended.len(), 2);
        assert!(ended.iter().all(|d| d.phase == GesturePhase::Cancel));
        // No snap click, no release tap.
        assert_eq!(e.haptics().backend().0.len(), before);
        assert!(e.interrupt().is_empty());
    }

    #[test]
    fn momentum_waits_for_release() {
        let mut e = engine();
        e.pointer_down(ZoneKind::Spinner, &sample(1, 100.0, 50.0, 0.0));
        e.pointer_move(ZoneKind::Spinner, &sample(1, 50.0, 100.0, 16.0));
        assert_eq!(e.frame(), MomentumState::AtRest);
        let held = e.spinner().motion().rotation();

        e.pointer_up(ZoneKind::Spinner, 1);
        let calls = e.haptics().backend().0.len();
        assert_eq!(e.frame(), MomentumState::Coasting);
        assert!(e.spinner().motion().rotation() > held);
        // Free spin is silent.
        assert_eq!(e.haptics().backend().0.len(), calls);
    }

    #[test]
    fn background_double_tap_requests_fullscreen() {
        let mut e = engine();
        assert!(!e.background_tap(0.0));
        assert!(e.background_tap(200.0));
        assert!(e.activation().is_active());
    }

    #[test]
    fn interrupt_forgets_pending_background_tap() {
        let mut e = engine();
        assert!(!e.background_tap(0.0));
        let _ = e.interrupt();
        assert!(!e.background_tap(100.0));
        assert!(e.background_tap(200.0));
    }

    #[test]
    fn snapshot_covers_every_zone() {
        let mut e = engine();
        e.pointer_down(ZoneKind::Click, &sample(1, 5.0, 5.0, 0.0));
        let snap = e.snapshot();
        assert!(snap.activated);
        assert_eq!(snap.zones.len(), ZoneKind::ALL.len());
        let click = snap.zone(ZoneKind::Click).unwrap();
        assert!(click.flags.contains(ZoneFlags::PRESSED | ZoneFlags::ACTIVE));
        assert_eq!(
            snap.zone(ZoneKind::Slider).unwrap().visual,
            ZoneVisual::Slider { percent: 50.0 }
        );
    }
}
