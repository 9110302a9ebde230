#![forbid(unsafe_code)]

//! Zone gesture trackers.
//!
//! Every draggable zone shares one lifecycle, implemented once by
//! [`Tracker`]: idle → active on pointer-down, active → idle on pointer-up
//! or cancel. What a zone does with the samples is delegated to a
//! [`ZoneMotion`]:
//!
//! - [`rotary::RotaryMotion`]: spinner and dial (angle tracking, notches).
//! - [`linear::SliderMotion`]: slider (clamped percent, ticks, snap).
//! - [`roll::RollMotion`]: roll ball (displacement, path-length haptics).
//! - [`press::PressMotion`]: click button (press/release).
//!
//! The toggle has no drag and lives in [`press::ToggleSwitch`].
//!
//! # Invariants
//!
//! 1. At most one gesture per zone. A second pointer-down while active is
//!    ignored ([`IgnoredReason::GestureAlreadyActive`]).
//! 2. Move/up without a prior down never reach the motion
//!    ([`IgnoredReason::NoActiveGesture`]).
//! 3. Move/up from a pointer other than the one that started the gesture are
//!    ignored ([`IgnoredReason::PointerMismatch`]).
//! 4. Every accepted pointer-down emits [`HapticPattern::Tap`] first.
//! 5. Cancel ends the gesture without the release side effects (no slider
//!    snap, no click-button tap).

pub mod linear;
pub mod press;
pub mod roll;
pub mod rotary;

use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds, Point};
use crate::haptics::HapticPattern;
use crate::zone::{ZoneFlags, ZoneKind, ZoneSnapshot, ZoneVisual};

/// One pointer sample delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    /// Browser `pointerId`.
    pub pointer_id: u32,
    /// Pointer position in viewport pixels.
    pub position: Point,
    /// Bounding box of the zone's tracked element at sample time.
    pub bounds: Bounds,
    /// Event timestamp in milliseconds (monotonic, host clock).
    pub timestamp_ms: f64,
}

impl PointerSample {
    #[must_use]
    pub const fn new(pointer_id: u32, position: Point, bounds: Bounds, timestamp_ms: f64) -> Self {
        Self {
            pointer_id,
            position,
            bounds,
            timestamp_ms,
        }
    }
}

/// Lifecycle phase of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GesturePhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// Why an input was dropped without touching zone state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoredReason {
    NoActiveGesture,
    GestureAlreadyActive,
    PointerMismatch,
    NotDraggable,
}

/// Outcome category for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    Updated,
    Ignored(IgnoredReason),
}

/// Result of one tracker dispatch, doubling as its log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneDispatch {
    pub zone: ZoneKind,
    pub phase: GesturePhase,
    pub pointer_id: Option<u32>,
    /// Haptic requests in emission order.
    pub haptics: Vec<HapticPattern>,
    pub outcome: DispatchOutcome,
}

impl ZoneDispatch {
    pub(crate) fn ignored(
        zone: ZoneKind,
        phase: GesturePhase,
        pointer_id: Option<u32>,
        reason: IgnoredReason,
    ) -> Self {
        Self {
            zone,
            phase,
            pointer_id,
            haptics: Vec::new(),
            outcome: DispatchOutcome::Ignored(reason),
        }
    }

    pub(crate) fn updated(
        zone: ZoneKind,
        phase: GesturePhase,
        pointer_id: Option<u32>,
        haptics: Vec<HapticPattern>,
    ) -> Self {
        Self {
            zone,
            phase,
            pointer_id,
            haptics,
            outcome: DispatchOutcome::Updated,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_ignored(&self) -> bool {
        matches!(self.outcome, DispatchOutcome::Ignored(_))
    }

    /// Number of times `pattern` was requested.
    #[must_use]
    pub fn count(&self, pattern: HapticPattern) -> usize {
        self.haptics.iter().filter(|p| **p == pattern).count()
    }
}

/// Zone-specific reaction to an accepted gesture.
pub trait ZoneMotion {
    fn kind(&self) -> ZoneKind;

    /// Capture the gesture origin.
    fn begin(&mut self, sample: &PointerSample, out: &mut Vec<HapticPattern>);

    /// Apply one move sample: update continuous state and detect ticks.
    fn apply(&mut self, sample: &PointerSample, out: &mut Vec<HapticPattern>);

    /// The gesture ended normally.
    fn release(&mut self, out: &mut Vec<HapticPattern>);

    /// The gesture was interrupted. Clears transient fields only.
    fn abort(&mut self);

    fn visual(&self) -> ZoneVisual;

    /// Styling flags other than [`ZoneFlags::ACTIVE`].
    fn flags(&self) -> ZoneFlags {
        ZoneFlags::empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ActiveGesture {
    pointer_id: u32,
}

/// Shared idle/active lifecycle around a [`ZoneMotion`].
#[derive(Debug, Clone)]
pub struct Tracker<M> {
    motion: M,
    active: Option<ActiveGesture>,
}

impl<M: ZoneMotion> Tracker<M> {
    #[must_use]
    pub fn new(motion: M) -> Self {
        Self {
            motion,
            active: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> ZoneKind {
        self.motion.kind()
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    #[must_use]
    pub fn active_pointer_id(&self) -> Option<u32> {
        self.active.map(|a| a.pointer_id)
    }

    #[must_use]
    pub fn motion(&self) -> &M {
        &self.motion
    }

    pub fn motion_mut(&mut self) -> &mut M {
        &mut self.motion
    }

    pub fn pointer_down(&mut self, sample: &PointerSample) -> ZoneDispatch {
        let zone = self.kind();
        let pointer_id = Some(sample.pointer_id);
        if self.active.is_some() {
            return ZoneDispatch::ignored(
                zone,
                GesturePhase::Down,
                pointer_id,
                IgnoredReason::GestureAlreadyActive,
            );
        }

        self.active = Some(ActiveGesture {
            pointer_id: sample.pointer_id,
        });
        let mut out = Vec::with_capacity(2);
        out.push(HapticPattern::Tap);
        self.motion.begin(sample, &mut out);
        ZoneDispatch::updated(zone, GesturePhase::Down, pointer_id, out)
    }

    pub fn pointer_move(&mut self, sample: &PointerSample) -> ZoneDispatch {
        let zone = self.kind();
        let pointer_id = Some(sample.pointer_id);
        if let Err(reason) = self.check_pointer(sample.pointer_id) {
            return ZoneDispatch::ignored(zone, GesturePhase::Move, pointer_id, reason);
        }
        if !zone.is_draggable() {
            return ZoneDispatch::ignored(
                zone,
                GesturePhase::Move,
                pointer_id,
                IgnoredReason::NotDraggable,
            );
        }

        let mut out = Vec::with_capacity(2);
        self.motion.apply(sample, &mut out);
        ZoneDispatch::updated(zone, GesturePhase::Move, pointer_id, out)
    }

    pub fn pointer_up(&mut self, pointer_id: u32) -> ZoneDispatch {
        let zone = self.kind();
        if let Err(reason) = self.check_pointer(pointer_id) {
            return ZoneDispatch::ignored(zone, GesturePhase::Up, Some(pointer_id), reason);
        }

        self.active = None;
        let mut out = Vec::with_capacity(2);
        self.motion.release(&mut out);
        ZoneDispatch::updated(zone, GesturePhase::Up, Some(pointer_id), out)
    }

    /// Interrupt the gesture. `None` cancels whatever pointer is active.
    pub fn cancel(&mut self, pointer_id: Option<u32>) -> ZoneDispatch {
        let zone = self.kind();
        let Some(active) = self.active else {
            return ZoneDispatch::ignored(
                zone,
                GesturePhase::Cancel,
                pointer_id,
                IgnoredReason::NoActiveGesture,
            );
        };
        if let Some(id) = pointer_id
            && id != active.pointer_id
        {
            return ZoneDispatch::ignored(
                zone,
                GesturePhase::Cancel,
                Some(id),
                IgnoredReason::PointerMismatch,
            );
        }

        self.active = None;
        self.motion.abort();
        ZoneDispatch::updated(
            zone,
            GesturePhase::Cancel,
            Some(active.pointer_id),
            Vec::new(),
        )
    }

    #[must_use]
    pub fn snapshot(&self) -> ZoneSnapshot {
        let mut flags = self.motion.flags();
        flags.set(ZoneFlags::ACTIVE, self.is_active());
        ZoneSnapshot {
            zone: self.kind(),
            flags,
            visual: self.motion.visual(),
        }
    }

    fn check_pointer(&self, pointer_id: u32) -> Result<(), IgnoredReason> {
        match self.active {
            None => Err(IgnoredReason::NoActiveGesture),
            Some(active) if active.pointer_id != pointer_id => Err(IgnoredReason::PointerMismatch),
            Some(_) => Ok(()),
        }
    }
}

/// Object-safe view over any [`Tracker`], used to route by [`ZoneKind`].
pub trait DragZone {
    fn pointer_down(&mut self, sample: &PointerSample) -> ZoneDispatch;
    fn pointer_move(&mut self, sample: &PointerSample) -> ZoneDispatch;
    fn pointer_up(&mut self, pointer_id: u32) -> ZoneDispatch;
    fn cancel(&mut self, pointer_id: Option<u32>) -> ZoneDispatch;
    fn is_active(&self) -> bool;
    fn snapshot(&self) -> ZoneSnapshot;
}

impl<M: ZoneMotion> DragZone for Tracker<M> {
    fn pointer_down(&mut self, sample: &PointerSample) -> ZoneDispatch {
        Tracker::pointer_down(self, sample)
    }

    fn pointer_move(&mut self, sample: &PointerSample) -> ZoneDispatch {
        Tracker::pointer_move(self, sample)
    }

    fn pointer_up(&mut self, pointer_id: u32) -> ZoneDispatch {
        Tracker::pointer_up(self, pointer_id)
    }

    fn cancel(&mut self, pointer_id: Option<u32>) -> ZoneDispatch {
        Tracker::cancel(self, pointer_id)
    }

    fn is_active(&self) -> bool {
        Tracker::is_active(self)
    }

    fn snapshot(&self) -> ZoneSnapshot {
        Tracker::snapshot(self)
    }
}
