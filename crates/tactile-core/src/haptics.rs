#![forbid(unsafe_code)]

//! Haptic patterns and the activation-gated output adapter.
//!
//! # Routing
//!
//! [`HapticAdapter::vibrate`] resolves one [`HapticPattern`] to at most one
//! platform call:
//!
//! 1. No [`UserActivation`] yet: nothing is called ([`HapticOutcome::Inactive`]).
//! 2. Rich impact capability present: one `impact(tier)` call. Failure falls
//!    through to step 3.
//! 3. Duration-pattern capability present: one `vibrate(ms…)` call. A `false`
//!    return or an error is swallowed ([`HapticOutcome::Rejected`]).
//!
//! # Invariants
//!
//! 1. Zero backend calls before activation, regardless of pattern.
//! 2. Capabilities are detected once, in [`HapticAdapter::new`]. A rich call
//!    that reports [`PlatformError::Unavailable`] disables the rich path for
//!    the rest of the session; other failures only skip it for that call.
//! 3. `vibrate` never returns an error and never panics.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::PlatformError;

/// Abstract feedback request, one per interaction type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HapticPattern {
    Tap,
    Click,
    Tick,
    Toggle,
    SpinTick,
    DialNotch,
    Roll,
    Heavy,
}

impl HapticPattern {
    pub const ALL: [Self; 8] = [
        Self::Tap,
        Self::Click,
        Self::Tick,
        Self::Toggle,
        Self::SpinTick,
        Self::DialNotch,
        Self::Roll,
        Self::Heavy,
    ];

    /// Alternating vibrate/pause durations in milliseconds.
    #[must_use]
    pub const fn durations(self) -> &'static [u32] {
        match self {
            Self::Tap => &[10],
            Self::Click => &[15],
            Self::Tick => &[5],
            Self::Toggle => &[20, 30, 20],
            Self::SpinTick => &[3],
            Self::DialNotch => &[8],
            Self::Roll => &[2],
            Self::Heavy => &[30, 20, 30],
        }
    }

    /// Nearest impact tier for rich haptic engines.
    #[must_use]
    pub const fn tier(self) -> ImpactTier {
        match self {
            Self::Tap | Self::Tick | Self::SpinTick | Self::DialNotch | Self::Roll => {
                ImpactTier::Light
            }
            Self::Click | Self::Toggle => ImpactTier::Medium,
            Self::Heavy => ImpactTier::Heavy,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tap => "tap",
            Self::Click => "click",
            Self::Tick => "tick",
            Self::Toggle => "toggle",
            Self::SpinTick => "spin-tick",
            Self::DialNotch => "dial-notch",
            Self::Roll => "roll",
            Self::Heavy => "heavy",
        }
    }
}

/// Intensity tier understood by rich impact APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImpactTier {
    Light,
    Medium,
    Heavy,
}

impl ImpactTier {
    /// Style string passed to native impact bridges.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "LIGHT",
            Self::Medium => "MEDIUM",
            Self::Heavy => "HEAVY",
        }
    }
}

/// Platform gate: vibration is refused until a real user gesture happened.
///
/// Starts inactive, flips once, never resets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserActivation {
    active: bool,
}

impl UserActivation {
    #[must_use]
    pub const fn new() -> Self {
        Self { active: false }
    }

    #[inline]
    #[must_use]
    pub const fn is_active(self) -> bool {
        self.active
    }

    /// Record a user gesture. Returns `true` the first time only.
    pub fn activate(&mut self) -> bool {
        let first = !self.active;
        self.active = true;
        first
    }
}

/// Capabilities reported once by [`HapticBackend::detect`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HapticCapabilities {
    /// Rich impact API (tiered).
    pub impact: bool,
    /// Simple duration-pattern API.
    pub pattern: bool,
}

impl HapticCapabilities {
    pub const NONE: Self = Self {
        impact: false,
        pattern: false,
    };
}

/// Platform haptic surface.
pub trait HapticBackend {
    /// Probe available capabilities. Failures must report `false`, not panic.
    fn detect(&self) -> HapticCapabilities;

    /// Issue one tiered impact.
    fn impact(&mut self, tier: ImpactTier) -> Result<(), PlatformError>;

    /// Issue a raw vibrate/pause pattern. `Ok(false)` means the platform
    /// refused the request.
    fn vibrate(&mut self, pattern: &[u32]) -> Result<bool, PlatformError>;
}

/// What happened to one haptic request.
///
/// Haptics are best-effort, so callers discard this. The `must_use` forces
/// them to say so with [`HapticOutcome::ignore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "haptic outcomes are best-effort; discard them with `.ignore()`"]
pub enum HapticOutcome {
    /// Delivered through the rich impact API.
    Impact(ImpactTier),
    /// Delivered through the duration-pattern API.
    Pattern,
    /// No user activation yet; nothing was called.
    Inactive,
    /// Neither capability exists on this platform.
    Unsupported,
    /// The platform refused or threw; swallowed.
    Rejected,
}

impl HapticOutcome {
    /// Whether a platform call reported success.
    #[inline]
    #[must_use]
    pub const fn is_delivered(self) -> bool {
        matches!(self, Self::Impact(_) | Self::Pattern)
    }

    /// Explicitly discard the outcome.
    #[inline]
    pub fn ignore(self) {}
}

/// Activation-gated haptic router with rich → pattern fallback.
#[derive(Debug)]
pub struct HapticAdapter<B> {
    backend: B,
    caps: HapticCapabilities,
}

impl<B: HapticBackend> HapticAdapter<B> {
    /// Wrap `backend`, probing its capabilities once.
    pub fn new(backend: B) -> Self {
        let caps = backend.detect();
        debug!(
            impact = caps.impact,
            pattern = caps.pattern,
            "haptic capabilities detected"
        );
        Self { backend, caps }
    }

    /// Cached capabilities.
    #[inline]
    #[must_use]
    pub const fn capabilities(&self) -> HapticCapabilities {
        self.caps
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Route `pattern` to the best available capability.
    pub fn vibrate(&mut self, activation: UserActivation, pattern: HapticPattern) -> HapticOutcome {
        if !activation.is_active() {
            return HapticOutcome::Inactive;
        }

        if self.caps.impact {
            let tier = pattern.tier();
            match self.backend.impact(tier) {
                Ok(()) => {
                    trace!(pattern = pattern.as_str(), tier = tier.as_str(), "impact");
                    return HapticOutcome::Impact(tier);
                }
                Err(err) => {
                    debug!(pattern = pattern.as_str(), %err, "impact failed; falling back");
                    if matches!(err, PlatformError::Unavailable(_)) {
                        self.caps.impact = false;
                    }
                }
            }
        }

        if !self.caps.pattern {
            return if self.caps.impact {
                HapticOutcome::Rejected
            } else {
                HapticOutcome::Unsupported
            };
        }

        match self.backend.vibrate(pattern.durations()) {
            Ok(true) => {
                trace!(pattern = pattern.as_str(), "vibrate");
                HapticOutcome::Pattern
            }
            Ok(false) => {
                debug!(pattern = pattern.as_str(), "vibrate refused");
                HapticOutcome::Rejected
            }
            Err(err) => {
                debug!(pattern = pattern.as_str(), %err, "vibrate failed");
                HapticOutcome::Rejected
            }
        }
    }
}

/// Backend with no capabilities, for platforms without vibration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHaptics;

impl HapticBackend for NoHaptics {
    fn detect(&self) -> HapticCapabilities {
        HapticCapabilities::NONE
    }

    fn impact(&mut self, _tier: ImpactTier) -> Result<(), PlatformError> {
        Err(PlatformError::Unavailable("impact"))
    }

    fn vibrate(&mut self, _pattern: &[u32]) -> Result<bool, PlatformError> {
        Err(PlatformError::Unavailable("vibrate"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Recorder {
        caps: HapticCapabilities,
        impact_result: Option<PlatformError>,
        vibrate_result: Result<bool, PlatformError>,
        impacts: Vec<ImpactTier>,
        patterns: Vec<Vec<u32>>,
    }

    impl Recorder {
        fn with(caps: HapticCapabilities) -> Self {
            Self {
                caps,
                impact_result: None,
                vibrate_result: Ok(true),
                impacts: Vec::new(),
                patterns: Vec::new(),
            }
        }

        fn calls(&self) -> usize {
            self.impacts.len() + self.patterns.len()
        }
    }

    impl HapticBackend for Recorder {
        fn detect(&self) -> HapticCapabilities {
            self.caps
        }

        fn impact(&mut self, tier: ImpactTier) -> Result<(), PlatformError> {
            self.impacts.push(tier);
            match &self.impact_result {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }

        fn vibrate(&mut self, pattern: &[u32]) -> Result<bool, PlatformError> {
            self.patterns.push(pattern.to_vec());
            self.vibrate_result.clone()
        }
    }

    fn active() -> UserActivation {
        let mut a = UserActivation::new();
        a.activate();
        a
    }

    const BOTH: HapticCapabilities = HapticCapabilities {
        impact: true,
        pattern: true,
    };
    const PATTERN_ONLY: HapticCapabilities = HapticCapabilities {
        impact: false,
        pattern: true,
    };

    #[test]
    fn tier_table_covers_every_pattern() {
        let light = [
            HapticPattern::Tap,
            HapticPattern::Tick,
            HapticPattern::SpinTick,
            HapticPattern::DialNotch,
            HapticPattern::Roll,
        ];
        for p in HapticPattern::ALL {
            let expected = if light.contains(&p) {
                ImpactTier::Light
            } else if p == HapticPattern::Heavy {
                ImpactTier::Heavy
            } else {
                ImpactTier::Medium
            };
            assert_eq!(p.tier(), expected, "{p:?}");
        }
    }

    #[test]
    fn every_pattern_has_nonempty_durations() {
        for p in HapticPattern::ALL {
            assert!(!p.durations().is_empty(), "{p:?}");
            assert!(p.durations().len() % 2 == 1, "{p:?} should end on a vibrate");
        }
    }

    #[test]
    fn activation_flips_once() {
        let mut a = UserActivation::new();
        assert!(!a.is_active());
        assert!(a.activate());
        assert!(!a.activate());
        assert!(a.is_active());
    }

    #[test]
    fn inactive_gate_makes_no_calls() {
        let mut adapter = HapticAdapter::new(Recorder::with(BOTH));
        for p in HapticPattern::ALL {
            assert_eq!(
                adapter.vibrate(UserActivation::new(), p),
                HapticOutcome::Inactive
            );
        }
        assert_eq!(adapter.backend().calls(), 0);
    }

    #[test]
    fn rich_path_wins_when_available() {
        let mut adapter = HapticAdapter::new(Recorder::with(BOTH));
        let outcome = adapter.vibrate(active(), HapticPattern::Toggle);
        assert_eq!(outcome, HapticOutcome::Impact(ImpactTier::Medium));
        assert_eq!(adapter.backend().impacts, vec![ImpactTier::Medium]);
        assert!(adapter.backend().patterns.is_empty());
    }

    #[test]
    fn rich_rejection_falls_back_to_pattern() {
        let mut recorder = Recorder::with(BOTH);
        recorder.impact_result = Some(PlatformError::Rejected("impact"));
        let mut adapter = HapticAdapter::new(recorder);

        let outcome = adapter.vibrate(active(), HapticPattern::Heavy);
        assert_eq!(outcome, HapticOutcome::Pattern);
        assert_eq!(adapter.backend().patterns, vec![vec![30, 20, 30]]);
        // A rejection does not disable the rich path.
        assert!(adapter.capabilities().impact);
    }

    #[test]
    fn rich_absence_at_call_time_disables_rich_path() {
        let mut recorder = Recorder::with(BOTH);
        recorder.impact_result = Some(PlatformError::Unavailable("impact"));
        let mut adapter = HapticAdapter::new(recorder);

        adapter.vibrate(active(), HapticPattern::Tap).ignore();
        adapter.vibrate(active(), HapticPattern::Tap).ignore();
        assert_eq!(adapter.backend().impacts.len(), 1);
        assert_eq!(adapter.backend().patterns.len(), 2);
    }

    #[test]
    fn pattern_refusal_is_swallowed() {
        let mut recorder = Recorder::with(PATTERN_ONLY);
        recorder.vibrate_result = Ok(false);
        let mut adapter = HapticAdapter::new(recorder);
        assert_eq!(
            adapter.vibrate(active(), HapticPattern::Tick),
            HapticOutcome::Rejected
        );
    }

    #[test]
    fn pattern_exception_is_swallowed() {
        let mut recorder = Recorder::with(PATTERN_ONLY);
        recorder.vibrate_result = Err(PlatformError::exception("SecurityError"));
        let mut adapter = HapticAdapter::new(recorder);
        assert_eq!(
            adapter.vibrate(active(), HapticPattern::Roll),
            HapticOutcome::Rejected
        );
    }

    #[test]
    fn no_capabilities_degrades_silently() {
        let mut adapter = HapticAdapter::new(NoHaptics);
        assert_eq!(
            adapter.vibrate(active(), HapticPattern::Click),
            HapticOutcome::Unsupported
        );
    }

    #[test]
    fn pattern_names_are_kebab_case() {
        let json = serde_json::to_string(&HapticPattern::DialNotch).unwrap();
        assert_eq!(json, "\"dial-notch\"");
        assert_eq!(HapticPattern::SpinTick.as_str(), "spin-tick");
    }
}
