#![forbid(unsafe_code)]

//! Policy-as-data configuration for zone feel and update behavior.
//!
//! Every tunable lives in one [`TactileConfig`] that can be loaded from JSON
//! (or TOML with the `config-toml` feature). Defaults reproduce the tuned
//! values exactly, so `TactileConfig::default()` is the shipped feel.
//!
//! ```toml
//! [spinner]
//! notch_deg = 30.0
//!
//! [momentum]
//! friction = 0.98
//! ```

#[cfg(feature = "config-toml")]
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TactileConfig {
    #[serde(deserialize_with = "spinner_section")]
    pub spinner: RotaryConfig,
    #[serde(deserialize_with = "dial_section")]
    pub dial: RotaryConfig,
    pub slider: SliderConfig,
    pub roll: RollConfig,
    pub momentum: MomentumConfig,
    pub update: UpdateConfig,
    pub shell: ShellConfig,
}

impl Default for TactileConfig {
    fn default() -> Self {
        Self {
            spinner: RotaryConfig::spinner(),
            dial: RotaryConfig::dial(),
            slider: SliderConfig::default(),
            roll: RollConfig::default(),
            momentum: MomentumConfig::default(),
            update: UpdateConfig::default(),
            shell: ShellConfig::default(),
        }
    }
}

impl TactileConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validated()
    }

    /// Parse and validate a TOML document.
    #[cfg(feature = "config-toml")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validated()
    }

    /// Load a TOML file from disk.
    #[cfg(feature = "config-toml")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    fn validated(self) -> Result<Self, ConfigError> {
        let problems = self.validate();
        if problems.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Invalid { problems })
        }
    }

    /// Check every parameter range. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (name, rotary) in [("spinner", &self.spinner), ("dial", &self.dial)] {
            if !(rotary.notch_deg > 0.0) {
                errors.push(format!("{name}.notch_deg must be > 0, got {}", rotary.notch_deg));
            }
            if !(rotary.velocity_frame_ms > 0.0) {
                errors.push(format!(
                    "{name}.velocity_frame_ms must be > 0, got {}",
                    rotary.velocity_frame_ms
                ));
            }
        }

        let s = &self.slider;
        if !(s.min_percent < s.max_percent) {
            errors.push(format!(
                "slider.min_percent ({}) must be < slider.max_percent ({})",
                s.min_percent, s.max_percent
            ));
        }
        if s.min_percent < 0.0 || s.max_percent > 100.0 {
            errors.push("slider clamp range must lie within [0, 100]".into());
        }
        if !(s.tick_step > 0.0) {
            errors.push(format!("slider.tick_step must be > 0, got {}", s.tick_step));
        }
        if !(s.snap_step > 0.0) {
            errors.push(format!("slider.snap_step must be > 0, got {}", s.snap_step));
        }
        if s.initial_percent < s.min_percent || s.initial_percent > s.max_percent {
            errors.push(format!(
                "slider.initial_percent ({}) must lie within the clamp range",
                s.initial_percent
            ));
        }

        if !(self.roll.haptic_distance_px > 0.0) {
            errors.push(format!(
                "roll.haptic_distance_px must be > 0, got {}",
                self.roll.haptic_distance_px
            ));
        }

        let m = &self.momentum;
        if !(m.friction > 0.0 && m.friction < 1.0) {
            errors.push(format!("momentum.friction must be in (0, 1), got {}", m.friction));
        }
        if m.rest_velocity < 0.0 {
            errors.push(format!(
                "momentum.rest_velocity must be >= 0, got {}",
                m.rest_velocity
            ));
        }

        if self.update.check_interval_secs == 0 {
            errors.push("update.check_interval_secs must be > 0".into());
        }
        if self.update.cache_prefix.is_empty() {
            errors.push("update.cache_prefix must not be empty".into());
        }
        if self.update.worker_url.is_empty() {
            errors.push("update.worker_url must not be empty".into());
        }

        if !(self.shell.double_tap_window_ms > 0.0) {
            errors.push(format!(
                "shell.double_tap_window_ms must be > 0, got {}",
                self.shell.double_tap_window_ms
            ));
        }

        errors
    }
}

/// Rotational zone tuning (spinner, dial).
///
/// The two zones have different defaults, so a partial section is filled
/// from its own zone ([`RotaryConfig::spinner`] or [`RotaryConfig::dial`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotaryConfig {
    /// Degrees between haptic notches.
    pub notch_deg: f64,
    /// Frame length drag velocity is normalized to, in milliseconds. Only the
    /// spinner records velocity.
    pub velocity_frame_ms: f64,
}

impl RotaryConfig {
    #[must_use]
    pub const fn spinner() -> Self {
        Self {
            notch_deg: 30.0,
            velocity_frame_ms: 16.0,
        }
    }

    #[must_use]
    pub const fn dial() -> Self {
        Self {
            notch_deg: 15.0,
            velocity_frame_ms: 16.0,
        }
    }
}

/// A rotary section as written; absent fields keep the zone default.
#[derive(Deserialize)]
struct RotaryOverrides {
    notch_deg: Option<f64>,
    velocity_frame_ms: Option<f64>,
}

impl RotaryOverrides {
    fn over(self, base: RotaryConfig) -> RotaryConfig {
        RotaryConfig {
            notch_deg: self.notch_deg.unwrap_or(base.notch_deg),
            velocity_frame_ms: self.velocity_frame_ms.unwrap_or(base.velocity_frame_ms),
        }
    }
}

fn spinner_section<'de, D: Deserializer<'de>>(d: D) -> Result<RotaryConfig, D::Error> {
    RotaryOverrides::deserialize(d).map(|o| o.over(RotaryConfig::spinner()))
}

fn dial_section<'de, D: Deserializer<'de>>(d: D) -> Result<RotaryConfig, D::Error> {
    RotaryOverrides::deserialize(d).map(|o| o.over(RotaryConfig::dial()))
}

/// Slider tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliderConfig {
    /// Lowest reachable knob position (percent).
    pub min_percent: f64,
    /// Highest reachable knob position (percent).
    pub max_percent: f64,
    /// Bucket width for tick detection (percent).
    pub tick_step: f64,
    /// Release snaps to the nearest multiple of this (percent).
    pub snap_step: f64,
    /// Knob position at startup.
    pub initial_percent: f64,
}

impl Default for SliderConfig {
    fn default() -> Self {
        Self {
            min_percent: 10.0,
            max_percent: 90.0,
            tick_step: 10.0,
            snap_step: 10.0,
            initial_percent: 50.0,
        }
    }
}

/// Roll ball tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollConfig {
    /// Degrees of tilt per pixel of displacement.
    pub visual_scale: f64,
    /// Path length between roll haptics (pixels).
    pub haptic_distance_px: f64,
}

impl Default for RollConfig {
    fn default() -> Self {
        Self {
            visual_scale: 0.5,
            haptic_distance_px: 20.0,
        }
    }
}

/// Spinner free-spin tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumConfig {
    /// Per-frame velocity multiplier.
    pub friction: f64,
    /// Speed (degrees/frame) at or below which the spinner stops.
    pub rest_velocity: f64,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            friction: 0.98,
            rest_velocity: 0.1,
        }
    }
}

/// Offline worker and update check settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Script URL passed to `serviceWorker.register`.
    pub worker_url: String,
    /// Seconds between freshness checks.
    pub check_interval_secs: u32,
    /// Cache name prefix; the full name is `<prefix>-v<version>`.
    pub cache_prefix: String,
    /// Deployed cache version.
    pub cache_version: u32,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            worker_url: "sw.js".into(),
            check_interval_secs: 60,
            cache_prefix: "tactile".into(),
            cache_version: 1,
        }
    }
}

/// Page shell settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Two background taps within this window request fullscreen.
    pub double_tap_window_ms: f64,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            double_tap_window_ms: 300.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        assert!(TactileConfig::default().validate().is_empty());
    }

    #[test]
    fn defaults_keep_tuned_literals() {
        let c = TactileConfig::default();
        assert_eq!(c.spinner.notch_deg, 30.0);
        assert_eq!(c.dial.notch_deg, 15.0);
        assert_eq!(c.roll.haptic_distance_px, 20.0);
        assert_eq!(c.momentum.friction, 0.98);
        assert_eq!(c.momentum.rest_velocity, 0.1);
        assert_eq!(c.update.check_interval_secs, 60);
        assert_eq!(c.shell.double_tap_window_ms, 300.0);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c = TactileConfig::from_json_str(r#"{"dial":{"notch_deg":10.0}}"#).unwrap();
        assert_eq!(c.dial.notch_deg, 10.0);
        assert_eq!(c.spinner, RotaryConfig::spinner());
    }

    #[test]
    fn partial_dial_section_keeps_dial_notch() {
        let c = TactileConfig::from_json_str(r#"{"dial":{"velocity_frame_ms":20.0}}"#).unwrap();
        assert_eq!(c.dial.notch_deg, 15.0);
        assert_eq!(c.dial.velocity_frame_ms, 20.0);

        let c = TactileConfig::from_json_str(r#"{"spinner":{}}"#).unwrap();
        assert_eq!(c.spinner, RotaryConfig::spinner());
        assert_eq!(c.dial, RotaryConfig::dial());
    }

    #[test]
    fn config_survives_a_json_round_trip() {
        let c = TactileConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(TactileConfig::from_json_str(&json).unwrap(), c);
    }

    #[test]
    fn invalid_json_values_are_reported() {
        let err = TactileConfig::from_json_str(
            r#"{"momentum":{"friction":1.5},"slider":{"min_percent":80.0,"max_percent":20.0}}"#,
        )
        .unwrap_err();
        let ConfigError::Invalid { problems } = err else {
            panic!("expected validation failure, got {err:?}");
        };
        assert!(problems.iter().any(|p| p.starts_with("momentum.friction")));
        assert!(problems.iter().any(|p| p.starts_with("slider.min_percent")));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            TactileConfig::from_json_str("{"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn nan_thresholds_are_rejected() {
        let mut c = TactileConfig::default();
        c.spinner.notch_deg = f64::NAN;
        assert_eq!(c.validate().len(), 1);
    }

    #[cfg(feature = "config-toml")]
    #[test]
    fn toml_sections_override_defaults() {
        let c = TactileConfig::from_toml_str(
            "[update]\ncheck_interval_secs = 120\n[roll]\nvisual_scale = 1.0\n",
        )
        .unwrap();
        assert_eq!(c.update.check_interval_secs, 120);
        assert_eq!(c.roll.visual_scale, 1.0);
        assert_eq!(c.roll.haptic_distance_px, 20.0);
    }

    #[cfg(feature = "config-toml")]
    #[test]
    fn toml_partial_dial_keeps_dial_notch() {
        let c = TactileConfig::from_toml_str("[dial]
velocity_frame_ms = 8.0
").unwrap();
        assert_eq!(c.dial.notch_deg, 15.0);
        assert_eq!(c.dial.velocity_frame_ms, 8.0);
    }
}
