#![forbid(unsafe_code)]

//! Zone identity and the visual state each zone exposes to the host.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// One of the six interactive regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    Spinner,
    Slider,
    Click,
    Dial,
    Toggle,
    Roll,
}

impl ZoneKind {
    pub const ALL: [Self; 6] = [
        Self::Spinner,
        Self::Slider,
        Self::Click,
        Self::Dial,
        Self::Toggle,
        Self::Roll,
    ];

    /// Value of the `data-zone` attribute identifying this region.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spinner => "spinner",
            Self::Slider => "slider",
            Self::Click => "click",
            Self::Dial => "dial",
            Self::Toggle => "toggle",
            Self::Roll => "roll",
        }
    }

    /// Whether the zone tracks a drag (down → move → up).
    #[must_use]
    pub const fn is_draggable(self) -> bool {
        !matches!(self, Self::Toggle | Self::Click)
    }
}

impl fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown `data-zone` attribute value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown zone: {0:?}")]
pub struct UnknownZone(pub String);

impl FromStr for ZoneKind {
    type Err = UnknownZone;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownZone(s.to_owned()))
    }
}

bitflags! {
    /// Styling flags the host maps onto CSS classes.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ZoneFlags: u8 {
        /// A gesture is in progress (`.active`).
        const ACTIVE  = 0b001;
        /// The click button is held (`.pressed`).
        const PRESSED = 0b010;
        /// The toggle is on (`.on`).
        const ON      = 0b100;
    }
}

impl ZoneFlags {
    /// CSS class names paired with each flag.
    pub const CLASSES: [(Self, &'static str); 3] = [
        (Self::ACTIVE, "active"),
        (Self::PRESSED, "pressed"),
        (Self::ON, "on"),
    ];
}

/// Continuous visual state of one zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ZoneVisual {
    /// Spinner and dial: unbounded rotation in degrees.
    Rotation { degrees: f64 },
    /// Slider knob position in percent of the track.
    Slider { percent: f64 },
    /// Click button.
    Press { pressed: bool },
    /// Toggle switch.
    Switch { on: bool },
    /// Roll ball: accumulated displacement and derived tilt in degrees.
    Roll {
        x: f64,
        y: f64,
        tilt_x: f64,
        tilt_y: f64,
    },
}

impl ZoneVisual {
    /// CSS `transform` value for the zone's moving element, if it has one.
    #[must_use]
    pub fn css_transform(&self) -> Option<String> {
        match *self {
            Self::Rotation { degrees } => Some(format!("rotate({degrees}deg)")),
            Self::Roll { tilt_x, tilt_y, .. } => {
                Some(format!("rotateX({tilt_x}deg) rotateY({tilt_y}deg)"))
            }
            Self::Slider { .. } | Self::Press { .. } | Self::Switch { .. } => None,
        }
    }

    /// CSS `left` value for the slider knob.
    #[must_use]
    pub fn css_left(&self) -> Option<String> {
        match *self {
            Self::Slider { percent } => Some(format!("{percent}%")),
            _ => None,
        }
    }
}

/// Serializable view of one zone for rendering and tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneSnapshot {
    pub zone: ZoneKind,
    pub flags: ZoneFlags,
    pub visual: ZoneVisual,
}
