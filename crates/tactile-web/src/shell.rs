#![forbid(unsafe_code)]

//! DOM-independent half of the browser shell.
//!
//! Event naming, sample construction, config/log-level discovery, and the
//! per-frame paint diff live here so native tests can cover them. The wasm
//! module only moves values between these helpers and `web-sys`.

use std::collections::HashMap;

use tactile_core::engine::EngineSnapshot;
use tactile_core::geometry::{Bounds, Point};
use tactile_core::logging::{DEFAULT_LEVEL, level_from_str};
use tactile_core::tracker::PointerSample;
use tactile_core::update::{UpdateCommand, UpdateController};
use tactile_core::zone::{ZoneFlags, ZoneSnapshot};
use tactile_core::{TactileConfig, ZoneKind};
use tracing::{Level, warn};

/// Attribute naming a zone element.
pub const ZONE_ATTR: &str = "data-zone";
/// Attribute marking the child element that moves (knob, disc, ball).
pub const VISUAL_ATTR: &str = "data-visual";
/// Id of the optional `<script type="application/json">` config block.
pub const CONFIG_ELEMENT_ID: &str = "tactile-config";
/// Id of the update banner element.
pub const BANNER_ID: &str = "update-banner";
/// Attribute naming the action of an update banner button.
pub const BANNER_ACTION_ATTR: &str = "data-banner-action";
/// Matches banner buttons from any click target inside them.
pub const BANNER_ACTION_SELECTOR: &str = "#update-banner [data-banner-action]";
/// Taps on these never count as background taps.
pub const CONTROL_SELECTOR: &str = "[data-zone], #update-banner";

/// Buttons on the update banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BannerAction {
    Update,
    Later,
}

impl BannerAction {
    pub const ALL: [Self; 2] = [Self::Update, Self::Later];

    /// Value stored in [`BANNER_ACTION_ATTR`].
    #[must_use]
    pub const fn attr_value(self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Later => "later",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Update => "Update",
            Self::Later => "Later",
        }
    }

    #[must_use]
    pub fn from_attr(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.attr_value() == value)
    }

    /// Forward the click to the update controller.
    pub fn dispatch(self, update: &mut UpdateController) -> Vec<UpdateCommand> {
        match self {
            Self::Update => update.accept(),
            Self::Later => update.dismiss(),
        }
    }
}

/// Pointer events a zone listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneEvent {
    Down,
    Move,
    Up,
    Cancel,
}

impl ZoneEvent {
    pub const ALL: [Self; 4] = [Self::Down, Self::Move, Self::Up, Self::Cancel];

    #[must_use]
    pub const fn dom_name(self) -> &'static str {
        match self {
            Self::Down => "pointerdown",
            Self::Move => "pointermove",
            Self::Up => "pointerup",
            Self::Cancel => "pointercancel",
        }
    }

    #[must_use]
    pub fn from_dom_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.dom_name() == name)
    }
}

/// Build a sample from raw DOM numbers. Negative pointer ids are rejected.
#[must_use]
pub fn sample_from_dom(
    pointer_id: i32,
    client_x: f64,
    client_y: f64,
    rect: (f64, f64, f64, f64),
    timestamp_ms: f64,
) -> Option<PointerSample> {
    let pointer_id = u32::try_from(pointer_id).ok()?;
    let (left, top, width, height) = rect;
    Some(PointerSample::new(
        pointer_id,
        Point::new(client_x, client_y),
        Bounds::new(left, top, width, height),
        timestamp_ms,
    ))
}

/// Log level from a `location.search` string (`?log=debug`).
#[must_use]
pub fn log_level_from_query(search: &str) -> Level {
    search
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "log")
        .and_then(|(_, value)| level_from_str(value))
        .unwrap_or(DEFAULT_LEVEL)
}

/// Config from the page's JSON block, falling back to defaults on absence or
/// error.
#[must_use]
pub fn load_config(json: Option<&str>) -> TactileConfig {
    let Some(json) = json.map(str::trim).filter(|s| !s.is_empty()) else {
        return TactileConfig::default();
    };
    match TactileConfig::from_json_str(json) {
        Ok(config) => config,
        Err(err) => {
            warn!(%err, "ignoring page config");
            TactileConfig::default()
        }
    }
}

/// Style writes for one zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZonePaint {
    pub zone: ZoneKind,
    /// New `transform` for the visual element.
    pub transform: Option<String>,
    /// New `left` for the visual element.
    pub left: Option<String>,
    /// Class name and whether it should be present.
    pub classes: Vec<(&'static str, bool)>,
}

impl ZonePaint {
    fn from_snapshot(snapshot: &ZoneSnapshot) -> Self {
        Self {
            zone: snapshot.zone,
            transform: snapshot.visual.css_transform(),
            left: snapshot.visual.css_left(),
            classes: ZoneFlags::CLASSES
                .iter()
                .map(|&(flag, class)| (class, snapshot.flags.contains(flag)))
                .collect(),
        }
    }
}

/// Remembers what was last painted so each frame only touches changed zones.
#[derive(Debug, Default)]
pub struct Painter {
    painted: HashMap<ZoneKind, ZoneSnapshot>,
}

impl Painter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Paints needed to bring the page in line with `snapshot`.
    pub fn plan(&mut self, snapshot: &EngineSnapshot) -> Vec<ZonePaint> {
        let mut out = Vec::new();
        for zone in &snapshot.zones {
            if self.painted.get(&zone.zone) == Some(zone) {
                continue;
            }
            out.push(ZonePaint::from_snapshot(zone));
            self.painted.insert(zone.zone, *zone);
        }
        out
    }

    /// Force a full repaint on the next frame.
    pub fn invalidate(&mut self) {
        self.painted.clear();
    }
}
