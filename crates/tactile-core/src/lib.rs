#![forbid(unsafe_code)]

//! Core: gesture tracking, haptic feedback, and offline update lifecycle.
//!
//! # Role in Tactile
//! `tactile-core` owns every piece of behavior that does not touch the DOM.
//! The wasm shell (`tactile-web`) converts browser pointer events into
//! [`tracker::PointerSample`] values, forwards them to a
//! [`engine::TactileEngine`], and applies the resulting visuals and haptic
//! requests.
//!
//! # Primary responsibilities
//! - **Zone trackers**: six gesture state machines built from two generic
//!   motions (rotational, linear) plus roll, press and toggle.
//! - **Haptics**: pattern catalog, tier mapping, and the activation-gated
//!   adapter with rich/pattern fallback.
//! - **Momentum**: per-frame spinner friction.
//! - **Update lifecycle**: offline worker state machine emitting host
//!   commands (banner, skip-waiting, reload).
//!
//! Everything here is host-driven and deterministic: timestamps come from the
//! caller, and no function blocks or spawns.

pub mod config;
pub mod double_tap;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod haptics;
pub mod logging;
pub mod momentum;
pub mod tracker;
pub mod update;
pub mod worker;
pub mod zone;

pub use config::TactileConfig;
pub use engine::TactileEngine;
pub use error::{ConfigError, PlatformError};
pub use haptics::{HapticAdapter, HapticBackend, HapticOutcome, HapticPattern, ImpactTier};
pub use zone::ZoneKind;
