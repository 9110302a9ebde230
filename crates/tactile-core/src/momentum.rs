#![forbid(unsafe_code)]

//! Per-frame free-spin physics for the spinner.
//!
//! Each frame, while `|velocity| > rest_velocity`, velocity decays by the
//! friction factor and is added to rotation. At or below the threshold the
//! velocity snaps to exactly zero and stays there until a new gesture seeds
//! it again.

use crate::config::MomentumConfig;

/// Whether a frame moved the spinner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MomentumState {
    /// Rotation advanced this frame.
    Coasting,
    /// Velocity is zero; nothing moved.
    AtRest,
}

/// Friction integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Momentum {
    friction: f64,
    rest_velocity: f64,
}

impl Momentum {
    #[must_use]
    pub fn new(config: &MomentumConfig) -> Self {
        Self {
            friction: config.friction,
            rest_velocity: config.rest_velocity,
        }
    }

    /// Advance one frame.
    pub fn step(&self, rotation: &mut f64, velocity: &mut f64) -> MomentumState {
        if velocity.abs() > self.rest_velocity {
            *velocity *= self.friction;
            *rotation += *velocity;
            MomentumState::Coasting
        } else {
            *velocity = 0.0;
            MomentumState::AtRest
        }
    }
}

impl Default for Momentum {
    fn default() -> Self {
        Self::new(&MomentumConfig::default())
    }
}
