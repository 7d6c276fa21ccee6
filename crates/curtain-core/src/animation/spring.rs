#![forbid(unsafe_code)]

//! Damped spring used to smooth the sampled intro progress.
//!
//! Wheel events arrive in bursts; feeding raw progress straight into frame
//! selection makes the image sequence jump. The spring follows the raw value
//! and the controller samples the spring instead.
//!
//! # Invariants
//!
//! 1. The spring never writes to the raw progress it follows.
//! 2. Once within [`SETTLE_EPSILON`] of the target (position and velocity),
//!    the position snaps exactly onto the target and the spring reports
//!    [`is_complete`](super::Animation::is_complete).
//! 3. Integration uses fixed sub-steps, so a long host frame gives the same
//!    result as several short ones.
//! 4. The sub-step is semi-implicit Euler no longer than
//!    [`SpringConfig::stable_step`], which keeps stiff or heavily damped
//!    springs bounded. A non-finite state snaps onto the target.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::Animation;

/// Position/velocity tolerance below which the spring snaps to its target.
pub const SETTLE_EPSILON: f32 = 1e-3;

/// Default integration step (240 Hz).
const SUBSTEP: f32 = 1.0 / 240.0;

/// Shortest step a valid config may need. Bounds the sub-steps per tick.
pub const MIN_SUBSTEP: f32 = 1.0e-5;

/// Upper bound on simulated time per tick; a stalled tab should not
/// integrate seconds of physics in one frame.
const MAX_TICK: Duration = Duration::from_millis(250);

/// Spring constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    pub stiffness: f32,
    pub damping: f32,
    pub mass: f32,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: 120.0,
            damping: 28.0,
            mass: 0.35,
        }
    }
}

impl SpringConfig {
    /// Integration step for these constants: at most 1/240 s, short enough
    /// that `step * damping / mass <= 1` and `step * sqrt(stiffness / mass) <= 1`.
    pub fn stable_step(&self) -> f32 {
        let natural = (self.mass / self.stiffness).sqrt();
        let damped = self.mass / self.damping;
        SUBSTEP.min(natural).min(damped)
    }

    /// Whether all constants are finite and strictly positive and the spring
    /// can be integrated with a step of at least [`MIN_SUBSTEP`].
    pub fn is_valid(&self) -> bool {
        [self.stiffness, self.damping, self.mass]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
            && self.stable_step() >= MIN_SUBSTEP
    }
}

/// A damped spring following a target in [0, 1].
#[derive(Debug, Clone, Copy)]
pub struct Spring {
    config: SpringConfig,
    position: f32,
    velocity: f32,
    target: f32,
}

impl Spring {
    /// Create a spring at rest on `initial`.
    pub fn new(config: SpringConfig, initial: f32) -> Self {
        let initial = initial.clamp(0.0, 1.0);
        Self {
            config,
            position: initial,
            velocity: 0.0,
            target: initial,
        }
    }

    /// Set the value the spring moves towards.
    pub fn set_target(&mut self, target: f32) {
        if target.is_finite() {
            self.target = target.clamp(0.0, 1.0);
        }
    }

    /// Current target.
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Jump to `value` and stop moving.
    pub fn snap_to(&mut self, value: f32) {
        let value = value.clamp(0.0, 1.0);
        self.position = value;
        self.target = value;
        self.velocity = 0.0;
    }

    /// Unclamped position (may overshoot slightly for underdamped configs).
    pub fn position(&self) -> f32 {
        self.position
    }

    fn substep(&mut self, dt: f32) {
        let SpringConfig {
            stiffness,
            damping,
            mass,
        } = self.config;
        let force = -stiffness * (self.position - self.target) - damping * self.velocity;
        self.velocity += force / mass * dt;
        self.position += self.velocity * dt;
        if !(self.position.is_finite() && self.velocity.is_finite()) {
            crate::warn!(goal = self.target, "spring diverged, snapping to target");
            self.position = self.target;
            self.velocity = 0.0;
        }
    }

    fn settle_if_close(&mut self) -> bool {
        if (self.position - self.target).abs() < SETTLE_EPSILON
            && self.velocity.abs() < SETTLE_EPSILON
        {
            self.position = self.target;
            self.velocity = 0.0;
            true
        } else {
            false
        }
    }
}

impl Animation for Spring {
    fn tick(&mut self, dt: Duration) {
        if self.is_complete() {
            return;
        }
        let max_step = self.config.stable_step().max(MIN_SUBSTEP);
        let mut remaining = dt.min(MAX_TICK).as_secs_f32();
        while remaining > 0.0 {
            let step = remaining.min(max_step);
            self.substep(step);
            remaining -= step;
            if self.settle_if_close() {
                break;
            }
        }
    }

    fn is_complete(&self) -> bool {
        self.position == self.target && self.velocity == 0.0
    }

    fn value(&self) -> f32 {
        self.position.clamp(0.0, 1.0)
    }

    fn reset(&mut self) {
        self.snap_to(0.0);
    }
}
