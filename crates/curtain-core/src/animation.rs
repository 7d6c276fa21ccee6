#![forbid(unsafe_code)]

//! Progress-driven animation primitives.
//!
//! Two families live here:
//!
//! - **Windowed curves** ([`curve`], [`elastic_curve`], [`peak`]) map the intro
//!   progress onto a sub-range and shape it. They are pure: the same progress
//!   always yields the same value, so scrolling backwards replays the
//!   animation in reverse.
//! - **Time-based animations** implementing [`Animation`] ([`Fade`] and
//!   [`spring::Spring`]) advance with host-supplied `dt` and are used for the
//!   exit fade and for smoothing bursty wheel input.

pub mod spring;

use std::f32::consts::PI;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Easing functions
// ---------------------------------------------------------------------------

/// Easing function signature: maps `t` in [0, 1] to output (nominally [0, 1]).
pub type EasingFn = fn(f32) -> f32;

/// Identity easing (constant velocity).
#[inline]
pub fn linear(t: f32) -> f32 {
    t.clamp(0.0, 1.0)
}

/// Cubic ease-in-out (slow start and end).
#[inline]
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Elastic ease-out. Overshoots past 1.0 before settling.
#[inline]
pub fn ease_out_elastic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t == 0.0 {
        return 0.0;
    }
    if t == 1.0 {
        return 1.0;
    }
    let c4 = (2.0 * PI) / 3.0;
    2f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
}

// ---------------------------------------------------------------------------
// Windowed progress curves
// ---------------------------------------------------------------------------

/// Position of `progress` within `[start, end]` as `Ok(t)`, or the edge value
/// (`Err(0.0)` before the window, `Err(1.0)` after it).
///
/// A degenerate window (`end <= start`) acts as a step at `end`.
fn window(progress: f32, start: f32, end: f32) -> Result<f32, f32> {
    if progress < start {
        return Err(0.0);
    }
    if progress > end || end <= start {
        return if progress >= end { Err(1.0) } else { Err(0.0) };
    }
    Ok((progress - start) / (end - start))
}

/// Cubic ease-in-out of `progress` over `[start, end]`.
///
/// Returns 0 before the window and 1 after it.
pub fn curve(progress: f32, start: f32, end: f32) -> f32 {
    match window(progress, start, end) {
        Ok(t) => ease_in_out_cubic(t),
        Err(edge) => edge,
    }
}

/// Elastic overshoot of `progress` over `[start, end]`.
///
/// Returns 0 before the window and 1 after it; inside the window the value
/// briefly exceeds 1. Clamp the result before using it as an opacity.
pub fn elastic_curve(progress: f32, start: f32, end: f32) -> f32 {
    match window(progress, start, end) {
        Ok(t) => ease_out_elastic(t),
        Err(edge) => edge,
    }
}

/// Triangular window: 0 at `start`, rising linearly to 1 at `apex`, falling
/// linearly back to 0 at `end`. Zero outside `[start, end]`.
pub fn peak(progress: f32, start: f32, apex: f32, end: f32) -> f32 {
    if !(start..=end).contains(&progress) {
        return 0.0;
    }
    if progress <= apex {
        if apex <= start {
            return 1.0;
        }
        ((progress - start) / (apex - start)).clamp(0.0, 1.0)
    } else {
        if end <= apex {
            return 0.0;
        }
        (1.0 - (progress - apex) / (end - apex)).clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Animation trait
// ---------------------------------------------------------------------------

/// A time-based animation producing values in [0.0, 1.0].
pub trait Animation {
    /// Advance the animation by `dt`.
    fn tick(&mut self, dt: Duration);

    /// Whether the animation has reached its end.
    fn is_complete(&self) -> bool;

    /// Current output value, clamped to [0.0, 1.0].
    fn value(&self) -> f32;

    /// Reset the animation to its initial state.
    fn reset(&mut self);
}

// ---------------------------------------------------------------------------
// Fade
// ---------------------------------------------------------------------------

/// Progression from 0.0 to 1.0 over a fixed duration, with configurable easing.
///
/// Elapsed time is tracked as a [`Duration`] so long runs of small ticks do
/// not drift.
#[derive(Debug, Clone, Copy)]
pub struct Fade {
    elapsed: Duration,
    duration: Duration,
    easing: EasingFn,
}

impl Fade {
    /// Create a fade with the given duration and linear easing.
    pub fn new(duration: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            duration: if duration.is_zero() {
                Duration::from_nanos(1)
            } else {
                duration
            },
            easing: linear,
        }
    }

    /// Set the easing function.
    pub fn easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    /// Linear progress before easing, in [0.0, 1.0].
    pub fn raw_progress(&self) -> f32 {
        let t = self.elapsed.as_secs_f64() / self.duration.as_secs_f64();
        (t as f32).clamp(0.0, 1.0)
    }
}

impl Animation for Fade {
    fn tick(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn value(&self) -> f32 {
        (self.easing)(self.raw_progress()).clamp(0.0, 1.0)
    }

    fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }
}
