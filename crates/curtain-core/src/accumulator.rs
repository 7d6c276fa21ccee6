#![forbid(unsafe_code)]

//! Conversion of raw input deltas into bounded progress.
//!
//! # Invariants
//!
//! 1. Progress is always in [0, 1], whatever the input sequence.
//! 2. Non-finite deltas are dropped.
//! 3. A touch drag downward (`y` increasing) decreases progress, matching
//!    natural scrolling.
//! 4. While inert, every delta is ignored; touch tracking still updates so a
//!    later activation does not see a stale start position.

use crate::event::{InputSource, IntroKey};

/// Per-source scale factors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sensitivity {
    /// Progress per wheel `deltaY` unit.
    pub wheel: f32,
    /// Progress per touch pixel.
    pub touch: f32,
    /// Progress per key press.
    pub key_step: f32,
}

impl Default for Sensitivity {
    fn default() -> Self {
        Self {
            wheel: 0.0006,
            touch: 0.003,
            key_step: 0.04,
        }
    }
}

impl Sensitivity {
    fn scale(&self, source: InputSource) -> f32 {
        match source {
            InputSource::Wheel => self.wheel,
            InputSource::Touch => self.touch,
            InputSource::Key => 1.0,
        }
    }
}

/// Accumulates deltas into a clamped progress value.
#[derive(Debug, Clone)]
pub struct ProgressAccumulator {
    progress: f32,
    sensitivity: Sensitivity,
    touch_last_y: Option<f32>,
    inert: bool,
}

impl ProgressAccumulator {
    pub fn new(sensitivity: Sensitivity, initial: f32) -> Self {
        Self {
            progress: clamp_unit(initial),
            sensitivity,
            touch_last_y: None,
            inert: false,
        }
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Overwrite progress (re-entry, host reset).
    pub fn set_progress(&mut self, progress: f32) {
        self.progress = clamp_unit(progress);
    }

    pub fn is_inert(&self) -> bool {
        self.inert
    }

    pub fn set_inert(&mut self, inert: bool) {
        self.inert = inert;
    }

    /// Scale `raw` by the source's sensitivity and add it to progress.
    pub fn apply_delta(&mut self, raw: f32, source: InputSource) {
        if self.inert || !raw.is_finite() {
            return;
        }
        let scaled = raw * self.sensitivity.scale(source);
        self.progress = clamp_unit(self.progress + scaled);
    }

    pub fn touch_start(&mut self, y: f32) {
        if y.is_finite() {
            self.touch_last_y = Some(y);
        }
    }

    /// Apply the movement since the previous touch position.
    ///
    /// A move with no recorded start seeds the tracker and applies nothing.
    pub fn touch_move(&mut self, y: f32) {
        if !y.is_finite() {
            return;
        }
        let previous = self.touch_last_y.replace(y).unwrap_or(y);
        self.apply_delta(previous - y, InputSource::Touch);
    }

    pub fn touch_end(&mut self) {
        self.touch_last_y = None;
    }

    /// Apply a fixed step for navigation keys. Returns whether the key is one
    /// the intro handles.
    pub fn key(&mut self, key: IntroKey) -> bool {
        let direction = key.direction();
        if direction == 0 {
            return false;
        }
        self.apply_delta(
            f32::from(direction) * self.sensitivity.key_step,
            InputSource::Key,
        );
        true
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
