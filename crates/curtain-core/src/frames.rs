#![forbid(unsafe_code)]

//! Frame index and fade derivation for image-sequence intros.
//!
//! A [`FrameWindow`] maps progress onto `frame_count` frames and computes the
//! overlay fade that ramps over the trailing `fade_lead` frames. A
//! [`FrameTracker`] suppresses redundant re-renders when sub-frame progress
//! changes land on the same index.

/// Frame derivation for a non-empty sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameWindow {
    frame_count: usize,
    fade_lead: usize,
}

/// Frame index and fade opacity for one progress sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSample {
    pub index: usize,
    pub opacity: f32,
}

impl FrameWindow {
    /// Returns `None` for an empty sequence; callers skip frame derivation.
    pub fn new(frame_count: usize, fade_lead: usize) -> Option<Self> {
        (frame_count > 0).then_some(Self {
            frame_count,
            fade_lead,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn last_index(&self) -> usize {
        self.frame_count - 1
    }

    /// First frame position of the fade ramp.
    pub fn fade_start(&self) -> usize {
        self.last_index().saturating_sub(self.fade_lead)
    }

    /// Continuous frame position for `progress`.
    pub fn frame_float(&self, progress: f32) -> f32 {
        progress.clamp(0.0, 1.0) * self.last_index() as f32
    }

    /// `round(progress × (N-1))`, clamped to the sequence.
    pub fn frame_index(&self, progress: f32) -> usize {
        (self.frame_float(progress).round() as usize).min(self.last_index())
    }

    /// Overlay opacity: zero until `fade_start`, then a linear ramp that
    /// reaches 1 on the last frame.
    ///
    /// A single-frame sequence has no ramp; it is opaque only at full progress.
    pub fn fade_opacity(&self, progress: f32) -> f32 {
        let last = self.last_index();
        let start = self.fade_start();
        if last == start {
            return if progress >= 1.0 { 1.0 } else { 0.0 };
        }
        let pos = self.frame_float(progress);
        if pos <= start as f32 {
            return 0.0;
        }
        ((pos - start as f32) / (last - start) as f32).clamp(0.0, 1.0)
    }

    pub fn sample(&self, progress: f32) -> FrameSample {
        FrameSample {
            index: self.frame_index(progress),
            opacity: self.fade_opacity(progress),
        }
    }
}

/// Remembers the last rendered frame index.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameTracker {
    last: Option<usize>,
}

impl FrameTracker {
    /// Start out as if `index` were already on screen.
    pub fn starting_at(index: usize) -> Self {
        Self { last: Some(index) }
    }

    /// Record `index`; returns it only if it differs from the previous one.
    pub fn update(&mut self, index: usize) -> Option<usize> {
        if self.last == Some(index) {
            None
        } else {
            self.last = Some(index);
            Some(index)
        }
    }

    pub fn current(&self) -> Option<usize> {
        self.last
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
