#![forbid(unsafe_code)]

//! Detects the user scrolling back up into a hidden intro.
//!
//! While the intro is hidden the page scrolls normally. Scrolling up at the
//! very top (a wheel tick with `delta_y < 0`, or a finger dragged down more
//! than [`TOUCH_THRESHOLD_PX`]) is read as a request to replay the intro.
//! Listeners for this are passive; the page keeps its native behavior.

use crate::input::{InputEvent, TouchPhase};

/// Downward drag distance that triggers re-entry.
pub const TOUCH_THRESHOLD_PX: f32 = 40.0;

#[derive(Debug, Clone, Default)]
pub struct ReentryWatcher {
    touch_start: Option<f32>,
}

impl ReentryWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one page event. Returns true when re-entry should happen.
    ///
    /// `scroll_y` is the page offset at the time of the event.
    pub fn observe(&mut self, event: &InputEvent, scroll_y: f64) -> bool {
        let at_top = scroll_y <= 0.0;
        match *event {
            InputEvent::Wheel { delta_y } => at_top && delta_y < 0.0,
            InputEvent::Touch {
                phase: TouchPhase::Start,
                y,
            } => {
                self.touch_start = Some(y);
                false
            }
            InputEvent::Touch {
                phase: TouchPhase::Move,
                y,
            } => {
                // A move without a start belongs to a gesture that began on
                // the intro itself.
                let Some(start) = self.touch_start else {
                    return false;
                };
                if at_top && y > start + TOUCH_THRESHOLD_PX {
                    self.touch_start = None;
                    true
                } else {
                    false
                }
            }
            InputEvent::Touch { .. } => {
                self.touch_start = None;
                false
            }
            InputEvent::Key { .. } | InputEvent::Tick { .. } | InputEvent::Reenter => false,
        }
    }

    /// Forget any gesture in progress.
    pub fn reset(&mut self) {
        self.touch_start = None;
    }
}
