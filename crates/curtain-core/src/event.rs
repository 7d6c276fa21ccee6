#![forbid(unsafe_code)]

//! Messages dispatched into the intro controller and events it emits.
//!
//! Hosts translate their native input (DOM events, terminal events, replay
//! scripts) into [`IntroMsg`] values and feed them to
//! [`IntroController::dispatch`](crate::controller::IntroController::dispatch).
//! Transitions are queued as [`IntroEvent`]s and drained by the host, so the
//! controller never stores host callbacks.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Origin of a progress delta. Each source has its own sensitivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    Wheel,
    Touch,
    Key,
}

/// Keys the intro reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntroKey {
    ArrowDown,
    ArrowUp,
    PageDown,
    PageUp,
    Space,
    Other,
}

impl IntroKey {
    /// Direction of a key press: `+1` advances, `-1` retreats, `0` ignored.
    pub const fn direction(self) -> i8 {
        match self {
            Self::ArrowDown | Self::PageDown | Self::Space => 1,
            Self::ArrowUp | Self::PageUp => -1,
            Self::Other => 0,
        }
    }
}

/// Input to the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntroMsg {
    /// Raw delta in the source's native units (wheel `deltaY`, touch pixels);
    /// key deltas are already in progress units.
    Delta { value: f32, source: InputSource },
    /// Wheel event with its vertical delta.
    Wheel { delta_y: f32 },
    /// Finger down at `y`.
    TouchStart { y: f32 },
    /// Finger moved to `y`.
    TouchMove { y: f32 },
    /// Finger lifted or the touch was cancelled.
    TouchEnd,
    /// Key press.
    Key(IntroKey),
    /// One animation frame elapsed.
    Frame(Duration),
    /// External request to re-enter a completed intro.
    Reenter,
}

/// Whether the host should suppress the native default action of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The controller owns this input; call `preventDefault`.
    Consumed,
    /// Let the page handle it.
    Ignored,
}

impl Disposition {
    pub const fn is_consumed(self) -> bool {
        matches!(self, Self::Consumed)
    }
}

/// Transition emitted by the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntroEvent {
    /// The sampled progress crossed into another phase band.
    PhaseChanged { from: usize, to: usize },
    /// The displayed frame changed.
    FrameChanged { index: usize },
    /// The fade overlay opacity changed.
    FadeChanged { opacity: f32 },
    /// The completion criterion was met; the settle timer is running.
    CompletionArmed,
    /// Progress dropped before the settle delay elapsed.
    CompletionCancelled,
    /// The intro finished. Emitted once per activation.
    Completed,
    /// A completed, reversible intro was re-entered.
    Reentered,
}
