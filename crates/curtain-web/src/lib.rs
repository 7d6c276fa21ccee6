#![forbid(unsafe_code)]

//! `curtain-web` runs the scroll intro inside a host page.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment (JS) pushes input events
//!   and registers listeners on request.
//! - **Deterministic time**: the host advances a monotonic clock explicitly.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! The state machine lives in `curtain-core`; this crate adds the DOM-shaped
//! input schema, the presentation adapters, the mounted [`session`], the
//! host-page [`stage`] that hides and re-mounts the intro, and an in-memory
//! [`page`] used by tests and the replay harness.

pub mod input;
pub mod page;
pub mod presentation;
pub mod reentry;
pub mod session;
pub mod stage;

#[cfg(target_arch = "wasm32")]
mod wasm;

/// JS entry point. Native hosts drive [`stage::Stage`] directly.
#[cfg(target_arch = "wasm32")]
pub use wasm::CurtainIntro;

use core::time::Duration;

use bitflags::bitflags;

/// Web host error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The host refused to register a listener.
    ListenerRegistration(String),
    /// Generic unsupported operation.
    Unsupported(&'static str),
}

impl core::fmt::Display for HostError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ListenerRegistration(msg) => write!(f, "listener registration failed: {msg}"),
            Self::Unsupported(msg) => write!(f, "unsupported: {msg}"),
        }
    }
}

impl std::error::Error for HostError {}

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }

    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }
}

bitflags! {
    /// DOM event types a listener registration covers.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ListenerKinds: u8 {
        const WHEEL        = 0b00_0001;
        const TOUCH_START  = 0b00_0010;
        const TOUCH_MOVE   = 0b00_0100;
        const TOUCH_END    = 0b00_1000;
        const KEY_DOWN     = 0b01_0000;
        const TOUCH_CANCEL = 0b10_0000;
    }
}

impl ListenerKinds {
    /// Listeners that must be able to `preventDefault`.
    pub const BLOCKING: Self = Self::WHEEL
        .union(Self::TOUCH_MOVE)
        .union(Self::KEY_DOWN);
    /// Listeners that only observe.
    pub const OBSERVING: Self = Self::TOUCH_START
        .union(Self::TOUCH_END)
        .union(Self::TOUCH_CANCEL);
    /// Everything the intro overlay listens to.
    pub const INTRO: Self = Self::BLOCKING.union(Self::OBSERVING);
    /// What the hidden-intro re-entry watcher listens to.
    pub const REENTRY: Self = Self::WHEEL
        .union(Self::TOUCH_START)
        .union(Self::TOUCH_MOVE)
        .union(Self::TOUCH_END)
        .union(Self::TOUCH_CANCEL);

    /// DOM event type names, in bit order.
    pub fn dom_names(self) -> Vec<&'static str> {
        [
            (Self::WHEEL, "wheel"),
            (Self::TOUCH_START, "touchstart"),
            (Self::TOUCH_MOVE, "touchmove"),
            (Self::TOUCH_END, "touchend"),
            (Self::KEY_DOWN, "keydown"),
            (Self::TOUCH_CANCEL, "touchcancel"),
        ]
        .into_iter()
        .filter(|(kind, _)| self.contains(*kind))
        .map(|(_, name)| name)
        .collect()
    }
}

/// `addEventListener` options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerOptions {
    /// Passive listeners cannot cancel the native scroll.
    pub passive: bool,
    pub capture: bool,
}

impl ListenerOptions {
    pub const BLOCKING: Self = Self {
        passive: false,
        capture: true,
    };
    pub const PASSIVE: Self = Self {
        passive: true,
        capture: true,
    };
}

/// Handle returned by [`ListenerHost::attach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u32);

impl ListenerId {
    /// Id from a JS number. `None` unless it is an integer in `u32` range.
    pub fn from_f64(value: f64) -> Option<Self> {
        let integral = value.fract() == 0.0;
        (integral && (0.0..=f64::from(u32::MAX)).contains(&value)).then(|| Self(value as u32))
    }
}

/// Registers DOM listeners on behalf of a session.
///
/// The host forwards events for attached kinds as
/// [`input::InputEvent`]s and honors the returned
/// [`Disposition`](curtain_core::Disposition) for blocking listeners.
pub trait ListenerHost {
    /// Register listeners for `kinds`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the host cannot register them.
    fn attach(
        &mut self,
        kinds: ListenerKinds,
        options: ListenerOptions,
    ) -> Result<ListenerId, HostError>;

    /// Remove a registration. Unknown ids are ignored.
    fn detach(&mut self, id: ListenerId);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deterministic_clock_advances() {
        let mut clock = DeterministicClock::new();
        clock.advance(Duration::from_millis(16));
        clock.advance(Duration::from_millis(16));
        assert_eq!(clock.now(), Duration::from_millis(32));
        clock.advance(Duration::MAX);
        assert_eq!(clock.now(), Duration::MAX);
    }

    #[test]
    fn listener_groups() {
        assert_eq!(
            ListenerKinds::BLOCKING.dom_names(),
            vec!["wheel", "touchmove", "keydown"]
        );
        assert_eq!(ListenerKinds::INTRO, ListenerKinds::all());
        assert!(!ListenerKinds::REENTRY.contains(ListenerKinds::KEY_DOWN));
        assert!(ListenerKinds::OBSERVING.intersection(ListenerKinds::BLOCKING).is_empty());
        assert_eq!(
            ListenerKinds::OBSERVING.dom_names(),
            vec!["touchstart", "touchend", "touchcancel"]
        );
        assert!(ListenerKinds::REENTRY.contains(ListenerKinds::TOUCH_CANCEL));
    }

    #[test]
    fn listener_ids_from_js_numbers() {
        assert_eq!(ListenerId::from_f64(7.0), Some(ListenerId(7)));
        assert_eq!(
            ListenerId::from_f64(f64::from(u32::MAX)),
            Some(ListenerId(u32::MAX))
        );
        assert_eq!(ListenerId::from_f64(-1.0), None);
        assert_eq!(ListenerId::from_f64(2.5), None);
        assert_eq!(ListenerId::from_f64(4_294_967_296.0), None);
        assert_eq!(ListenerId::from_f64(f64::NAN), None);
        assert_eq!(ListenerId::from_f64(f64::INFINITY), None);
    }

    #[test]
    fn host_error_display() {
        assert_eq!(
            HostError::ListenerRegistration("wheel".into()).to_string(),
            "listener registration failed: wheel"
        );
    }
}
