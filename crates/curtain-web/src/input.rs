#![forbid(unsafe_code)]

//! Deterministic, JSON-friendly input schema for `curtain-web`.
//!
//! The web host (JS/TS) forwards DOM events in this shape:
//!
//! ```json
//! {"type":"wheel","delta_y":120.0}
//! {"type":"touch","phase":"move","y":300.0}
//! {"type":"key","key":"ArrowDown"}
//! {"type":"tick","ms":16}
//! {"type":"reenter"}
//! ```
//!
//! `tick` and `reenter` are not DOM events: `tick` is one animation frame and
//! `reenter` is an explicit re-entry request. Both appear in recorded scripts
//! so a replay is fully described by one stream.

use std::time::Duration;

use curtain_core::{IntroKey, IntroMsg};
use serde::{Deserialize, Serialize};

use crate::ListenerKinds;

/// Phase for touch events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchPhase {
    Start,
    Move,
    End,
    Cancel,
}

/// One input record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// `WheelEvent.deltaY`.
    Wheel { delta_y: f32 },
    /// `touches[0].clientY`; ignored for `end`/`cancel`.
    Touch {
        phase: TouchPhase,
        #[serde(default)]
        y: f32,
    },
    /// `KeyboardEvent.key`.
    Key { key: String },
    /// One animation frame of `ms` milliseconds.
    Tick { ms: u64 },
    /// Explicit re-entry request.
    Reenter,
}

impl InputEvent {
    pub fn wheel(delta_y: f32) -> Self {
        Self::Wheel { delta_y }
    }

    pub fn touch(phase: TouchPhase, y: f32) -> Self {
        Self::Touch { phase, y }
    }

    pub fn key(key: impl Into<String>) -> Self {
        Self::Key { key: key.into() }
    }

    pub fn tick(ms: u64) -> Self {
        Self::Tick { ms }
    }

    /// Encode this event as a stable JSON string.
    ///
    /// Errors can occur only if serialization fails (for example, due to an
    /// internal `serde_json` formatting error).
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a previously encoded event JSON string.
    ///
    /// Errors occur if the JSON does not match the expected schema.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// DOM listener kind that delivers this event, if any.
    pub fn listener_kind(&self) -> Option<ListenerKinds> {
        match self {
            Self::Wheel { .. } => Some(ListenerKinds::WHEEL),
            Self::Touch {
                phase: TouchPhase::Start,
                ..
            } => Some(ListenerKinds::TOUCH_START),
            Self::Touch {
                phase: TouchPhase::Move,
                ..
            } => Some(ListenerKinds::TOUCH_MOVE),
            Self::Touch {
                phase: TouchPhase::End,
                ..
            } => Some(ListenerKinds::TOUCH_END),
            Self::Touch {
                phase: TouchPhase::Cancel,
                ..
            } => Some(ListenerKinds::TOUCH_CANCEL),
            Self::Key { .. } => Some(ListenerKinds::KEY_DOWN),
            Self::Tick { .. } | Self::Reenter => None,
        }
    }

    /// Translate into a controller message.
    pub fn to_msg(&self) -> IntroMsg {
        match self {
            Self::Wheel { delta_y } => IntroMsg::Wheel { delta_y: *delta_y },
            Self::Touch {
                phase: TouchPhase::Start,
                y,
            } => IntroMsg::TouchStart { y: *y },
            Self::Touch {
                phase: TouchPhase::Move,
                y,
            } => IntroMsg::TouchMove { y: *y },
            Self::Touch { .. } => IntroMsg::TouchEnd,
            Self::Key { key } => IntroMsg::Key(normalize_dom_key(key)),
            Self::Tick { ms } => IntroMsg::Frame(Duration::from_millis(*ms)),
            Self::Reenter => IntroMsg::Reenter,
        }
    }
}

/// Map a DOM `KeyboardEvent.key` value onto the keys the intro handles.
pub fn normalize_dom_key(key: &str) -> IntroKey {
    match key {
        "ArrowDown" | "Down" => IntroKey::ArrowDown,
        "ArrowUp" | "Up" => IntroKey::ArrowUp,
        "PageDown" => IntroKey::PageDown,
        "PageUp" => IntroKey::PageUp,
        " " | "Space" | "Spacebar" => IntroKey::Space,
        _ => IntroKey::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn json_shapes_are_stable() {
        assert_eq!(
            InputEvent::wheel(120.0).to_json_string().unwrap(),
            r#"{"type":"wheel","delta_y":120.0}"#
        );
        assert_eq!(
            InputEvent::touch(TouchPhase::Move, 300.0)
                .to_json_string()
                .unwrap(),
            r#"{"type":"touch","phase":"move","y":300.0}"#
        );
        assert_eq!(
            InputEvent::Reenter.to_json_string().unwrap(),
            r#"{"type":"reenter"}"#
        );
    }

    #[test]
    fn decodes_hand_written_records() {
        assert_eq!(
            InputEvent::from_json_str(r#"{"type":"touch","phase":"end"}"#).unwrap(),
            InputEvent::touch(TouchPhase::End, 0.0)
        );
        assert_eq!(
            InputEvent::from_json_str(r#"{"type":"key","key":" "}"#).unwrap(),
            InputEvent::key(" ")
        );
        assert_eq!(
            InputEvent::from_json_str(r#"{"type":"tick","ms":16}"#).unwrap(),
            InputEvent::tick(16)
        );
        assert!(InputEvent::from_json_str(r#"{"type":"scroll"}"#).is_err());
    }

    #[test]
    fn dom_keys_normalize() {
        assert_eq!(normalize_dom_key("ArrowDown"), IntroKey::ArrowDown);
        assert_eq!(normalize_dom_key(" "), IntroKey::Space);
        assert_eq!(normalize_dom_key("PageUp"), IntroKey::PageUp);
        assert_eq!(normalize_dom_key("Enter"), IntroKey::Other);
    }

    #[test]
    fn messages_and_listener_kinds() {
        assert_eq!(
            InputEvent::touch(TouchPhase::Cancel, 5.0).to_msg(),
            IntroMsg::TouchEnd
        );
        assert_eq!(
            InputEvent::touch(TouchPhase::Cancel, 5.0).listener_kind(),
            Some(ListenerKinds::TOUCH_CANCEL)
        );
        assert_eq!(
            InputEvent::tick(16).to_msg(),
            IntroMsg::Frame(Duration::from_millis(16))
        );
        assert_eq!(InputEvent::tick(16).listener_kind(), None);
    }
}
