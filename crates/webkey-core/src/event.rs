//! Input events accepted from the browser and replayed on the host.
//!
//! Events are decoded once at the transport boundary (see
//! [`crate::protocol`]) into [`InputEvent`], so the dispatcher matches on a
//! closed, exhaustive set instead of comparing string tags.
//!
//! Key names stay as received: they are resolved against the key table only
//! when the event is applied, so an unknown name fails that single event and
//! not the request or batch that carried it.

use serde::{Deserialize, Serialize};

/// Pointer buttons the browser can press.
///
/// Missing `button` fields decode as [`MouseButton::Left`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

impl MouseButton {
    /// Wire name of the button (`"left"`, `"right"`, `"middle"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        }
    }
}

/// Whether a key event presses or releases the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAction {
    Down,
    Up,
}

/// One unit of input to replay on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Relative pointer displacement in pixels.
    Move { dx: i32, dy: i32 },
    /// Press and immediately release a button.
    Click { button: MouseButton },
    /// Press a button and keep it held.
    Press { button: MouseButton },
    /// Release a held button.
    Release { button: MouseButton },
    /// Wheel movement in ticks.  Positive `dy` scrolls up, positive `dx` right.
    Scroll { dx: i32, dy: i32 },
    /// Press or release a key given by symbolic name or literal character.
    Key { key: String, action: KeyAction },
    /// Type a string as a sequence of character inserts.
    Text { text: String },
}

impl InputEvent {
    /// Short name of the variant, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            InputEvent::Move { .. } => "move",
            InputEvent::Click { .. } => "click",
            InputEvent::Press { .. } => "press",
            InputEvent::Release { .. } => "release",
            InputEvent::Scroll { .. } => "scroll",
            InputEvent::Key { .. } => "key",
            InputEvent::Text { .. } => "text",
        }
    }

    /// Convenience constructor for key events.
    pub fn key(key: impl Into<String>, action: KeyAction) -> Self {
        InputEvent::Key {
            key: key.into(),
            action,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
