//! Request and reply bodies.
//!
//! Every HTTP reply is a JSON object with a `status` of `"success"` or
//! `"error"`:
//!
//! ```json
//! {"status": "success", "token": "5b1f…"}
//! {"status": "error", "message": "Invalid or expired PIN"}
//! ```
//!
//! Payload types decode with the same leniency the browser client relies on:
//! a missing `dx`/`dy` is `0`, a missing `button` is `left`, and fractional
//! deltas from touch input are rounded to whole pixels.

use serde::{Deserialize, Deserializer, Serialize};

use crate::event::{InputEvent, KeyAction, MouseButton};

/// Reply message for a wrong, reused or expired PIN.
pub const INVALID_PIN_MESSAGE: &str = "Invalid or expired PIN";

/// Reply message when the bearer token is missing or unknown.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

/// Body of `POST /auth/pin`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PinAuthRequest {
    #[serde(default)]
    pub pin: Option<String>,
}

/// The `{"status": ...}` envelope of every HTTP reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ApiReply {
    Success {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },
    Error { message: String },
}

impl ApiReply {
    /// A bare `{"status": "success"}`.
    pub fn ok() -> Self {
        ApiReply::Success { token: None }
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        ApiReply::Success {
            token: Some(token.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ApiReply::Error {
            message: message.into(),
        }
    }

    pub fn invalid_pin() -> Self {
        Self::error(INVALID_PIN_MESSAGE)
    }

    pub fn unauthorized() -> Self {
        Self::error(UNAUTHORIZED_MESSAGE)
    }
}

// ── Event payloads ────────────────────────────────────────────────────────────

/// Payload of a `text_event` frame.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TextEventPayload {
    pub text: String,
}

/// Payload of a `key_event` frame and body of `POST /key_event`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct KeyEventPayload {
    pub key: String,
    pub action: KeyAction,
}

impl From<KeyEventPayload> for InputEvent {
    fn from(payload: KeyEventPayload) -> Self {
        InputEvent::Key {
            key: payload.key,
            action: payload.action,
        }
    }
}

/// Payload of a `mouse_event` frame, discriminated by its `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MouseEventPayload {
    Move {
        #[serde(default, deserialize_with = "pixel_delta")]
        dx: i32,
        #[serde(default, deserialize_with = "pixel_delta")]
        dy: i32,
    },
    Click {
        #[serde(default)]
        button: MouseButton,
    },
    Press {
        #[serde(default)]
        button: MouseButton,
    },
    Release {
        #[serde(default)]
        button: MouseButton,
    },
    Scroll {
        #[serde(default, deserialize_with = "pixel_delta")]
        dx: i32,
        #[serde(default, deserialize_with = "pixel_delta")]
        dy: i32,
    },
}

impl From<MouseEventPayload> for InputEvent {
    fn from(payload: MouseEventPayload) -> Self {
        match payload {
            MouseEventPayload::Move { dx, dy } => InputEvent::Move { dx, dy },
            MouseEventPayload::Click { button } => InputEvent::Click { button },
            MouseEventPayload::Press { button } => InputEvent::Press { button },
            MouseEventPayload::Release { button } => InputEvent::Release { button },
            MouseEventPayload::Scroll { dx, dy } => InputEvent::Scroll { dx, dy },
        }
    }
}

/// Accepts integer or fractional JSON numbers, rounding and saturating to `i32`.
fn pixel_delta<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() {
        return Err(serde::de::Error::custom("delta must be a finite number"));
    }
    // `as` saturates at the i32 bounds.
    Ok(raw.round() as i32)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
