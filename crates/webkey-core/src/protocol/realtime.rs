//! Decoding of real-time (WebSocket) frames.
//!
//! Each text frame is one JSON object naming its event and carrying the
//! sender's token next to the event payload:
//!
//! ```json
//! {"event": "text_event",  "token": "…", "text": "hello"}
//! {"event": "key_event",   "token": "…", "key": "enter", "action": "down"}
//! {"event": "mouse_event", "token": "…", "type": "move", "dx": 3, "dy": -1}
//! ```
//!
//! Decoding is split in two so the token can be checked before the payload
//! is looked at: [`RealtimeFrame::parse`] only reads the envelope, and
//! [`RealtimeFrame::into_event`] decodes the payload.  The token is dropped
//! at that point and never reaches the event queue.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::event::InputEvent;
use crate::protocol::messages::{KeyEventPayload, MouseEventPayload, TextEventPayload};

/// Errors produced while decoding a real-time frame.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("frame is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),

    #[error("frame is not a JSON object")]
    NotAnObject,

    #[error("frame has no \"event\" field")]
    MissingEvent,

    #[error("unknown event {0:?}")]
    UnknownEvent(String),

    #[error("malformed {event} payload: {source}")]
    Payload {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("text_event carries no text")]
    EmptyText,
}

/// The three event names a frame may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealtimeEventKind {
    Text,
    Key,
    Mouse,
}

impl RealtimeEventKind {
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "text_event" => Some(Self::Text),
            "key_event" => Some(Self::Key),
            "mouse_event" => Some(Self::Mouse),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text_event",
            Self::Key => "key_event",
            Self::Mouse => "mouse_event",
        }
    }
}

/// A frame whose envelope has been read but whose payload has not.
#[derive(Debug, Clone)]
pub struct RealtimeFrame {
    kind: RealtimeEventKind,
    token: Option<String>,
    body: Map<String, Value>,
}

impl RealtimeFrame {
    /// Reads the `event` and `token` fields of a text frame.
    ///
    /// A `token` that is absent or not a string reads as `None`, which the
    /// access guard rejects.
    pub fn parse(text: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(text).map_err(DecodeError::Json)?;
        let Value::Object(mut body) = value else {
            return Err(DecodeError::NotAnObject);
        };

        let kind = match body.remove("event") {
            Some(Value::String(name)) => {
                RealtimeEventKind::from_wire(&name).ok_or(DecodeError::UnknownEvent(name))?
            }
            Some(_) | None => return Err(DecodeError::MissingEvent),
        };
        let token = match body.remove("token") {
            Some(Value::String(token)) => Some(token),
            _ => None,
        };

        Ok(Self { kind, token, body })
    }

    pub fn kind(&self) -> RealtimeEventKind {
        self.kind
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Decodes the payload, consuming the frame and its token.
    pub fn into_event(self) -> Result<InputEvent, DecodeError> {
        let event = self.kind.as_str();
        let body = Value::Object(self.body);
        let payload_err = |source| DecodeError::Payload { event, source };

        match self.kind {
            RealtimeEventKind::Text => {
                let payload: TextEventPayload =
                    serde_json::from_value(body).map_err(payload_err)?;
                if payload.text.is_empty() {
                    return Err(DecodeError::EmptyText);
                }
                Ok(InputEvent::Text { text: payload.text })
            }
            RealtimeEventKind::Key => {
                let payload: KeyEventPayload =
                    serde_json::from_value(body).map_err(payload_err)?;
                Ok(payload.into())
            }
            RealtimeEventKind::Mouse => {
                let payload: MouseEventPayload =
                    serde_json::from_value(body).map_err(payload_err)?;
                Ok(payload.into())
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
