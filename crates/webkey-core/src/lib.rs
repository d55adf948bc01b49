//! # webkey-core
//!
//! Shared library for webkey containing the input-event model, the symbolic
//! key table, the PIN/token value types, and the JSON wire protocol spoken by
//! the browser.
//!
//! It has no dependencies on OS APIs, async runtimes, or network sockets.
//!
//! # Architecture overview
//!
//! webkey lets a browser on the local network drive the host's keyboard and
//! pointer.  The browser first exchanges a one-time PIN for a bearer token,
//! then streams pointer/keyboard events which the server queues and replays
//! onto the host input subsystem.
//!
//! This crate defines:
//!
//! - **`event`** – The closed set of input events ([`InputEvent`]) the
//!   dispatcher knows how to apply.
//!
//! - **`keymap`** – The fixed table that resolves symbolic key names such as
//!   `"ctrl_l"` or `"f5"` into [`NamedKey`]s, plus the X11 KeySym table used
//!   by the Linux injection backend.
//!
//! - **`auth`** – [`Pin`] and [`AuthToken`] value types and timestamp helpers.
//!
//! - **`protocol`** – How JSON travels between the browser and the server,
//!   for both the HTTP endpoints and the real-time WebSocket channel.

pub mod auth;
pub mod event;
pub mod keymap;
pub mod protocol;

pub use auth::{unix_now, AuthToken, Pin, PinFormatError, UnixSeconds};
pub use event::{InputEvent, KeyAction, MouseButton};
pub use keymap::{Key, NamedKey, UnresolvedKey};
pub use protocol::messages::ApiReply;
pub use protocol::realtime::{DecodeError, RealtimeFrame};
