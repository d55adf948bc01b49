//! JSON wire protocol between the browser and the server.
//!
//! - [`messages`] holds the request and reply bodies shared by the HTTP
//!   endpoints and the payloads carried inside real-time frames.
//! - [`realtime`] decodes one WebSocket text frame into its token and an
//!   [`InputEvent`](crate::event::InputEvent).

pub mod messages;
pub mod realtime;
