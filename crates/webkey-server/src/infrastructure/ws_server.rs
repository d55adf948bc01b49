//! Real-time channel: WebSocket accept loop and per-session tasks.
//!
//! Browsers stream `text_event`, `key_event` and `mouse_event` frames here
//! (see [`webkey_core::protocol::realtime`]).  Each frame is checked on its
//! own:
//!
//! 1. Parse the envelope.  Malformed frames are dropped.
//! 2. Validate the frame's `token` through the [`AccessGuard`].  Frames with
//!    a missing or dead token are dropped.
//! 3. Decode the payload and push it on the shared [`EventQueue`].
//!
//! A dropped frame never closes the session; the browser keeps streaming.
//! [`handle_frame`] reads the token file, so sessions run it on the blocking
//! pool.
//!
//! # Shutdown
//!
//! The accept loop polls `running` every 200 ms.  Sessions already open end
//! when the browser disconnects or the process exits.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
};
use tracing::{debug, error, info, warn};

use webkey_core::RealtimeFrame;

use crate::application::access_guard::AccessGuard;
use crate::application::event_queue::EventQueue;

/// Interval at which the accept loop rechecks the shutdown flag.
const ACCEPT_POLL: Duration = Duration::from_millis(200);

/// What the server needs to handle one real-time session.
#[derive(Clone)]
pub struct RealtimeContext {
    pub guard: AccessGuard,
    pub queue: Arc<EventQueue>,
}

/// What happened to one text frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Queued,
    Unauthorized,
    Malformed,
    /// Authorized and well-formed, but the queue was full.
    Dropped,
}

/// Binds `addr` and runs [`run_ws_listener`] on it.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound.
pub async fn run_ws_server(
    addr: SocketAddr,
    ctx: RealtimeContext,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind real-time listener on {addr}"))?;
    run_ws_listener(listener, ctx, running).await
}

/// Accepts WebSocket sessions on `listener` until `running` is cleared.
///
/// # Errors
///
/// Returns an error only if the listener has no local address.
pub async fn run_ws_listener(
    listener: TcpListener,
    ctx: RealtimeContext,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let addr = listener
        .local_addr()
        .context("real-time listener has no local address")?;
    info!("real-time channel listening on {addr}");

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping real-time accept loop");
            break;
        }

        match timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                debug!("new real-time connection from {peer_addr}");
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    handle_session(stream, peer_addr, ctx).await;
                });
            }
            Ok(Err(e)) => {
                error!("real-time accept error: {e}");
            }
            Err(_) => {
                // Timeout; loop back to check `running`.
            }
        }
    }

    Ok(())
}

/// Handles one decoded text frame.
pub fn handle_frame(ctx: &RealtimeContext, text: &str) -> FrameOutcome {
    let frame = match RealtimeFrame::parse(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!("dropped malformed frame: {e}");
            return FrameOutcome::Malformed;
        }
    };

    if ctx.guard.check_event(frame.token()).is_err() {
        warn!("dropped {} frame: invalid token", frame.kind().as_str());
        return FrameOutcome::Unauthorized;
    }

    let event = match frame.into_event() {
        Ok(event) => event,
        Err(e) => {
            warn!("dropped frame: {e}");
            return FrameOutcome::Malformed;
        }
    };

    debug!("queued {} event", event.kind());
    match ctx.queue.push(event) {
        Ok(()) => FrameOutcome::Queued,
        Err(e) => {
            warn!("dropped real-time event: {e}");
            FrameOutcome::Dropped
        }
    }
}

// ── Per-session handler ───────────────────────────────────────────────────────

async fn handle_session(stream: TcpStream, peer_addr: SocketAddr, ctx: RealtimeContext) {
    match run_session(stream, peer_addr, ctx).await {
        Ok(()) => info!("real-time session {peer_addr} closed"),
        Err(e) => warn!("real-time session {peer_addr} closed with error: {e:#}"),
    }
}

async fn run_session(
    stream: TcpStream,
    peer_addr: SocketAddr,
    ctx: RealtimeContext,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream)
        .await
        .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;
    info!("real-time session established: {peer_addr}");

    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    loop {
        let message = match ws_rx.next().await {
            Some(Ok(message)) => message,
            Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) => {
                debug!("session {peer_addr}: closed by browser");
                break;
            }
            Some(Err(e)) => {
                warn!("session {peer_addr}: WebSocket error: {e}");
                break;
            }
            None => {
                debug!("session {peer_addr}: stream ended");
                break;
            }
        };

        match message {
            WsMessage::Text(text) => {
                // Frames are handled one at a time, so the session's order is kept.
                let frame_ctx = ctx.clone();
                if let Err(e) =
                    tokio::task::spawn_blocking(move || handle_frame(&frame_ctx, &text)).await
                {
                    error!("session {peer_addr}: frame handler did not complete: {e}");
                }
            }
            WsMessage::Binary(_) => {
                warn!("session {peer_addr}: unexpected binary frame (ignored)");
            }
            WsMessage::Ping(payload) => {
                ws_tx
                    .send(WsMessage::Pong(payload))
                    .await
                    .with_context(|| format!("session {peer_addr}: failed to answer ping"))?;
            }
            WsMessage::Pong(_) => {}
            WsMessage::Close(_) => {
                debug!("session {peer_addr}: Close frame received");
                break;
            }
            WsMessage::Frame(_) => {}
        }
    }

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
