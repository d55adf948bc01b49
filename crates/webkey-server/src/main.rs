//! webkey server: entry point.
//!
//! Serves a browser keyboard/touchpad page, exchanges a one-time console PIN
//! for a bearer token, and replays the browser's keyboard and pointer input
//! on this machine.
//!
//! # Usage
//!
//! ```text
//! webkey-server [OPTIONS]
//!
//! Options:
//!   --config <FILE>          TOML configuration file
//!   --bind <IP>              Address both listeners bind to [default: 0.0.0.0]
//!   --http-port <PORT>       HTTP port [default: 18000]
//!   --ws-port <PORT>         Real-time WebSocket port [default: 18001]
//!   --token-file <FILE>      Token store [default: authorized_tokens.json]
//!   --token-ttl-secs <SECS>  Token lifetime [default: 604800]
//!   --pin-ttl-secs <SECS>    PIN lifetime [default: 300]
//!   --merge-window-ms <MS>   Dispatcher merge window [default: 5]
//!   --idle-backoff-ms <MS>   Dispatcher idle sleep [default: 1]
//!   --max-pending <N>        Queue bound [default: 4096]
//!   --static-dir <DIR>       Directory served under /static [default: bundled]
//!   --sink <log|xtest>       Input backend [default: log]
//!   --wipe-tokens-on-exit    Delete the token file on shutdown
//!   --log-level <LEVEL>      Log filter when RUST_LOG is unset [default: info]
//! ```
//!
//! # Configuration precedence
//!
//! Command line, then the matching `WEBKEY_*` environment variable, then the
//! `--config` file, then the built-in default.
//!
//! # Architecture overview
//!
//! ```text
//! Browser
//!   ├─ HTTP  :18000  landing page, /auth/pin, /key_event ─┐
//!   └─ WS    :18001  text/key/mouse frames ───────────────┤
//!                                                         ▼
//!                                                    EventQueue
//!                                                         │
//!                                            Dispatcher (merge window)
//!                                                         │
//!                                               InputSink (log / xtest)
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use webkey_core::Pin;
use webkey_server::application::{AuthState, Dispatcher, DispatcherConfig, EventQueue};
use webkey_server::domain::{ServerConfig, SinkKind};
use webkey_server::infrastructure::input_sink::build_sink;
use webkey_server::infrastructure::storage::{load_config, FileConfig, JsonTokenFile};
use webkey_server::infrastructure::{
    build_router, run_http_server, run_ws_listener, HttpState, RealtimeContext,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Browser-driven keyboard and pointer server.
///
/// Every option is optional so that unset ones fall through to the
/// configuration file and then to the defaults.
#[derive(Debug, Parser)]
#[command(
    name = "webkey-server",
    about = "Use a phone or browser as this machine's keyboard and touchpad",
    version
)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, env = "WEBKEY_CONFIG")]
    config: Option<PathBuf>,

    /// IP address both listeners bind to.
    ///
    /// `0.0.0.0` accepts connections from the LAN; `127.0.0.1` only from this
    /// machine.
    #[arg(long, env = "WEBKEY_BIND")]
    bind: Option<String>,

    #[arg(long, env = "WEBKEY_HTTP_PORT")]
    http_port: Option<u16>,

    /// Port of the real-time WebSocket channel.
    #[arg(long, env = "WEBKEY_WS_PORT")]
    ws_port: Option<u16>,

    /// JSON file holding issued tokens.
    #[arg(long, env = "WEBKEY_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    #[arg(long, env = "WEBKEY_TOKEN_TTL_SECS")]
    token_ttl_secs: Option<u64>,

    #[arg(long, env = "WEBKEY_PIN_TTL_SECS")]
    pin_ttl_secs: Option<u64>,

    /// Minimum length of a dispatcher cycle that applied events.
    #[arg(long, env = "WEBKEY_MERGE_WINDOW_MS")]
    merge_window_ms: Option<u64>,

    #[arg(long, env = "WEBKEY_IDLE_BACKOFF_MS")]
    idle_backoff_ms: Option<u64>,

    /// Events held before new ones are dropped.
    #[arg(long, env = "WEBKEY_MAX_PENDING")]
    max_pending: Option<usize>,

    #[arg(long, env = "WEBKEY_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Input backend: `log` (dry run) or `xtest` (X11 injection).
    #[arg(long, env = "WEBKEY_SINK")]
    sink: Option<SinkKind>,

    /// Delete the token file when the server stops.
    #[arg(long, env = "WEBKEY_WIPE_TOKENS_ON_EXIT")]
    wipe_tokens_on_exit: bool,

    #[arg(long, env = "WEBKEY_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    /// Merges the parsed arguments over `file` into a [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the bind address is not a valid IP address.
    fn into_server_config(self, file: FileConfig) -> anyhow::Result<ServerConfig> {
        let bind = self.bind.unwrap_or(file.http.bind);
        let ip: IpAddr = bind
            .parse()
            .with_context(|| format!("invalid bind address: '{bind}'"))?;

        let http_port = self.http_port.unwrap_or(file.http.port);
        let ws_port = self.ws_port.unwrap_or(file.realtime.port);

        Ok(ServerConfig {
            http_addr: SocketAddr::new(ip, http_port),
            ws_addr: SocketAddr::new(ip, ws_port),
            token_file: self.token_file.unwrap_or(file.auth.token_file),
            token_ttl: Duration::from_secs(
                self.token_ttl_secs.unwrap_or(file.auth.token_ttl_secs),
            ),
            pin_ttl: Duration::from_secs(self.pin_ttl_secs.unwrap_or(file.auth.pin_ttl_secs)),
            merge_window: Duration::from_millis(
                self.merge_window_ms.unwrap_or(file.dispatch.merge_window_ms),
            ),
            idle_backoff: Duration::from_millis(
                self.idle_backoff_ms.unwrap_or(file.dispatch.idle_backoff_ms),
            ),
            max_pending: self.max_pending.unwrap_or(file.dispatch.max_pending),
            static_dir: self.static_dir.unwrap_or(file.http.static_dir),
            sink: self.sink.unwrap_or(file.dispatch.sink),
            wipe_tokens_on_exit: self.wipe_tokens_on_exit || file.auth.wipe_tokens_on_exit,
            log_level: self.log_level.unwrap_or(file.logging.level),
        })
    }
}

/// The console banner announcing the PIN.
fn render_pin_banner(pin: &Pin, ttl: Duration) -> String {
    let rule = "=".repeat(40);
    format!(
        "{rule}\n      WEB KEYBOARD SERVER STARTED\n  Your one-time PIN is: {}\n  This PIN will expire in {}.\n  Enter this PIN on the web page to connect.\n{rule}",
        pin.display_grouped(),
        describe_ttl(ttl),
    )
}

fn describe_ttl(ttl: Duration) -> String {
    let secs = ttl.as_secs();
    match (secs / 60, secs % 60) {
        (1, 0) => "1 minute".to_string(),
        (minutes, 0) if minutes > 0 => format!("{minutes} minutes"),
        (_, _) if secs == 1 => "1 second".to_string(),
        _ => format!("{secs} seconds"),
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// # What happens at startup
///
/// 1. Arguments are parsed and merged with the optional config file.
/// 2. `tracing_subscriber` is initialised; `RUST_LOG` wins over the
///    configured level.
/// 3. The token file is pruned of expired tokens.
/// 4. The input sink is created and the dispatcher task spawned.
/// 5. The PIN is generated and printed on the console.
/// 6. Both listeners are bound and served until Ctrl+C.
/// 7. Once both have stopped, the dispatcher applies what is left and exits.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let file = load_config(cli.config.as_deref()).context("failed to load configuration")?;
    let config = cli.into_server_config(file)?;

    // ── Logging setup ─────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!(
        "webkey server starting: http={}, ws={}, sink={}",
        config.http_addr, config.ws_addr, config.sink
    );

    // ── Authentication state ──────────────────────────────────────────────────
    let auth = Arc::new(AuthState::new(
        Box::new(JsonTokenFile::new(&config.token_file)),
        config.pin_ttl,
        config.token_ttl,
    ));
    let pruned = auth.prune_tokens();
    info!(
        "token store {}: {} live token(s), {} expired removed",
        config.token_file.display(),
        pruned.tokens.len(),
        pruned.pruned
    );

    // ── Event pipeline ────────────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    // Cleared only after both listeners have stopped accepting input.
    let dispatching = Arc::new(AtomicBool::new(true));
    let queue = Arc::new(EventQueue::new(config.max_pending));
    let sink = build_sink(config.sink).context("failed to create input sink")?;
    let dispatcher = Dispatcher::new(
        Arc::clone(&queue),
        sink,
        DispatcherConfig {
            merge_window: config.merge_window,
            idle_backoff: config.idle_backoff,
        },
    );
    let dispatcher_task = tokio::spawn(dispatcher.run(Arc::clone(&dispatching)));

    // ── Listeners ─────────────────────────────────────────────────────────────
    let http_listener = TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("failed to bind HTTP listener on {}", config.http_addr))?;
    let ws_listener = TcpListener::bind(config.ws_addr)
        .await
        .with_context(|| format!("failed to bind real-time listener on {}", config.ws_addr))?;
    let ws_port = ws_listener
        .local_addr()
        .context("real-time listener has no local address")?
        .port();

    let http_state = HttpState::new(Arc::clone(&auth), Arc::clone(&queue), ws_port);
    let realtime = RealtimeContext {
        guard: http_state.guard.clone(),
        queue: Arc::clone(&queue),
    };
    let router = build_router(http_state, &config.static_dir);

    // ── PIN ───────────────────────────────────────────────────────────────────
    let pin = auth.issue_pin();
    println!("{}", render_pin_banner(&pin, config.pin_ttl));

    // ── Graceful shutdown flag ────────────────────────────────────────────────
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C; initiating graceful shutdown");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    // ── Serve ─────────────────────────────────────────────────────────────────
    let served = tokio::try_join!(
        run_http_server(http_listener, router, Arc::clone(&running)),
        run_ws_listener(ws_listener, realtime, Arc::clone(&running)),
    );

    running.store(false, Ordering::Relaxed);
    dispatching.store(false, Ordering::Relaxed);
    if let Err(e) = dispatcher_task.await {
        warn!("dispatcher task ended abnormally: {e}");
    }

    if config.wipe_tokens_on_exit {
        match auth.tokens().wipe() {
            Ok(()) => info!("token file {} wiped", config.token_file.display()),
            Err(e) => warn!("failed to wipe token file: {e}"),
        }
    }

    served?;
    info!("webkey server stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
