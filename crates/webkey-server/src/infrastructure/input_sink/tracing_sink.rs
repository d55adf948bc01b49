//! Dry-run sink that logs each action instead of injecting it.
//!
//! Default backend, so the server runs anywhere (headless hosts, CI, other
//! platforms).  Text is never logged verbatim; only its length is.

use tracing::info;

use webkey_core::{Key, MouseButton};

use crate::application::dispatcher::{InjectionError, InputSink};

/// [`InputSink`] that writes one `info!` line per action.
#[derive(Debug, Default)]
pub struct TracingSink {
    actions: u64,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of actions logged so far.
    pub fn actions(&self) -> u64 {
        self.actions
    }

    fn log(&mut self, action: std::fmt::Arguments<'_>) -> Result<(), InjectionError> {
        self.actions += 1;
        info!(target: "webkey::sink", "{action}");
        Ok(())
    }
}

impl InputSink for TracingSink {
    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), InjectionError> {
        self.log(format_args!("move dx={dx} dy={dy}"))
    }

    fn press_button(&mut self, button: MouseButton) -> Result<(), InjectionError> {
        self.log(format_args!("press {}", button.as_str()))
    }

    fn release_button(&mut self, button: MouseButton) -> Result<(), InjectionError> {
        self.log(format_args!("release {}", button.as_str()))
    }

    fn click_button(&mut self, button: MouseButton) -> Result<(), InjectionError> {
        self.log(format_args!("click {}", button.as_str()))
    }

    fn scroll(&mut self, dx: i32, dy: i32) -> Result<(), InjectionError> {
        self.log(format_args!("scroll dx={dx} dy={dy}"))
    }

    fn key_down(&mut self, key: Key) -> Result<(), InjectionError> {
        self.log(format_args!("key down {key:?}"))
    }

    fn key_up(&mut self, key: Key) -> Result<(), InjectionError> {
        self.log(format_args!("key up {key:?}"))
    }

    fn type_char(&mut self, _c: char) -> Result<(), InjectionError> {
        self.log(format_args!("type 1 char"))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
