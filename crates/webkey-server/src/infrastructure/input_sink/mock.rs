//! Recording input sink for tests.
//!
//! # Why a recording sink?
//!
//! Real injection moves the cursor and presses keys on the machine running
//! the tests, and needs a desktop session.  `RecordingSink` replaces all of
//! that with an in-memory log of [`SinkCall`]s, in the order they were made,
//! so assertions can check exactly what the dispatcher did.
//!
//! # Usage in tests
//!
//! ```ignore
//! let sink = RecordingSink::new();
//! let mut dispatcher = Dispatcher::new(queue, sink.clone(), config);
//! dispatcher.run_cycle();
//! assert_eq!(sink.calls(), vec![SinkCall::Move(5, 0)]);
//! ```
//!
//! Clones share the same log, so the test keeps one clone and gives the
//! other away.  [`RecordingSink::rejecting`] makes selected calls fail with
//! [`InjectionError::Platform`] to exercise error paths.

use std::sync::{Arc, Mutex, PoisonError};

use webkey_core::{Key, MouseButton};

use crate::application::dispatcher::{InjectionError, InputSink};

/// One call made on a [`RecordingSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkCall {
    Move(i32, i32),
    Press(MouseButton),
    Release(MouseButton),
    Click(MouseButton),
    Scroll(i32, i32),
    KeyDown(Key),
    KeyUp(Key),
    Char(char),
}

/// A sink that records calls instead of injecting them.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    calls: Arc<Mutex<Vec<SinkCall>>>,
    reject: Option<fn(&SinkCall) -> bool>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that fails every call for which `reject` returns `true`.
    /// Failed calls are not recorded.
    pub fn rejecting(reject: fn(&SinkCall) -> bool) -> Self {
        Self {
            calls: Arc::default(),
            reject: Some(reject),
        }
    }

    /// Every successful call so far, oldest first.
    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&mut self, call: SinkCall) -> Result<(), InjectionError> {
        if self.reject.is_some_and(|reject| reject(&call)) {
            return Err(InjectionError::Platform(format!("rejected {call:?}")));
        }
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
        Ok(())
    }
}

impl InputSink for RecordingSink {
    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), InjectionError> {
        self.record(SinkCall::Move(dx, dy))
    }

    fn press_button(&mut self, button: MouseButton) -> Result<(), InjectionError> {
        self.record(SinkCall::Press(button))
    }

    fn release_button(&mut self, button: MouseButton) -> Result<(), InjectionError> {
        self.record(SinkCall::Release(button))
    }

    fn click_button(&mut self, button: MouseButton) -> Result<(), InjectionError> {
        self.record(SinkCall::Click(button))
    }

    fn scroll(&mut self, dx: i32, dy: i32) -> Result<(), InjectionError> {
        self.record(SinkCall::Scroll(dx, dy))
    }

    fn key_down(&mut self, key: Key) -> Result<(), InjectionError> {
        self.record(SinkCall::KeyDown(key))
    }

    fn key_up(&mut self, key: Key) -> Result<(), InjectionError> {
        self.record(SinkCall::KeyUp(key))
    }

    fn type_char(&mut self, c: char) -> Result<(), InjectionError> {
        self.record(SinkCall::Char(c))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
