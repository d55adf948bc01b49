//! Batching Dispatcher: drains the event queue and replays it on the host.
//!
//! # Cycle
//!
//! ```text
//! start = now
//! batch = queue.drain_all()
//! if batch is empty  → sleep(idle_backoff), next cycle
//! apply every event in order
//! if now - start < merge_window → sleep(merge_window - (now - start))
//! ```
//!
//! Bursts that arrive while a cycle is running pile up in the queue and are
//! applied together in the next one, so a flood of pointer moves costs one
//! lock swap per merge window instead of one per event.
//!
//! A failing event is logged and skipped.  Nothing an event does can stop the
//! loop; only the shutdown flag does.  After the flag is cleared one last
//! batch is drained, so an event accepted before shutdown is still applied.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use webkey_core::{InputEvent, Key, KeyAction, MouseButton, UnresolvedKey};

use super::event_queue::EventQueue;

/// Error type for applying one event.
#[derive(Debug, Error)]
pub enum InjectionError {
    #[error(transparent)]
    UnknownKey(#[from] UnresolvedKey),

    /// The key resolved but the backend has no code for it.
    #[error("no platform key code for {0:?}")]
    Unmapped(Key),

    #[error("platform error: {0}")]
    Platform(String),
}

/// OS-level keyboard and pointer actuator.
///
/// Implementations live in `infrastructure::input_sink`.  Methods take
/// `&mut self` because only the dispatcher task ever drives a sink.
pub trait InputSink: Send {
    /// Moves the pointer by a relative offset in pixels.
    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), InjectionError>;

    fn press_button(&mut self, button: MouseButton) -> Result<(), InjectionError>;

    fn release_button(&mut self, button: MouseButton) -> Result<(), InjectionError>;

    /// Presses and releases a button.
    fn click_button(&mut self, button: MouseButton) -> Result<(), InjectionError> {
        self.press_button(button)?;
        self.release_button(button)
    }

    /// Scrolls by wheel ticks.  Positive `dy` is up, positive `dx` is right.
    fn scroll(&mut self, dx: i32, dy: i32) -> Result<(), InjectionError>;

    fn key_down(&mut self, key: Key) -> Result<(), InjectionError>;

    fn key_up(&mut self, key: Key) -> Result<(), InjectionError>;

    /// Types one character, including any modifier it needs.
    fn type_char(&mut self, c: char) -> Result<(), InjectionError>;
}

impl<S: InputSink + ?Sized> InputSink for Box<S> {
    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), InjectionError> {
        (**self).move_relative(dx, dy)
    }

    fn press_button(&mut self, button: MouseButton) -> Result<(), InjectionError> {
        (**self).press_button(button)
    }

    fn release_button(&mut self, button: MouseButton) -> Result<(), InjectionError> {
        (**self).release_button(button)
    }

    fn click_button(&mut self, button: MouseButton) -> Result<(), InjectionError> {
        (**self).click_button(button)
    }

    fn scroll(&mut self, dx: i32, dy: i32) -> Result<(), InjectionError> {
        (**self).scroll(dx, dy)
    }

    fn key_down(&mut self, key: Key) -> Result<(), InjectionError> {
        (**self).key_down(key)
    }

    fn key_up(&mut self, key: Key) -> Result<(), InjectionError> {
        (**self).key_up(key)
    }

    fn type_char(&mut self, c: char) -> Result<(), InjectionError> {
        (**self).type_char(c)
    }
}

/// Most wheel ticks one scroll event may produce on each axis.
pub const MAX_SCROLL_TICKS: i32 = 100;

fn clamp_ticks(ticks: i32) -> i32 {
    ticks.clamp(-MAX_SCROLL_TICKS, MAX_SCROLL_TICKS)
}

/// Applies a single event to `sink`.
///
/// Text is typed character by character; a character that fails is skipped
/// and the rest are still typed.  The first failure is returned.  Scroll
/// deltas are clamped to [`MAX_SCROLL_TICKS`] per axis.
///
/// # Errors
///
/// [`InjectionError::UnknownKey`] for a key name that does not resolve, or
/// whatever the sink reports.
pub fn apply_event<S: InputSink + ?Sized>(
    sink: &mut S,
    event: &InputEvent,
) -> Result<(), InjectionError> {
    match event {
        InputEvent::Move { dx, dy } => sink.move_relative(*dx, *dy),
        InputEvent::Click { button } => sink.click_button(*button),
        InputEvent::Press { button } => sink.press_button(*button),
        InputEvent::Release { button } => sink.release_button(*button),
        InputEvent::Scroll { dx, dy } => sink.scroll(clamp_ticks(*dx), clamp_ticks(*dy)),
        InputEvent::Key { key, action } => {
            let key = Key::resolve(key)?;
            match action {
                KeyAction::Down => sink.key_down(key),
                KeyAction::Up => sink.key_up(key),
            }
        }
        InputEvent::Text { text } => {
            let mut first_error = None;
            for c in text.chars() {
                if let Err(e) = sink.type_char(c) {
                    first_error.get_or_insert(e);
                }
            }
            first_error.map_or(Ok(()), Err)
        }
    }
}

/// Timing of the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    pub merge_window: Duration,
    pub idle_backoff: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            merge_window: Duration::from_millis(5),
            idle_backoff: Duration::from_millis(1),
        }
    }
}

/// What one call to [`Dispatcher::run_cycle`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The queue was empty.
    Idle,
    /// A batch was applied; `failed` of its events were skipped.
    Applied { applied: usize, failed: usize },
}

/// The dispatch loop: single consumer of the [`EventQueue`].
pub struct Dispatcher<S> {
    queue: Arc<EventQueue>,
    sink: S,
    config: DispatcherConfig,
}

impl<S: InputSink> Dispatcher<S> {
    pub fn new(queue: Arc<EventQueue>, sink: S, config: DispatcherConfig) -> Self {
        Self {
            queue,
            sink,
            config,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Drains the queue once and applies the batch.  Never sleeps.
    pub fn run_cycle(&mut self) -> CycleOutcome {
        let batch = self.queue.drain_all();
        if batch.is_empty() {
            return CycleOutcome::Idle;
        }

        let mut failed = 0;
        for event in &batch {
            debug!("applying {} event", event.kind());
            if let Err(e) = apply_event(&mut self.sink, event) {
                failed += 1;
                warn!("skipped {} event: {e}", event.kind());
            }
        }
        CycleOutcome::Applied {
            applied: batch.len() - failed,
            failed,
        }
    }

    /// Runs cycles until `running` is cleared, applies whatever is still
    /// queued, then returns the sink.
    pub async fn run(mut self, running: Arc<AtomicBool>) -> S {
        info!(
            "dispatcher started (merge window {:?}, idle backoff {:?})",
            self.config.merge_window, self.config.idle_backoff
        );

        while running.load(Ordering::Relaxed) {
            let started = Instant::now();
            match self.run_cycle() {
                CycleOutcome::Idle => tokio::time::sleep(self.config.idle_backoff).await,
                CycleOutcome::Applied { .. } => {
                    let elapsed = started.elapsed();
                    if elapsed < self.config.merge_window {
                        tokio::time::sleep(self.config.merge_window - elapsed).await;
                    }
                }
            }
        }

        if let CycleOutcome::Applied { applied, failed } = self.run_cycle() {
            debug!("final batch: {applied} applied, {failed} skipped");
        }

        let stats = self.queue.stats();
        info!(
            "dispatcher stopped ({} events enqueued, {} dropped)",
            stats.enqueued, stats.dropped
        );
        self.sink
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
