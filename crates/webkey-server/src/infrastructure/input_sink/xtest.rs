//! Linux X11 input injection via the XTest extension.
//!
//! # What is XTest? (for beginners)
//!
//! XTest is an X11 protocol extension that lets a process synthesize keyboard
//! and pointer events as if the user had touched the hardware.  The focused
//! window receives them exactly like real input.
//!
//! The calls used here:
//! - `XTestFakeKeyEvent(display, keycode, is_press, delay)`
//! - `XTestFakeButtonEvent(display, button, is_press, delay)`
//! - `XTestFakeRelativeMotionEvent(display, dx, dy, delay)`
//!
//! # Key translation
//!
//! ```text
//! Key → X11 KeySym (webkey_core::keymap::linux_x11) → XKeysymToKeycode → keycode
//! ```
//!
//! A character whose KeySym sits on the shifted level of its keycode (`'A'`,
//! `'!'`) is typed with Shift held around it.
//!
//! # Scroll via button events
//!
//! | Button | Direction |
//! |--------|-----------|
//! | 4      | up        |
//! | 5      | down      |
//! | 6      | left      |
//! | 7      | right     |
//!
//! # Permissions
//!
//! The process needs access to the display named by `DISPLAY`.  When it is
//! unset or unreachable, [`XTestSink::open`] fails.

use std::os::raw::{c_int, c_uint, c_ulong};
use std::ptr;

use x11::xlib;
use x11::xtest;

use webkey_core::keymap::linux_x11::{char_to_keysym, key_to_keysym, named_key_to_keysym};
use webkey_core::{Key, MouseButton, NamedKey};

use crate::application::dispatcher::{InjectionError, InputSink, MAX_SCROLL_TICKS};

/// `CurrentTime`: no delay before the synthetic event.
const NO_DELAY: c_ulong = 0;

const BUTTON_SCROLL_UP: c_uint = 4;
const BUTTON_SCROLL_DOWN: c_uint = 5;
const BUTTON_SCROLL_LEFT: c_uint = 6;
const BUTTON_SCROLL_RIGHT: c_uint = 7;

/// XTest-backed [`InputSink`] holding one display connection.
pub struct XTestSink {
    display: *mut xlib::Display,
}

// The display connection is only used by the dispatcher task, one call at a
// time; moving it to another worker thread between calls is sound for Xlib.
unsafe impl Send for XTestSink {}

impl XTestSink {
    /// Opens the display named by `DISPLAY`.
    ///
    /// # Errors
    ///
    /// Returns [`InjectionError::Platform`] when the display cannot be opened.
    pub fn open() -> Result<Self, InjectionError> {
        // SAFETY: a null name makes Xlib read `DISPLAY`; a null return is
        // handled below.
        let display = unsafe { xlib::XOpenDisplay(ptr::null()) };
        if display.is_null() {
            return Err(InjectionError::Platform(
                "cannot open X display (is DISPLAY set?)".to_string(),
            ));
        }
        Ok(Self { display })
    }

    fn flush(&self) {
        // SAFETY: `display` is a live connection owned by `self`.
        unsafe {
            xlib::XFlush(self.display);
        }
    }

    fn keycode_for(&self, keysym: u32) -> Option<xlib::KeyCode> {
        // SAFETY: as above.
        let keycode = unsafe { xlib::XKeysymToKeycode(self.display, keysym as xlib::KeySym) };
        (keycode != 0).then_some(keycode)
    }

    /// Whether `keysym` is produced only with Shift held on `keycode`.
    fn needs_shift(&self, keycode: xlib::KeyCode, keysym: u32) -> bool {
        // SAFETY: as above.
        let (plain, shifted) = unsafe {
            (
                xlib::XKeycodeToKeysym(self.display, keycode, 0),
                xlib::XKeycodeToKeysym(self.display, keycode, 1),
            )
        };
        on_shifted_level(plain, shifted, keysym as xlib::KeySym)
    }

    fn fake_key(&self, keycode: xlib::KeyCode, pressed: bool) -> Result<(), InjectionError> {
        // SAFETY: as above.
        let ok = unsafe {
            xtest::XTestFakeKeyEvent(
                self.display,
                c_uint::from(keycode),
                c_int::from(pressed),
                NO_DELAY,
            )
        };
        if ok == 0 {
            return Err(InjectionError::Platform(format!(
                "XTestFakeKeyEvent failed for keycode {keycode}"
            )));
        }
        Ok(())
    }

    fn fake_button(&self, button: c_uint, pressed: bool) -> Result<(), InjectionError> {
        // SAFETY: as above.
        let ok = unsafe {
            xtest::XTestFakeButtonEvent(self.display, button, c_int::from(pressed), NO_DELAY)
        };
        if ok == 0 {
            return Err(InjectionError::Platform(format!(
                "XTestFakeButtonEvent failed for button {button}"
            )));
        }
        Ok(())
    }

    /// Shift keycode to hold around `keycode`, if `keysym` is on its
    /// shifted level.
    fn shift_for(&self, keycode: xlib::KeyCode, keysym: u32) -> Option<xlib::KeyCode> {
        if self.needs_shift(keycode, keysym) {
            self.keycode_for(named_key_to_keysym(NamedKey::ShiftLeft))
        } else {
            None
        }
    }

    fn key_event(&mut self, key: Key, pressed: bool) -> Result<(), InjectionError> {
        let keysym = key_to_keysym(key).ok_or(InjectionError::Unmapped(key))?;
        let keycode = self.keycode_for(keysym).ok_or(InjectionError::Unmapped(key))?;
        let shift = match key {
            Key::Char(_) => self.shift_for(keycode, keysym),
            Key::Named(_) => None,
        };
        for (code, down) in key_chord(keycode, shift, pressed) {
            self.fake_key(code, down)?;
        }
        self.flush();
        Ok(())
    }

    fn click_scroll(&mut self, button: c_uint, ticks: i32) -> Result<(), InjectionError> {
        for _ in 0..ticks.unsigned_abs().min(MAX_SCROLL_TICKS.unsigned_abs()) {
            self.fake_button(button, true)?;
            self.fake_button(button, false)?;
        }
        Ok(())
    }
}

impl Drop for XTestSink {
    fn drop(&mut self) {
        // SAFETY: `display` was opened in `open` and is closed exactly once.
        unsafe {
            xlib::XCloseDisplay(self.display);
        }
    }
}

fn on_shifted_level(plain: xlib::KeySym, shifted: xlib::KeySym, keysym: xlib::KeySym) -> bool {
    plain != keysym && shifted == keysym
}

/// Key transitions for one press or release, with Shift wrapped around the
/// key: Shift goes down first on press and comes up last on release.
fn key_chord(
    keycode: xlib::KeyCode,
    shift: Option<xlib::KeyCode>,
    pressed: bool,
) -> Vec<(xlib::KeyCode, bool)> {
    match (shift, pressed) {
        (Some(shift), true) => vec![(shift, true), (keycode, true)],
        (Some(shift), false) => vec![(keycode, false), (shift, false)],
        (None, pressed) => vec![(keycode, pressed)],
    }
}

fn button_number(button: MouseButton) -> c_uint {
    match button {
        MouseButton::Left => 1,
        MouseButton::Middle => 2,
        MouseButton::Right => 3,
    }
}

impl InputSink for XTestSink {
    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), InjectionError> {
        // SAFETY: `display` is a live connection owned by `self`.
        unsafe {
            xtest::XTestFakeRelativeMotionEvent(self.display, dx, dy, NO_DELAY);
        }
        self.flush();
        Ok(())
    }

    fn press_button(&mut self, button: MouseButton) -> Result<(), InjectionError> {
        self.fake_button(button_number(button), true)?;
        self.flush();
        Ok(())
    }

    fn release_button(&mut self, button: MouseButton) -> Result<(), InjectionError> {
        self.fake_button(button_number(button), false)?;
        self.flush();
        Ok(())
    }

    fn scroll(&mut self, dx: i32, dy: i32) -> Result<(), InjectionError> {
        let vertical = if dy > 0 { BUTTON_SCROLL_UP } else { BUTTON_SCROLL_DOWN };
        let horizontal = if dx > 0 { BUTTON_SCROLL_RIGHT } else { BUTTON_SCROLL_LEFT };
        self.click_scroll(vertical, dy)?;
        self.click_scroll(horizontal, dx)?;
        self.flush();
        Ok(())
    }

    fn key_down(&mut self, key: Key) -> Result<(), InjectionError> {
        self.key_event(key, true)
    }

    fn key_up(&mut self, key: Key) -> Result<(), InjectionError> {
        self.key_event(key, false)
    }

    fn type_char(&mut self, c: char) -> Result<(), InjectionError> {
        let key = Key::Char(c);
        let keysym = char_to_keysym(c).ok_or(InjectionError::Unmapped(key))?;
        let keycode = self.keycode_for(keysym).ok_or(InjectionError::Unmapped(key))?;

        let shift = self.shift_for(keycode, keysym);

        if let Some(shift) = shift {
            self.fake_key(shift, true)?;
        }
        let typed = self
            .fake_key(keycode, true)
            .and_then(|()| self.fake_key(keycode, false));
        if let Some(shift) = shift {
            self.fake_key(shift, false)?;
        }
        self.flush();
        typed
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
