//! Key name resolution for keyboard events.
//!
//! The browser identifies keys either by a symbolic name from a fixed table
//! (`"enter"`, `"ctrl_l"`, `"f5"`, ...) or by the literal character the key
//! produces (`"a"`, `"/"`, `" "`).  [`Key::resolve`] turns the raw name into
//! a [`Key`]:
//!
//! 1. The name is matched case-insensitively against [`KEY_NAMES`].
//! 2. Otherwise, a name that is exactly one character is taken literally
//!    (case preserved, so `"A"` stays `'A'`).
//! 3. Anything else is an [`UnresolvedKey`].
//!
//! Platform backends translate [`Key`] into their native codes; see
//! [`linux_x11`] for the X11 KeySym table.

pub mod linux_x11;

use thiserror::Error;

/// Physical keys reachable by symbolic name.
///
/// Generic modifiers (`Shift`, `Control`, `Alt`, `Meta`) are kept distinct
/// from their left/right variants so a backend can pick its preferred side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Shift,
    ShiftLeft,
    ShiftRight,
    Control,
    ControlLeft,
    ControlRight,
    Alt,
    AltLeft,
    AltRight,
    /// Command on macOS, the Windows key elsewhere.
    Meta,
    MetaLeft,
    MetaRight,
    Enter,
    Backspace,
    Tab,
    CapsLock,
    Escape,
    Space,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
}

/// The symbolic name table.  Names are lowercase; lookup lowercases input.
pub const KEY_NAMES: &[(&str, NamedKey)] = &[
    ("shift", NamedKey::Shift),
    ("shift_l", NamedKey::ShiftLeft),
    ("shift_r", NamedKey::ShiftRight),
    ("ctrl", NamedKey::Control),
    ("ctrl_l", NamedKey::ControlLeft),
    ("ctrl_r", NamedKey::ControlRight),
    ("alt", NamedKey::Alt),
    ("alt_l", NamedKey::AltLeft),
    ("alt_r", NamedKey::AltRight),
    ("cmd", NamedKey::Meta),
    ("cmd_l", NamedKey::MetaLeft),
    ("cmd_r", NamedKey::MetaRight),
    ("win", NamedKey::Meta),
    ("enter", NamedKey::Enter),
    ("backspace", NamedKey::Backspace),
    ("tab", NamedKey::Tab),
    ("caps_lock", NamedKey::CapsLock),
    ("esc", NamedKey::Escape),
    ("space", NamedKey::Space),
    ("up", NamedKey::ArrowUp),
    ("down", NamedKey::ArrowDown),
    ("left", NamedKey::ArrowLeft),
    ("right", NamedKey::ArrowRight),
    ("f1", NamedKey::F1),
    ("f2", NamedKey::F2),
    ("f3", NamedKey::F3),
    ("f4", NamedKey::F4),
    ("f5", NamedKey::F5),
    ("f6", NamedKey::F6),
    ("f7", NamedKey::F7),
    ("f8", NamedKey::F8),
    ("f9", NamedKey::F9),
    ("f10", NamedKey::F10),
    ("f11", NamedKey::F11),
    ("f12", NamedKey::F12),
    ("delete", NamedKey::Delete),
    ("del", NamedKey::Delete),
    ("insert", NamedKey::Insert),
    ("home", NamedKey::Home),
    ("end", NamedKey::End),
    ("page_up", NamedKey::PageUp),
    ("page_down", NamedKey::PageDown),
];

/// Looks up a symbolic key name, ignoring ASCII case.
pub fn lookup_named_key(name: &str) -> Option<NamedKey> {
    KEY_NAMES
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
        .map(|(_, key)| *key)
}

/// A key name that is neither in the table nor a single character.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unresolved key name: {0:?}")]
pub struct UnresolvedKey(pub String);

/// A key the injection sink can press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Named(NamedKey),
    Char(char),
}

impl Key {
    /// Resolves a raw key name from the browser.
    ///
    /// # Errors
    ///
    /// Returns [`UnresolvedKey`] when the name is empty, not in
    /// [`KEY_NAMES`], and longer than one character.
    pub fn resolve(name: &str) -> Result<Key, UnresolvedKey> {
        if let Some(named) = lookup_named_key(name) {
            return Ok(Key::Named(named));
        }
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Key::Char(c)),
            _ => Err(UnresolvedKey(name.to_string())),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
