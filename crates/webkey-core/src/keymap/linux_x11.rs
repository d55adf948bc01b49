//! [`Key`] to X11 KeySym translation for the Linux injection backend.
//!
//! X11 KeySym values are defined in X11/keysymdef.h.
//! Reference: https://gitlab.freedesktop.org/xorg/proto/xorgproto/-/blob/master/include/X11/keysymdef.h
//!
//! # Characters
//!
//! Latin-1 printable characters (`0x20..=0x7E`, `0xA0..=0xFF`) use their code
//! point as KeySym.  Every other Unicode character uses the Unicode KeySym
//! range, `0x0100_0000 + code point`.  Control characters have no KeySym
//! except for the few that double as keys (`\n`, `\r`, `\t`, backspace).

use super::{Key, NamedKey};

/// Offset of the Unicode KeySym range.
pub const UNICODE_KEYSYM_OFFSET: u32 = 0x0100_0000;

/// Translates a resolved [`Key`] into an X11 KeySym.
///
/// Returns `None` only for characters that have no KeySym.
pub fn key_to_keysym(key: Key) -> Option<u32> {
    match key {
        Key::Named(named) => Some(named_key_to_keysym(named)),
        Key::Char(c) => char_to_keysym(c),
    }
}

/// Translates a [`NamedKey`] into an X11 KeySym.
///
/// Generic modifiers map to their left-hand KeySym.
pub fn named_key_to_keysym(key: NamedKey) -> u32 {
    match key {
        NamedKey::Shift | NamedKey::ShiftLeft => 0xFFE1, // XK_Shift_L
        NamedKey::ShiftRight => 0xFFE2,                  // XK_Shift_R
        NamedKey::Control | NamedKey::ControlLeft => 0xFFE3, // XK_Control_L
        NamedKey::ControlRight => 0xFFE4,                // XK_Control_R
        NamedKey::Alt | NamedKey::AltLeft => 0xFFE9,     // XK_Alt_L
        NamedKey::AltRight => 0xFFEA,                    // XK_Alt_R
        NamedKey::Meta | NamedKey::MetaLeft => 0xFFEB,   // XK_Super_L
        NamedKey::MetaRight => 0xFFEC,                   // XK_Super_R
        NamedKey::Enter => 0xFF0D,                       // XK_Return
        NamedKey::Backspace => 0xFF08,                   // XK_BackSpace
        NamedKey::Tab => 0xFF09,                         // XK_Tab
        NamedKey::CapsLock => 0xFFE5,                    // XK_Caps_Lock
        NamedKey::Escape => 0xFF1B,                      // XK_Escape
        NamedKey::Space => 0x0020,                       // XK_space
        NamedKey::ArrowLeft => 0xFF51,                   // XK_Left
        NamedKey::ArrowUp => 0xFF52,                     // XK_Up
        NamedKey::ArrowRight => 0xFF53,                  // XK_Right
        NamedKey::ArrowDown => 0xFF54,                   // XK_Down
        NamedKey::F1 => 0xFFBE,
        NamedKey::F2 => 0xFFBF,
        NamedKey::F3 => 0xFFC0,
        NamedKey::F4 => 0xFFC1,
        NamedKey::F5 => 0xFFC2,
        NamedKey::F6 => 0xFFC3,
        NamedKey::F7 => 0xFFC4,
        NamedKey::F8 => 0xFFC5,
        NamedKey::F9 => 0xFFC6,
        NamedKey::F10 => 0xFFC7,
        NamedKey::F11 => 0xFFC8,
        NamedKey::F12 => 0xFFC9,
        NamedKey::Delete => 0xFFFF,   // XK_Delete
        NamedKey::Insert => 0xFF63,   // XK_Insert
        NamedKey::Home => 0xFF50,     // XK_Home
        NamedKey::End => 0xFF57,      // XK_End
        NamedKey::PageUp => 0xFF55,   // XK_Prior
        NamedKey::PageDown => 0xFF56, // XK_Next
    }
}

/// Translates a literal character into an X11 KeySym.
pub fn char_to_keysym(c: char) -> Option<u32> {
    let cp = c as u32;
    match c {
        '\n' | '\r' => Some(0xFF0D),
        '\t' => Some(0xFF09),
        '\u{8}' => Some(0xFF08),
        _ if c.is_control() => None,
        _ if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) => Some(cp),
        _ => Some(UNICODE_KEYSYM_OFFSET + cp),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
