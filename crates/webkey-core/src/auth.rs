//! PIN and bearer-token value types.
//!
//! # For beginners
//!
//! Pairing a browser works in two steps:
//!
//! 1. The server prints a six-digit PIN on its console.
//! 2. The browser submits that PIN once and receives an opaque
//!    [`AuthToken`] back.  Every later request carries the token in an
//!    `Authorization: Bearer <token>` header (HTTP) or a `token` field
//!    (WebSocket).
//!
//! This module only defines the values.  Issuing, expiring and persisting
//! them is the server's job.
//!
//! Timestamps are Unix seconds as `f64`, which is also how they are written
//! to the token file.

use std::borrow::Borrow;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Seconds since the Unix epoch, with sub-second precision.
pub type UnixSeconds = f64;

/// Number of decimal digits in a PIN.
pub const PIN_LENGTH: usize = 6;

/// How long a freshly issued PIN can be redeemed.
pub const DEFAULT_PIN_TTL: Duration = Duration::from_secs(300);

/// How long an issued token stays valid.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Returns the current wall-clock time as [`UnixSeconds`].
///
/// A clock set before 1970 reads as `0.0`.
pub fn unix_now() -> UnixSeconds {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

// ── AuthToken ─────────────────────────────────────────────────────────────────

/// An opaque bearer credential handed to a browser after PIN redemption.
///
/// Serialized as a bare string so the token file is a plain JSON object.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    /// Generates a new random token (UUID v4, hyphenated).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for AuthToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for AuthToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Borrow<str> for AuthToken {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Only a prefix is printed so log lines never carry a usable credential.
impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(8).collect();
        write!(f, "AuthToken({prefix}…)")
    }
}

// ── Pin ───────────────────────────────────────────────────────────────────────

/// Error returned when a submitted PIN is not six decimal digits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PinFormatError {
    #[error("PIN must not be empty")]
    Empty,

    #[error("PIN must be {PIN_LENGTH} digits, got {0} characters")]
    WrongLength(usize),

    #[error("PIN must contain only digits")]
    NotNumeric,
}

/// A six-digit one-time PIN, leading zeros significant.
#[derive(Clone, PartialEq, Eq)]
pub struct Pin(String);

impl Pin {
    /// Formats `n` as a zero-padded six-digit PIN.
    ///
    /// Values above `999_999` wrap, so any `u32` is accepted.
    pub fn from_number(n: u32) -> Self {
        Self(format!("{:06}", n % 1_000_000))
    }

    /// Parses user input into a PIN.
    ///
    /// Surrounding whitespace and a single `-` between the two groups of
    /// three (the console shows PINs as `042-917`) are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PinFormatError`] when what remains is not exactly six ASCII
    /// digits.
    pub fn parse(input: &str) -> Result<Self, PinFormatError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PinFormatError::Empty);
        }
        let separator = PIN_LENGTH / 2;
        let digits: String = if trimmed.len() == PIN_LENGTH + 1
            && trimmed.as_bytes()[separator] == b'-'
        {
            format!("{}{}", &trimmed[..separator], &trimmed[separator + 1..])
        } else {
            trimmed.to_string()
        };
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(PinFormatError::NotNumeric);
        }
        if digits.len() != PIN_LENGTH {
            return Err(PinFormatError::WrongLength(digits.chars().count()));
        }
        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The PIN split in two groups of three, e.g. `042-917`.
    pub fn display_grouped(&self) -> String {
        let (head, tail) = self.0.split_at(PIN_LENGTH / 2);
        format!("{head}-{tail}")
    }

    /// Compares two PINs without short-circuiting on the first mismatch.
    pub fn matches(&self, other: &Pin) -> bool {
        let a = self.0.as_bytes();
        let b = other.0.as_bytes();
        if a.len() != b.len() {
            return false;
        }
        a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin(******)")
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_are_unique_uuids() {
        let a = AuthToken::generate();
        let b = AuthToken::generate();
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn test_token_serializes_as_bare_string() {
        let token = AuthToken::from("abc");
        assert_eq!(serde_json::to_string(&token).unwrap(), "\"abc\"");
    }

    #[test]
    fn test_token_debug_does_not_leak_full_value() {
        let token = AuthToken::from("0123456789abcdef");
        let debug = format!("{token:?}");
        assert!(!debug.contains("89abcdef"));
        assert!(debug.contains("01234567"));
    }

    #[test]
    fn test_pin_from_number_zero_pads() {
        assert_eq!(Pin::from_number(42).as_str(), "000042");
        assert_eq!(Pin::from_number(0).as_str(), "000000");
        assert_eq!(Pin::from_number(999_999).as_str(), "999999");
    }

    #[test]
    fn test_pin_from_number_wraps_large_values() {
        assert_eq!(Pin::from_number(1_000_042).as_str(), "000042");
    }

    #[test]
    fn test_pin_parse_accepts_plain_and_grouped_forms() {
        let expected = Pin::from_number(42_917);
        assert_eq!(Pin::parse("042917"), Ok(expected.clone()));
        assert_eq!(Pin::parse("042-917"), Ok(expected.clone()));
        assert_eq!(Pin::parse("  042917\n"), Ok(expected));
    }

    #[test]
    fn test_pin_parse_rejects_bad_input() {
        assert_eq!(Pin::parse(""), Err(PinFormatError::Empty));
        assert_eq!(Pin::parse("   "), Err(PinFormatError::Empty));
        assert_eq!(Pin::parse("12345"), Err(PinFormatError::WrongLength(5)));
        assert_eq!(Pin::parse("1234567"), Err(PinFormatError::WrongLength(7)));
        assert_eq!(Pin::parse("12a456"), Err(PinFormatError::NotNumeric));
        assert_eq!(Pin::parse("12-34-56"), Err(PinFormatError::NotNumeric));
    }

    #[test]
    fn test_pin_parse_accepts_separator_only_between_groups() {
        assert_eq!(Pin::parse("-042917"), Err(PinFormatError::NotNumeric));
        assert_eq!(Pin::parse("042917-"), Err(PinFormatError::NotNumeric));
        assert_eq!(Pin::parse("04-2917"), Err(PinFormatError::NotNumeric));
        assert!(Pin::parse("042-917").is_ok());
    }

    #[test]
    fn test_pin_display_grouped() {
        assert_eq!(Pin::from_number(42_917).display_grouped(), "042-917");
    }

    #[test]
    fn test_pin_matches() {
        let pin = Pin::from_number(123_456);
        assert!(pin.matches(&Pin::from_number(123_456)));
        assert!(!pin.matches(&Pin::from_number(123_457)));
    }

    #[test]
    fn test_pin_debug_is_redacted() {
        assert_eq!(format!("{:?}", Pin::from_number(1)), "Pin(******)");
    }

    #[test]
    fn test_unix_now_is_after_2020() {
        assert!(unix_now() > 1_577_836_800.0);
    }
}
