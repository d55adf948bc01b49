//! PIN Authenticator: the one-time PIN and its exchange for a token.
//!
//! # Lifecycle
//!
//! ```text
//! NotIssued ──issue_pin──▶ Active{pin, expires_at}
//!                             │            │
//!               redeem ok     │            │ redeem at/after expires_at
//!                             ▼            ▼
//!                          Consumed      Expired
//! ```
//!
//! Only [`PinAuthenticator::redeem`] mints tokens, and it does so at most
//! once per issued PIN.  A wrong PIN leaves the active PIN untouched, so a
//! typo does not lock the operator out.

use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tracing::{info, warn};

use webkey_core::protocol::messages::{INVALID_PIN_MESSAGE, UNAUTHORIZED_MESSAGE};
use webkey_core::{AuthToken, Pin, UnixSeconds};

use super::token_store::{StoreError, TokenStore};

/// Error type for authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The PIN is wrong, already used, expired, or was never issued.
    #[error("{}", INVALID_PIN_MESSAGE)]
    InvalidPin,

    /// No bearer token, or one that is not in the store.
    #[error("{}", UNAUTHORIZED_MESSAGE)]
    Unauthorized,

    /// The freshly minted token could not be written to the token store.
    #[error("token store unavailable: {0}")]
    Persistence(#[from] StoreError),
}

/// State of the process-wide PIN.
#[derive(Debug, Clone, PartialEq)]
pub enum PinState {
    NotIssued,
    Active { pin: Pin, expires_at: UnixSeconds },
    Consumed,
    Expired,
}

/// Issues the PIN and redeems it against the [`TokenStore`].
#[derive(Debug)]
pub struct PinAuthenticator {
    state: PinState,
    ttl: Duration,
}

impl PinAuthenticator {
    pub fn new(ttl: Duration) -> Self {
        Self {
            state: PinState::NotIssued,
            ttl,
        }
    }

    pub fn state(&self) -> &PinState {
        &self.state
    }

    /// Draws a uniformly random six-digit PIN valid until `now + ttl`.
    pub fn issue_pin(&mut self, now: UnixSeconds) -> Pin {
        let pin = Pin::from_number(rand::thread_rng().gen_range(0..1_000_000));
        self.install_pin(pin.clone(), now);
        pin
    }

    /// Activates a caller-chosen PIN valid until `now + ttl`.
    pub fn install_pin(&mut self, pin: Pin, now: UnixSeconds) {
        let expires_at = now + self.ttl.as_secs_f64();
        self.state = PinState::Active { pin, expires_at };
    }

    /// Exchanges `submitted` for a new token persisted in `store`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidPin`] when no PIN is active, the value does not
    ///   match, or `now >= expires_at` (the PIN then becomes `Expired`).
    /// - [`AuthError::Persistence`] when the token could not be stored; the
    ///   PIN stays active so the operator can retry.
    pub fn redeem(
        &mut self,
        submitted: &str,
        now: UnixSeconds,
        store: &TokenStore,
    ) -> Result<AuthToken, AuthError> {
        let PinState::Active { pin, expires_at } = &self.state else {
            warn!("PIN submitted but none is active");
            return Err(AuthError::InvalidPin);
        };

        if now >= *expires_at {
            warn!("PIN submitted after expiry");
            self.state = PinState::Expired;
            return Err(AuthError::InvalidPin);
        }

        let candidate = match Pin::parse(submitted) {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!("rejected PIN submission: {e}");
                return Err(AuthError::InvalidPin);
            }
        };
        if !pin.matches(&candidate) {
            warn!("rejected PIN submission: mismatch");
            return Err(AuthError::InvalidPin);
        }

        let token = loop {
            let token = AuthToken::generate();
            if !store.contains(token.as_str()) {
                break token;
            }
        };
        store.add(token.clone(), now)?;

        self.state = PinState::Consumed;
        info!("PIN redeemed; issued a new token");
        Ok(token)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::token_store::MockTokenPersistence;
    use std::path::PathBuf;

    const T0: f64 = 1_700_000_000.0;

    fn accepting_store() -> TokenStore {
        let mut backend = MockTokenPersistence::new();
        backend.expect_save().returning(|_| Ok(()));
        TokenStore::new(Box::new(backend))
    }

    fn authenticator_with(pin: u32) -> PinAuthenticator {
        let mut auth = PinAuthenticator::new(Duration::from_secs(300));
        auth.install_pin(Pin::from_number(pin), T0);
        auth
    }

    #[test]
    fn test_issue_pin_is_six_digits_and_active() {
        // Arrange
        let mut auth = PinAuthenticator::new(Duration::from_secs(300));

        // Act
        let pin = auth.issue_pin(T0);

        // Assert
        assert_eq!(pin.as_str().len(), 6);
        assert!(pin.as_str().chars().all(|c| c.is_ascii_digit()));
        assert_eq!(
            auth.state(),
            &PinState::Active {
                pin,
                expires_at: T0 + 300.0
            }
        );
    }

    #[test]
    fn test_correct_pin_mints_token_once() {
        // Arrange
        let store = accepting_store();
        let mut auth = authenticator_with(42_917);

        // Act
        let token = auth.redeem("042917", T0 + 10.0, &store).unwrap();
        let replay = auth.redeem("042917", T0 + 20.0, &store);

        // Assert
        assert!(store.contains(token.as_str()));
        assert!(matches!(replay, Err(AuthError::InvalidPin)));
        assert_eq!(auth.state(), &PinState::Consumed);
    }

    #[test]
    fn test_grouped_pin_is_accepted() {
        let store = accepting_store();
        let mut auth = authenticator_with(42_917);
        assert!(auth.redeem(" 042-917 ", T0 + 1.0, &store).is_ok());
    }

    #[test]
    fn test_wrong_pin_keeps_pin_active() {
        // Arrange
        let store = accepting_store();
        let mut auth = authenticator_with(42_917);

        // Act
        let wrong = auth.redeem("000000", T0 + 1.0, &store);
        let right = auth.redeem("042917", T0 + 2.0, &store);

        // Assert
        assert!(matches!(wrong, Err(AuthError::InvalidPin)));
        assert!(right.is_ok());
    }

    #[test]
    fn test_malformed_pin_is_invalid() {
        let store = accepting_store();
        let mut auth = authenticator_with(42_917);
        assert!(matches!(
            auth.redeem("42917", T0 + 1.0, &store),
            Err(AuthError::InvalidPin)
        ));
    }

    #[test]
    fn test_expired_pin_is_rejected_even_when_correct() {
        // Arrange
        let store = accepting_store();
        let mut auth = authenticator_with(42_917);

        // Act: exactly at expiry
        let result = auth.redeem("042917", T0 + 300.0, &store);

        // Assert
        assert!(matches!(result, Err(AuthError::InvalidPin)));
        assert_eq!(auth.state(), &PinState::Expired);
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_redeem_without_issued_pin_is_invalid() {
        let store = accepting_store();
        let mut auth = PinAuthenticator::new(Duration::from_secs(300));
        assert!(matches!(
            auth.redeem("000000", T0, &store),
            Err(AuthError::InvalidPin)
        ));
    }

    #[test]
    fn test_persistence_failure_surfaces_and_keeps_pin_active() {
        // Arrange
        let mut backend = MockTokenPersistence::new();
        backend.expect_save().returning(|_| {
            Err(StoreError::Io {
                path: PathBuf::from("t.json"),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            })
        });
        let store = TokenStore::new(Box::new(backend));
        let mut auth = authenticator_with(42_917);

        // Act
        let result = auth.redeem("042917", T0 + 1.0, &store);

        // Assert
        assert!(matches!(result, Err(AuthError::Persistence(_))));
        assert!(matches!(auth.state(), PinState::Active { .. }));
    }

    #[test]
    fn test_error_messages_match_wire_replies() {
        assert_eq!(AuthError::InvalidPin.to_string(), "Invalid or expired PIN");
        assert_eq!(AuthError::Unauthorized.to_string(), "Unauthorized");
    }
}
