//! Integration tests for the PIN exchange and token lifecycle.
//!
//! These drive [`AuthState`] through its public API with both token backends:
//! the in-memory one and the JSON file in a temporary directory.

use std::time::Duration;

use webkey_core::{AuthToken, Pin};
use webkey_server::application::{AuthError, AuthState, PinState, TokenMap};
use webkey_server::infrastructure::storage::{InMemoryTokens, JsonTokenFile};

const T0: f64 = 1_700_000_000.0;
const DAY: f64 = 86_400.0;
const WEEK: Duration = Duration::from_secs(7 * 86_400);
const FIVE_MINUTES: Duration = Duration::from_secs(300);

fn state_with(backend: InMemoryTokens) -> AuthState {
    AuthState::new(Box::new(backend), FIVE_MINUTES, WEEK)
}

#[test]
fn test_pin_is_redeemed_once_then_rejected() {
    // Arrange
    let backend = InMemoryTokens::new();
    let auth = state_with(backend.clone());
    auth.install_pin_at(Pin::from_number(42_917), T0);

    // Act
    let first = auth.redeem_pin_at("042917", T0 + 10.0);
    let second = auth.redeem_pin_at("042917", T0 + 20.0);

    // Assert
    let token = first.expect("first redemption must succeed");
    assert!(matches!(second, Err(AuthError::InvalidPin)));
    assert_eq!(auth.pin_state(), PinState::Consumed);
    assert_eq!(backend.stored().get(token.as_str()), Some(&(T0 + 10.0)));
}

#[test]
fn test_wrong_pin_keeps_the_active_pin() {
    let auth = state_with(InMemoryTokens::new());
    auth.install_pin_at(Pin::from_number(42_917), T0);

    assert!(matches!(
        auth.redeem_pin_at("111111", T0 + 1.0),
        Err(AuthError::InvalidPin)
    ));
    assert!(auth.redeem_pin_at("042-917", T0 + 2.0).is_ok());
}

#[test]
fn test_pin_expires_after_ttl() {
    // Arrange
    let auth = state_with(InMemoryTokens::new());
    auth.install_pin_at(Pin::from_number(42_917), T0);

    // Act
    let result = auth.redeem_pin_at("042917", T0 + 300.0);

    // Assert
    assert!(matches!(result, Err(AuthError::InvalidPin)));
    assert_eq!(auth.pin_state(), PinState::Expired);
}

#[test]
fn test_issued_token_validates_until_token_ttl() {
    // Arrange
    let auth = state_with(InMemoryTokens::new());
    auth.install_pin_at(Pin::from_number(1), T0);
    let token = auth.redeem_pin_at("000001", T0).unwrap();

    // Act / Assert
    assert!(auth.validate_token_at(Some(token.as_str()), T0 + 6.0 * DAY).is_ok());
    assert!(matches!(
        auth.validate_token_at(Some(token.as_str()), T0 + 7.0 * DAY),
        Err(AuthError::Unauthorized)
    ));
}

#[test]
fn test_missing_and_unknown_tokens_are_unauthorized() {
    let auth = state_with(InMemoryTokens::new());
    assert!(auth.validate_token_at(None, T0).is_err());
    assert!(auth.validate_token_at(Some(""), T0).is_err());
    assert!(auth.validate_token_at(Some("never-issued"), T0).is_err());
}

#[test]
fn test_startup_prune_drops_only_expired_tokens() {
    // Arrange
    let tokens: TokenMap = [
        (AuthToken::from("fresh"), T0 - DAY),
        (AuthToken::from("stale"), T0 - 8.0 * DAY),
    ]
    .into_iter()
    .collect();
    let backend = InMemoryTokens::with_tokens(tokens);
    let auth = state_with(backend.clone());

    // Act
    let pruned = auth.prune_tokens_at(T0);

    // Assert
    assert_eq!(pruned.pruned, 1);
    assert!(pruned.contains("fresh"));
    assert!(!backend.stored().contains_key("stale"));
}

#[test]
fn test_tokens_survive_restart_through_token_file() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("authorized_tokens.json");

    let first_run = AuthState::new(Box::new(JsonTokenFile::new(&path)), FIVE_MINUTES, WEEK);
    first_run.install_pin_at(Pin::from_number(123_456), T0);
    let token = first_run.redeem_pin_at("123456", T0 + 1.0).unwrap();
    drop(first_run);

    // Act
    let second_run = AuthState::new(Box::new(JsonTokenFile::new(&path)), FIVE_MINUTES, WEEK);
    let pruned = second_run.prune_tokens_at(T0 + DAY);

    // Assert
    assert_eq!(pruned.pruned, 0);
    assert!(second_run
        .validate_token_at(Some(token.as_str()), T0 + DAY)
        .is_ok());
}

#[test]
fn test_token_file_is_a_json_object_of_creation_times() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("authorized_tokens.json");
    let auth = AuthState::new(Box::new(JsonTokenFile::new(&path)), FIVE_MINUTES, WEEK);
    auth.install_pin_at(Pin::from_number(7), T0);

    // Act
    let token = auth.redeem_pin_at("000007", T0).unwrap();

    // Assert
    let raw = std::fs::read_to_string(&path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed[token.as_str()], serde_json::json!(T0));
}

#[test]
fn test_malformed_token_file_is_treated_as_empty() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("authorized_tokens.json");
    std::fs::write(&path, "{ not json").unwrap();
    let auth = AuthState::new(Box::new(JsonTokenFile::new(&path)), FIVE_MINUTES, WEEK);

    // Act
    let pruned = auth.prune_tokens_at(T0);

    // Assert
    assert!(pruned.tokens.is_empty());
    assert!(auth.validate_token_at(Some("anything"), T0).is_err());
}

#[test]
fn test_wipe_removes_token_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("authorized_tokens.json");
    let auth = AuthState::new(Box::new(JsonTokenFile::new(&path)), FIVE_MINUTES, WEEK);
    auth.install_pin_at(Pin::from_number(7), T0);
    let token = auth.redeem_pin_at("000007", T0).unwrap();

    auth.tokens().wipe().unwrap();

    assert!(!path.exists());
    assert!(auth.validate_token_at(Some(token.as_str()), T0).is_err());
}
