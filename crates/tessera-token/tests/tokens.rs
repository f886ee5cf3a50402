//! Token minting and verification with keys from disk and a manual clock.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tessera_crypto::KeyEncoding;
use tessera_test::{ManualClock, TestKeys, test_service};
use tessera_token::{CsrfGuard, TokenMode, TokenService};

#[test]
fn test_round_trip_with_stored_keys() {
    let keys = TestKeys::new(KeyEncoding::Seed);
    let minted = {
        let service = TokenService::new(keys.store.load_or_generate().unwrap());
        service.mint("user@example.com", TokenMode::Expiring).unwrap()
    };

    // A second worker loading the same files verifies the first one's token.
    let service = TokenService::new(keys.store.load_or_generate().unwrap());
    assert_eq!(
        service.verify(&minted, TokenMode::Expiring).as_deref(),
        Some("user@example.com")
    );
}

#[test]
fn test_expiry_boundary() {
    let (service, clock) = test_service();
    let token = service.mint("sess-1", TokenMode::Expiring).unwrap();

    clock.advance(service.ttl());
    assert_eq!(
        service.verify(&token, TokenMode::Expiring).as_deref(),
        Some("sess-1"),
        "valid at exactly the deadline"
    );

    clock.advance(Duration::from_millis(1));
    assert_eq!(service.verify(&token, TokenMode::Expiring), None);
}

#[test]
fn test_custom_ttl() {
    let clock = ManualClock::default();
    let keys = TestKeys::new(KeyEncoding::Expanded);
    let service = TokenService::new(keys.store.load_or_generate().unwrap())
        .with_ttl(Duration::from_secs(30))
        .with_clock(Arc::new(clock.clone()));

    let token = service.mint("sess-2", TokenMode::Expiring).unwrap();
    clock.advance(Duration::from_secs(29));
    assert!(service.verify(&token, TokenMode::Expiring).is_some());
    clock.advance(Duration::from_secs(2));
    assert!(service.verify(&token, TokenMode::Expiring).is_none());
}

#[test]
fn test_mode_mismatch() {
    let (service, clock) = test_service();

    let plain = service.mint("alice", TokenMode::Plain).unwrap();
    assert_eq!(
        service.verify(&plain, TokenMode::Expiring).as_deref(),
        Some("alice"),
        "a plain token carries no deadline to enforce"
    );

    let expiring = service.mint("alice", TokenMode::Expiring).unwrap();
    let deadline = ManualClock::DEFAULT_START + 600_000;
    assert_eq!(
        service.verify(&expiring, TokenMode::Plain),
        Some(format!("alice&exp={deadline}")),
        "plain verification leaves the suffix in place"
    );

    clock.advance(Duration::from_secs(3600));
    assert!(service.verify(&expiring, TokenMode::Expiring).is_none());
    assert!(
        service.verify(&expiring, TokenMode::Plain).is_some(),
        "plain verification never checks the deadline"
    );
}

#[test]
fn test_tampered_token_is_rejected() {
    let (service, _clock) = test_service();
    let token = service.mint("bob", TokenMode::Plain).unwrap();

    let mut envelope = STANDARD.decode(&token).unwrap();
    let last = envelope.len() - 1;
    envelope[last] ^= b'c' ^ b'b';
    let forged = STANDARD.encode(&envelope);

    assert_eq!(service.verify(&forged, TokenMode::Plain), None);
    assert_eq!(service.verify("not base64!", TokenMode::Plain), None);
    assert_eq!(service.verify("", TokenMode::Plain), None);
}

#[test]
fn test_other_key_is_rejected() {
    let (minter, _) = test_service();
    let (verifier, _) = test_service();
    let token = minter.mint("carol", TokenMode::Plain).unwrap();
    assert_eq!(verifier.verify(&token, TokenMode::Plain), None);
}

#[test]
fn test_csrf_guard_expires() {
    let (service, clock) = test_service();
    let guard = CsrfGuard::new(Arc::new(service));

    let token = guard.issue("sess-9").unwrap();
    assert!(guard.check(Some(&token), "sess-9"));
    clock.advance(Duration::from_secs(11 * 60));
    assert!(!guard.check(Some(&token), "sess-9"));
}
