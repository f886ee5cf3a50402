//! The signed token service.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tessera_crypto::{KeyPair, PublicKey};
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::error::{TokenError, TokenResult};

/// Separator between the subject and the embedded deadline.
pub const EXPIRY_MARKER: &str = "&exp=";

/// Lifetime of [`TokenMode::Expiring`] tokens unless overridden.
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

/// Whether a token carries an embedded deadline.
///
/// The same mode must be passed to [`TokenService::mint`] and
/// [`TokenService::verify`]; give each token-consuming flow one constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenMode {
    /// Payload is the bare subject. Never expires.
    Plain,
    /// Payload is `subject&exp=<unix-millis>`, enforced on verification.
    Expiring,
}

impl fmt::Display for TokenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Expiring => write!(f, "expiring"),
        }
    }
}

/// Why a token was rejected. Logged, never returned.
#[derive(Debug, Clone, Copy)]
enum Rejection {
    Encoding,
    Signature,
    Utf8,
    MalformedExpiry,
    Expired,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Encoding => "invalid base64",
            Self::Signature => "signature check failed",
            Self::Utf8 => "payload is not utf-8",
            Self::MalformedExpiry => "malformed expiry suffix",
            Self::Expired => "expired",
        };
        f.write_str(reason)
    }
}

/// Mints and verifies tokens with one process-wide signing key.
///
/// Build it once at startup and share it behind an [`Arc`].
pub struct TokenService {
    keypair: KeyPair,
    public_key: PublicKey,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// Create a service around a loaded key pair, with the default TTL and
    /// the system clock.
    #[must_use]
    pub fn new(keypair: KeyPair) -> Self {
        let public_key = keypair.export_public_key();
        Self {
            keypair,
            public_key,
            ttl: DEFAULT_TTL,
            clock: Arc::new(SystemClock),
        }
    }

    /// Override the lifetime of expiring tokens.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Override the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Public half of the signing key.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// Lifetime of expiring tokens.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a token for `subject`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::ReservedMarker`] if the subject contains
    /// [`EXPIRY_MARKER`], or [`TokenError::ExpiryOverflow`] if the deadline
    /// cannot be represented.
    pub fn mint(&self, subject: &str, mode: TokenMode) -> TokenResult<String> {
        if subject.contains(EXPIRY_MARKER) {
            return Err(TokenError::ReservedMarker);
        }

        let payload = match mode {
            TokenMode::Plain => subject.to_owned(),
            TokenMode::Expiring => {
                let deadline = self.deadline()?;
                format!("{subject}{EXPIRY_MARKER}{deadline}")
            },
        };

        let envelope = self.keypair.sign_attached(payload.as_bytes());
        Ok(STANDARD.encode(envelope))
    }

    /// Verify a presented token and recover its subject.
    ///
    /// With [`TokenMode::Expiring`] the embedded deadline is enforced and
    /// stripped; a payload without a deadline is returned whole. With
    /// [`TokenMode::Plain`] the payload is returned unmodified.
    ///
    /// Returns `None` for every failure (bad encoding, forged or tampered
    /// signature, malformed deadline, expired) so callers cannot tell them
    /// apart.
    #[must_use]
    pub fn verify(&self, token: &str, mode: TokenMode) -> Option<String> {
        match self.check(token, mode) {
            Ok(subject) => Some(subject),
            Err(reason) => {
                debug!(%reason, %mode, "token rejected");
                None
            },
        }
    }

    /// Verify a token and compare its subject with `expected` in constant time.
    #[must_use]
    pub fn verify_subject(&self, token: &str, expected: &str, mode: TokenMode) -> bool {
        self.verify(token, mode)
            .is_some_and(|subject| bool::from(subject.as_bytes().ct_eq(expected.as_bytes())))
    }

    fn deadline(&self) -> TokenResult<i64> {
        let ttl_ms = i64::try_from(self.ttl.as_millis()).map_err(|_| TokenError::ExpiryOverflow)?;
        self.clock
            .now_millis()
            .checked_add(ttl_ms)
            .ok_or(TokenError::ExpiryOverflow)
    }

    fn check(&self, token: &str, mode: TokenMode) -> Result<String, Rejection> {
        let envelope = STANDARD
            .decode(token.trim())
            .map_err(|_| Rejection::Encoding)?;
        let message = self
            .public_key
            .open(&envelope)
            .map_err(|_| Rejection::Signature)?;
        let payload = String::from_utf8(message).map_err(|_| Rejection::Utf8)?;

        match mode {
            TokenMode::Plain => Ok(payload),
            TokenMode::Expiring => self.strip_deadline(payload),
        }
    }

    fn strip_deadline(&self, payload: String) -> Result<String, Rejection> {
        let Some((subject, deadline)) = payload.split_once(EXPIRY_MARKER) else {
            return Ok(payload);
        };

        if deadline.is_empty() || !deadline.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Rejection::MalformedExpiry);
        }
        let deadline: i64 = deadline.parse().map_err(|_| Rejection::MalformedExpiry)?;

        if self.clock.now_millis() > deadline {
            return Err(Rejection::Expired);
        }
        Ok(subject.to_owned())
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("key_id", &self.public_key.key_id_hex())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    #[derive(Debug)]
    struct StepClock(AtomicI64);

    impl StepClock {
        fn at(millis: i64) -> Arc<Self> {
            Arc::new(Self(AtomicI64::new(millis)))
        }

        fn set(&self, millis: i64) {
            self.0.store(millis, Ordering::SeqCst);
        }
    }

    impl Clock for StepClock {
        fn now_millis(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    const T0: i64 = 1_700_000_000_000;

    fn service_at(clock: Arc<StepClock>) -> TokenService {
        TokenService::new(KeyPair::generate()).with_clock(clock)
    }

    /// Sign an arbitrary payload with the service key, bypassing `mint` checks.
    fn forge_with_service_key(service: &TokenService, payload: &str) -> String {
        STANDARD.encode(service.keypair.sign_attached(payload.as_bytes()))
    }

    fn payload_of(token: &str) -> String {
        let bytes = STANDARD.decode(token).unwrap();
        String::from_utf8(bytes[64..].to_vec()).unwrap()
    }

    #[test]
    fn test_plain_roundtrip() {
        let service = service_at(StepClock::at(T0));
        let token = service.mint("user-7", TokenMode::Plain).unwrap();

        assert_eq!(payload_of(&token), "user-7");
        assert_eq!(
            service.verify(&token, TokenMode::Plain).as_deref(),
            Some("user-7")
        );
    }

    #[test]
    fn test_expiring_payload_layout() {
        let service = service_at(StepClock::at(T0));
        let token = service.mint("user-7", TokenMode::Expiring).unwrap();

        assert_eq!(payload_of(&token), format!("user-7&exp={}", T0 + 600_000));
    }

    #[test]
    fn test_expiring_roundtrip_strips_deadline() {
        let service = service_at(StepClock::at(T0));
        let token = service.mint("user-7", TokenMode::Expiring).unwrap();
        assert_eq!(
            service.verify(&token, TokenMode::Expiring).as_deref(),
            Some("user-7")
        );
    }

    #[test]
    fn test_expiry_boundary() {
        let clock = StepClock::at(T0);
        let service = service_at(Arc::clone(&clock));
        let token = service.mint("csrf", TokenMode::Expiring).unwrap();

        clock.set(T0 + 600_000);
        assert!(service.verify(&token, TokenMode::Expiring).is_some());

        clock.set(T0 + 600_001);
        assert!(service.verify(&token, TokenMode::Expiring).is_none());
    }

    #[test]
    fn test_custom_ttl() {
        let clock = StepClock::at(T0);
        let service = service_at(Arc::clone(&clock)).with_ttl(Duration::from_secs(5));
        let token = service.mint("oauth-state", TokenMode::Expiring).unwrap();

        clock.set(T0 + 5_001);
        assert!(service.verify(&token, TokenMode::Expiring).is_none());
    }

    #[test]
    fn test_plain_token_under_expiring_mode_is_returned_whole() {
        let service = service_at(StepClock::at(T0));
        let token = service.mint("user-7", TokenMode::Plain).unwrap();
        assert_eq!(
            service.verify(&token, TokenMode::Expiring).as_deref(),
            Some("user-7")
        );
    }

    #[test]
    fn test_expiring_token_under_plain_mode_keeps_suffix() {
        let clock = StepClock::at(T0);
        let service = service_at(Arc::clone(&clock));
        let token = service.mint("user-7", TokenMode::Expiring).unwrap();

        // Plain mode never parses a deadline, even a stale one.
        clock.set(T0 + 3_600_000);
        assert_eq!(
            service.verify(&token, TokenMode::Plain),
            Some(format!("user-7&exp={}", T0 + 600_000))
        );
    }

    #[test]
    fn test_marker_in_subject_is_refused() {
        let service = service_at(StepClock::at(T0));
        for mode in [TokenMode::Plain, TokenMode::Expiring] {
            assert_eq!(
                service.mint("admin&exp=99999999999999", mode),
                Err(TokenError::ReservedMarker)
            );
        }
    }

    #[test]
    fn test_malformed_deadlines_are_rejected() {
        let service = service_at(StepClock::at(T0));
        for payload in [
            "user&exp=",
            "user&exp=+1800000000000",
            "user&exp=-1",
            "user&exp=12ab",
            "user&exp= 1800000000000",
            "user&exp=1800000000000&exp=1",
            "user&exp=99999999999999999999999",
        ] {
            let token = forge_with_service_key(&service, payload);
            assert_eq!(
                service.verify(&token, TokenMode::Expiring),
                None,
                "{payload}"
            );
        }
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let service = service_at(StepClock::at(T0));
        let token = service.mint("user-7", TokenMode::Plain).unwrap();
        let mut bytes = STANDARD.decode(&token).unwrap();

        for i in [0, 63, 64, bytes.len() - 1] {
            bytes[i] ^= 0x80;
            let tampered = STANDARD.encode(&bytes);
            assert!(service.verify(&tampered, TokenMode::Plain).is_none(), "byte {i}");
            bytes[i] ^= 0x80;
        }
    }

    #[test]
    fn test_foreign_key_is_rejected() {
        let issuer = service_at(StepClock::at(T0));
        let verifier = service_at(StepClock::at(T0));
        let token = issuer.mint("user-7", TokenMode::Plain).unwrap();
        assert!(verifier.verify(&token, TokenMode::Plain).is_none());
    }

    #[test]
    fn test_garbage_never_panics() {
        let service = service_at(StepClock::at(T0));
        let long = "A".repeat(200);
        for input in ["", "!!!", "AAAA", "====", long.as_str()] {
            assert!(service.verify(input, TokenMode::Plain).is_none());
            assert!(service.verify(input, TokenMode::Expiring).is_none());
        }
    }

    #[test]
    fn test_non_utf8_payload_is_rejected() {
        let service = service_at(StepClock::at(T0));
        let token = STANDARD.encode(service.keypair.sign_attached(&[0xff, 0xfe]));
        assert!(service.verify(&token, TokenMode::Plain).is_none());
    }

    #[test]
    fn test_verify_subject() {
        let service = service_at(StepClock::at(T0));
        let token = service.mint("session-1", TokenMode::Expiring).unwrap();

        assert!(service.verify_subject(&token, "session-1", TokenMode::Expiring));
        assert!(!service.verify_subject(&token, "session-2", TokenMode::Expiring));
        assert!(!service.verify_subject("bogus", "session-1", TokenMode::Expiring));
    }

    #[test]
    fn test_deadline_overflow() {
        let service = service_at(StepClock::at(i64::MAX - 10));
        assert_eq!(
            service.mint("x", TokenMode::Expiring),
            Err(TokenError::ExpiryOverflow)
        );
        // Plain tokens do not compute a deadline.
        assert!(service.mint("x", TokenMode::Plain).is_ok());
    }

    #[test]
    fn test_debug_hides_key_material() {
        let service = service_at(StepClock::at(T0));
        let rendered = format!("{service:?}");
        assert!(rendered.contains("key_id"));
        assert!(!rendered.contains(&service.public_key().to_base64()));
    }
}
