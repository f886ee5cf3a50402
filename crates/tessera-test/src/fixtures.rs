//! Test fixtures for common types.

use std::sync::Arc;

use tempfile::TempDir;
use tessera_crypto::{KeyEncoding, KeyPair, KeyStore};
use tessera_permissions::{Capabilities, PrincipalId, Role};
use tessera_token::TokenService;

use crate::mocks::ManualClock;

/// Create a principal ID.
#[must_use]
pub fn test_principal(id: &str) -> PrincipalId {
    PrincipalId::new(id)
}

/// Create a role whose id is derived from its name.
#[must_use]
pub fn test_role(name: &str, permissions: Capabilities) -> Role {
    Role::new(format!("role-{}", name.to_lowercase()), name, permissions)
}

/// Create a deterministic keypair from a one-byte seed pattern.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_keypair(fill: u8) -> KeyPair {
    KeyPair::from_seed(&[fill; 32]).expect("32-byte seed is always valid")
}

/// Create a token service on a [`ManualClock`], returning both.
#[must_use]
pub fn test_service() -> (TokenService, ManualClock) {
    let clock = ManualClock::default();
    let service = TokenService::new(KeyPair::generate()).with_clock(Arc::new(clock.clone()));
    (service, clock)
}

/// A key store rooted in a temporary directory that lives as long as this
/// value.
#[derive(Debug)]
pub struct TestKeys {
    /// Owns the directory.
    pub dir: TempDir,
    /// Store over `dir/keys/secret.key` and `dir/keys/public.key`.
    pub store: KeyStore,
}

impl TestKeys {
    /// Create a store with the given encoding. Nothing is generated yet.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(encoding: KeyEncoding) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let keys = dir.path().join("keys");
        let store = KeyStore::new(keys.join("secret.key"), keys.join("public.key"), encoding);
        Self { dir, store }
    }
}

/// Install a test subscriber honoring `RUST_LOG`. Safe to call repeatedly.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
