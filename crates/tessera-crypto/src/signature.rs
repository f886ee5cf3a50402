//! Ed25519 signatures.
//!
//! Two shapes are used by the token core:
//! - detached: a bare 64-byte [`Signature`]
//! - attached: `signature || message`, produced by
//!   [`KeyPair::sign_attached`](crate::KeyPair::sign_attached) and opened by
//!   [`PublicKey::open`](crate::PublicKey::open)

use ed25519_dalek::{Signature as DalekSignature, VerifyingKey};
use std::fmt;

use crate::error::{CryptoError, CryptoResult};

/// Length of an Ed25519 signature in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// A detached Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LENGTH]);

impl Signature {
    /// Get the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    /// Split an attached envelope into its signature prefix and message.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidSignatureLength`] when the envelope is
    /// shorter than a signature.
    pub fn split_attached(envelope: &[u8]) -> CryptoResult<(Self, &[u8])> {
        let Some((prefix, message)) = envelope.split_first_chunk::<SIGNATURE_LENGTH>() else {
            return Err(CryptoError::InvalidSignatureLength {
                expected: SIGNATURE_LENGTH,
                actual: envelope.len(),
            });
        };
        Ok((Self(*prefix), message))
    }

    /// Strict verification: small-order keys and non-canonical signatures
    /// are rejected.
    pub(crate) fn verify(&self, message: &[u8], public_key: &[u8; 32]) -> CryptoResult<()> {
        let verifying_key = VerifyingKey::from_bytes(public_key)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;

        verifying_key
            .verify_strict(message, &DalekSignature::from_bytes(&self.0))
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", hex::encode(&self.0[..8]))
    }
}

impl From<DalekSignature> for Signature {
    fn from(sig: DalekSignature) -> Self {
        Self(sig.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyPair;

    #[test]
    fn test_split_attached_short_input() {
        let result = Signature::split_attached(&[1u8; 10]);
        assert!(matches!(
            result,
            Err(CryptoError::InvalidSignatureLength {
                expected: 64,
                actual: 10
            })
        ));
    }

    #[test]
    fn test_split_attached_empty_message() {
        let keypair = KeyPair::generate();
        let envelope = keypair.sign_attached(b"");
        let (sig, message) = Signature::split_attached(&envelope).unwrap();
        assert!(message.is_empty());
        assert_eq!(sig, keypair.sign(b""));
        assert!(sig.verify(message, keypair.public_key_bytes()).is_ok());
    }

    #[test]
    fn test_verify_rejects_wrong_message_and_key() {
        let keypair = KeyPair::generate();
        let sig = keypair.sign(b"member-42");

        assert!(sig.verify(b"member-43", keypair.public_key_bytes()).is_err());
        let other = KeyPair::generate();
        assert!(sig.verify(b"member-42", other.public_key_bytes()).is_err());
    }

    #[test]
    fn test_debug_shows_prefix_only() {
        let sig = KeyPair::generate().sign(b"x");
        let shown = format!("{sig:?}");
        assert!(shown.starts_with("Signature("));
        assert_eq!(shown.len(), "Signature(...)".len() + 16);
    }
}
