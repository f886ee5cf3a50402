//! Ed25519 key pairs with secure memory handling.
//!
//! The token service holds exactly one [`KeyPair`] for the lifetime of the
//! process; verifiers only need the [`PublicKey`].

use ed25519_dalek::{SECRET_KEY_LENGTH, Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{CryptoError, CryptoResult};
use crate::signature::{SIGNATURE_LENGTH, Signature};
use crate::store::KeyEncoding;

/// Length of the expanded `seed || public` secret encoding.
const EXPANDED_LENGTH: usize = 64;

/// An Ed25519 key pair with secure memory handling.
///
/// The secret key is zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct KeyPair {
    #[zeroize(skip)] // VerifyingKey doesn't implement Zeroize
    verifying_key: VerifyingKey,
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a new random key pair.
    #[must_use]
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();
        Self {
            verifying_key,
            signing_key,
        }
    }

    /// Create from a 32-byte seed.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] if the slice is not exactly 32 bytes.
    pub fn from_seed(bytes: &[u8]) -> CryptoResult<Self> {
        let mut seed: [u8; SECRET_KEY_LENGTH] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: SECRET_KEY_LENGTH,
                    actual: bytes.len(),
                })?;

        let signing_key = SigningKey::from_bytes(&seed);
        seed.zeroize();

        Ok(Self {
            verifying_key: signing_key.verifying_key(),
            signing_key,
        })
    }

    /// Create from the 64-byte `seed || public` encoding.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] for the wrong length, or
    /// [`CryptoError::KeyMismatch`] if the public suffix was not derived
    /// from the seed.
    pub fn from_expanded(bytes: &[u8]) -> CryptoResult<Self> {
        let mut expanded: [u8; EXPANDED_LENGTH] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: EXPANDED_LENGTH,
                    actual: bytes.len(),
                })?;

        let result = SigningKey::from_keypair_bytes(&expanded);
        expanded.zeroize();
        let signing_key = result.map_err(|_| {
            CryptoError::KeyMismatch("public suffix does not match the seed".into())
        })?;

        Ok(Self {
            verifying_key: signing_key.verifying_key(),
            signing_key,
        })
    }

    /// Decode secret key bytes in the given encoding.
    ///
    /// # Errors
    ///
    /// See [`from_seed`](Self::from_seed) and [`from_expanded`](Self::from_expanded).
    pub fn from_encoded(bytes: &[u8], encoding: KeyEncoding) -> CryptoResult<Self> {
        match encoding {
            KeyEncoding::Seed => Self::from_seed(bytes),
            KeyEncoding::Expanded => Self::from_expanded(bytes),
        }
    }

    /// Export the secret key in the given encoding (careful - sensitive!).
    #[must_use]
    pub fn to_encoded(&self, encoding: KeyEncoding) -> Zeroizing<Vec<u8>> {
        match encoding {
            KeyEncoding::Seed => Zeroizing::new(self.signing_key.to_bytes().to_vec()),
            KeyEncoding::Expanded => Zeroizing::new(self.signing_key.to_keypair_bytes().to_vec()),
        }
    }

    /// Get the public key bytes (32 bytes).
    #[must_use]
    pub fn public_key_bytes(&self) -> &[u8; 32] {
        self.verifying_key.as_bytes()
    }

    /// Get the key ID as a hex string (first 8 bytes of the public key).
    #[must_use]
    pub fn key_id_hex(&self) -> String {
        self.export_public_key().key_id_hex()
    }

    /// Sign a message.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature::from(self.signing_key.sign(message))
    }

    /// Sign a message and return `signature || message`.
    #[must_use]
    pub fn sign_attached(&self, message: &[u8]) -> Vec<u8> {
        let sig = self.sign(message);
        let mut envelope = Vec::with_capacity(SIGNATURE_LENGTH.saturating_add(message.len()));
        envelope.extend_from_slice(sig.as_bytes());
        envelope.extend_from_slice(message);
        envelope
    }

    /// The public half, for verifiers and the public key file.
    #[must_use]
    pub fn export_public_key(&self) -> PublicKey {
        PublicKey(*self.public_key_bytes())
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("key_id", &self.key_id_hex())
            .finish_non_exhaustive()
    }
}

/// An Ed25519 public key, stored as base64 next to the secret key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    /// Get the key ID as a hex string.
    ///
    /// Useful for identifying keys in logs without exposing the full key.
    #[must_use]
    pub fn key_id_hex(&self) -> String {
        hex::encode(&self.0[..8])
    }

    /// Encode as base64 string.
    #[must_use]
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(self.0)
    }

    /// Decode from base64 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid base64 or not 32 bytes.
    pub fn from_base64(s: &str) -> CryptoResult<Self> {
        use base64::Engine;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(s.trim())
            .map_err(|_| CryptoError::InvalidBase64Encoding)?;
        let key: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(Self(key))
    }

    /// Verify a detached signature against this public key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::SignatureVerificationFailed`] if verification fails.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> CryptoResult<()> {
        signature.verify(message, &self.0)
    }

    /// Open an attached envelope, returning the signed message.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidSignatureLength`] if the envelope is too
    /// short, or [`CryptoError::SignatureVerificationFailed`] if the
    /// signature does not cover the message under this key.
    pub fn open(&self, envelope: &[u8]) -> CryptoResult<Vec<u8>> {
        let (signature, message) = Signature::split_attached(envelope)?;
        self.verify(message, &signature)?;
        Ok(message.to_vec())
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", self.key_id_hex())
    }
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_base64())
    }
}
