//! Tessera Crypto - signing primitives and key material for the trust-token core.
//!
//! This crate provides:
//! - Ed25519 key pairs with secure memory handling
//! - Detached signatures and attached (`signature || message`) envelopes
//! - A [`KeyStore`] that persists a key pair as base64 text files and
//!   bootstraps it safely when several workers start at once
//!
//! # Example
//!
//! ```
//! use tessera_crypto::KeyPair;
//!
//! let keypair = KeyPair::generate();
//!
//! // Attached envelope: signature prefix followed by the message.
//! let envelope = keypair.sign_attached(b"member-42");
//! let opened = keypair.export_public_key().open(&envelope).unwrap();
//! assert_eq!(opened, b"member-42");
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod keypair;
mod signature;
mod store;

pub use error::{CryptoError, CryptoResult};
pub use keypair::{KeyPair, PublicKey};
pub use signature::{SIGNATURE_LENGTH, Signature};
pub use store::{KeyEncoding, KeyStore};
