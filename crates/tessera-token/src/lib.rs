//! Tessera Token - stateless, tamper-evident tokens.
//!
//! A token is the base64 encoding of `signature || payload`, where the
//! payload is either `subject` or `subject&exp=<unix-millis>`. Nothing is
//! stored server-side: verification needs only the public key.
//!
//! Tokens back two flows:
//! - CSRF protection for form submissions ([`CsrfGuard`])
//! - short-lived correlation across redirects (e.g. OAuth `state`)
//!
//! # Example
//!
//! ```
//! use tessera_crypto::KeyPair;
//! use tessera_token::{TokenMode, TokenService};
//!
//! let service = TokenService::new(KeyPair::generate());
//!
//! let token = service.mint("member-42", TokenMode::Expiring).unwrap();
//! assert_eq!(service.verify(&token, TokenMode::Expiring).as_deref(), Some("member-42"));
//!
//! // Anything else collapses to `None`.
//! assert_eq!(service.verify("garbage", TokenMode::Expiring), None);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod clock;
mod csrf;
mod error;
mod service;

pub use clock::{Clock, SystemClock};
pub use csrf::CsrfGuard;
pub use error::{TokenError, TokenResult};
pub use service::{DEFAULT_TTL, EXPIRY_MARKER, TokenMode, TokenService};
