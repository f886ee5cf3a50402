//! Token minting errors.
//!
//! Verification has no error type on purpose: every failure is `None`.

use thiserror::Error;

/// Errors that can occur while minting a token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The subject contains the reserved expiry marker.
    #[error("subject must not contain the reserved marker '&exp='")]
    ReservedMarker,

    /// The expiry deadline does not fit in a millisecond timestamp.
    #[error("token expiry overflows the timestamp range")]
    ExpiryOverflow,
}

/// Result type for token operations.
pub type TokenResult<T> = Result<T, TokenError>;
