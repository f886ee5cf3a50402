//! Role directory abstraction.
//!
//! The evaluator never talks to a datastore directly; it asks a
//! [`RoleDirectory`] for the roles attached to a principal.

use async_trait::async_trait;
use thiserror::Error;

use crate::role::{PrincipalId, Role};

/// Errors a role directory can report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectoryError {
    /// The directory refused to disclose the principal's roles.
    #[error("access denied by role directory")]
    AccessDenied,

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The directory answered with an unexpected status.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The response could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The lookup did not finish in time.
    #[error("role lookup timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout that elapsed.
        timeout_ms: u64,
    },
}

impl DirectoryError {
    /// Whether this error means "no roles" rather than a fault.
    ///
    /// Denials and timeouts fail closed to an empty mask; everything else is
    /// surfaced to the caller.
    #[must_use]
    pub fn fails_closed(&self) -> bool {
        matches!(self, Self::AccessDenied | Self::Timeout { .. })
    }
}

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Source of role assignments.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    /// Roles currently assigned to `principal`. An unknown principal has no
    /// roles.
    async fn roles_for(&self, principal: &PrincipalId) -> DirectoryResult<Vec<Role>>;
}
