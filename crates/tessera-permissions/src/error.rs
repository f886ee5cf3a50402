//! Error types for permission evaluation.

use thiserror::Error;

use crate::directory::DirectoryError;

/// Errors that can occur while evaluating permissions.
#[derive(Debug, Error)]
pub enum PermissionError {
    /// The principal lacks the required capability.
    #[error("insufficient permission")]
    AccessDenied,

    /// The role directory failed for a reason other than denial or timeout.
    #[error("role directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// A capability key is not in the table.
    #[error("unknown capability: {0}")]
    UnknownCapability(String),

    /// A raw mask could not be parsed.
    #[error("invalid capability mask: {0}")]
    InvalidMask(String),
}

/// Result type for permission operations.
pub type PermissionResult<T> = Result<T, PermissionError>;
