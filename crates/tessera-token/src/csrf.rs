//! CSRF protection for form submissions.

use std::sync::Arc;

use tracing::debug;

use crate::error::TokenResult;
use crate::service::{TokenMode, TokenService};

/// Issues and checks CSRF tokens bound to a session identifier.
///
/// Tokens are always [`TokenMode::Expiring`]; a rejected submission should
/// send the user back to reload the form.
#[derive(Debug, Clone)]
pub struct CsrfGuard {
    tokens: Arc<TokenService>,
}

impl CsrfGuard {
    /// Wrap a shared token service.
    #[must_use]
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }

    /// Token to embed in a rendered form for `session_id`.
    ///
    /// # Errors
    ///
    /// See [`TokenService::mint`].
    pub fn issue(&self, session_id: &str) -> TokenResult<String> {
        self.tokens.mint(session_id, TokenMode::Expiring)
    }

    /// Whether a submitted token is valid for `session_id`.
    ///
    /// A missing token is rejected.
    #[must_use]
    pub fn check(&self, presented: Option<&str>, session_id: &str) -> bool {
        let Some(token) = presented else {
            debug!("csrf token missing from submission");
            return false;
        };
        self.tokens
            .verify_subject(token, session_id, TokenMode::Expiring)
    }
}
