//! Permission evaluation against a role directory.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::capability::{Capabilities, mask_satisfies};
use crate::directory::{DirectoryError, RoleDirectory};
use crate::error::{PermissionError, PermissionResult};
use crate::role::{PrincipalId, Role};

/// Default bound on a single role lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolves a principal's effective capabilities and checks them.
///
/// Nothing is cached: every check asks the directory again, so role changes
/// take effect on the next request.
pub struct PermissionEvaluator<D: RoleDirectory + ?Sized = dyn RoleDirectory> {
    directory: Arc<D>,
    lookup_timeout: Duration,
}

impl<D: RoleDirectory + ?Sized> PermissionEvaluator<D> {
    /// Create an evaluator with the default lookup timeout.
    #[must_use]
    pub fn new(directory: Arc<D>) -> Self {
        Self {
            directory,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// Override the lookup timeout.
    #[must_use]
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// The configured lookup timeout.
    #[must_use]
    pub fn lookup_timeout(&self) -> Duration {
        self.lookup_timeout
    }

    /// The union of every role mask held by `principal`.
    ///
    /// An absent principal, a denial from the directory, and a lookup that
    /// runs past the timeout all resolve to the empty mask.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionError::Directory`] for any other directory
    /// failure.
    pub async fn effective_mask(
        &self,
        principal: Option<&PrincipalId>,
    ) -> PermissionResult<Capabilities> {
        let Some(principal) = principal else {
            return Ok(Capabilities::empty());
        };

        let lookup = self.directory.roles_for(principal);
        let outcome = match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(outcome) => outcome,
            Err(_) => Err(DirectoryError::Timeout {
                timeout_ms: u64::try_from(self.lookup_timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        };

        match outcome {
            Ok(roles) => {
                let mask = combine(&roles);
                debug!(principal = %principal, roles = roles.len(), mask = mask.bits(), "Resolved effective mask");
                Ok(mask)
            },
            Err(e) if e.fails_closed() => {
                if matches!(e, DirectoryError::Timeout { .. }) {
                    warn!(principal = %principal, error = %e, "Role lookup timed out, treating as no roles");
                } else {
                    debug!(principal = %principal, error = %e, "Role directory denied lookup, treating as no roles");
                }
                Ok(Capabilities::empty())
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Whether `principal` holds every bit of `required`.
    ///
    /// An empty `required` is always `false`, so a requirement computed at
    /// runtime that comes out empty denies rather than grants.
    ///
    /// # Errors
    ///
    /// Propagates directory failures from [`Self::effective_mask`].
    pub async fn has_capability(
        &self,
        principal: Option<&PrincipalId>,
        required: Capabilities,
    ) -> PermissionResult<bool> {
        let mask = self.effective_mask(principal).await?;
        Ok(mask_satisfies(mask, required))
    }

    /// Whether `principal` holds at least one bit of `group`.
    ///
    /// # Errors
    ///
    /// Propagates directory failures from [`Self::effective_mask`].
    pub async fn has_any(
        &self,
        principal: Option<&PrincipalId>,
        group: Capabilities,
    ) -> PermissionResult<bool> {
        let mask = self.effective_mask(principal).await?;
        Ok(mask.intersects(group))
    }

    /// Fail with [`PermissionError::AccessDenied`] unless `principal` holds
    /// every bit of `required`.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionError::AccessDenied`] on a failed check, or a
    /// directory failure from [`Self::effective_mask`].
    pub async fn require_capability(
        &self,
        principal: Option<&PrincipalId>,
        required: Capabilities,
    ) -> PermissionResult<()> {
        if self.has_capability(principal, required).await? {
            Ok(())
        } else {
            Err(PermissionError::AccessDenied)
        }
    }
}

impl<D: RoleDirectory + ?Sized> Clone for PermissionEvaluator<D> {
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
            lookup_timeout: self.lookup_timeout,
        }
    }
}

impl<D: RoleDirectory + ?Sized> std::fmt::Debug for PermissionEvaluator<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionEvaluator")
            .field("lookup_timeout", &self.lookup_timeout)
            .finish_non_exhaustive()
    }
}

/// OR together the masks of `roles`.
#[must_use]
pub fn combine(roles: &[Role]) -> Capabilities {
    roles
        .iter()
        .fold(Capabilities::empty(), |acc, role| acc | role.permissions)
}
