//! Mock implementations for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use tessera_permissions::{DirectoryError, DirectoryResult, PrincipalId, Role, RoleDirectory};
use tessera_token::Clock;

/// What a [`MockRoleDirectory`] does when asked for roles.
#[derive(Debug, Clone)]
pub enum DirectoryBehavior {
    /// Answer from the configured role map. Unknown principals have no roles.
    Answer,
    /// Fail every lookup with this error.
    Fail(DirectoryError),
    /// Sleep before answering from the role map.
    Delay(Duration),
}

/// In-memory implementation of [`RoleDirectory`].
///
/// Clones share state, so a test can keep a handle for assertions after
/// moving one into an evaluator.
#[derive(Debug, Clone)]
pub struct MockRoleDirectory {
    roles: Arc<Mutex<HashMap<PrincipalId, Vec<Role>>>>,
    behavior: Arc<Mutex<DirectoryBehavior>>,
    calls: Arc<AtomicUsize>,
}

impl MockRoleDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            roles: Arc::new(Mutex::new(HashMap::new())),
            behavior: Arc::new(Mutex::new(DirectoryBehavior::Answer)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Assign `roles` to `principal`, replacing earlier assignments.
    #[must_use]
    pub fn with_roles(self, principal: impl Into<PrincipalId>, roles: Vec<Role>) -> Self {
        self.set_roles(principal, roles);
        self
    }

    /// Fail every lookup with `error`.
    #[must_use]
    pub fn with_failure(self, error: DirectoryError) -> Self {
        self.set_behavior(DirectoryBehavior::Fail(error));
        self
    }

    /// Delay every lookup by `delay`.
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        self.set_behavior(DirectoryBehavior::Delay(delay));
        self
    }

    /// Replace the roles of `principal`.
    pub fn set_roles(&self, principal: impl Into<PrincipalId>, roles: Vec<Role>) {
        if let Ok(mut guard) = self.roles.lock() {
            guard.insert(principal.into(), roles);
        }
    }

    /// Change how lookups behave.
    pub fn set_behavior(&self, behavior: DirectoryBehavior) {
        if let Ok(mut guard) = self.behavior.lock() {
            *guard = behavior;
        }
    }

    /// Number of lookups served so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, principal: &PrincipalId) -> Vec<Role> {
        self.roles
            .lock()
            .ok()
            .and_then(|guard| guard.get(principal).cloned())
            .unwrap_or_default()
    }
}

impl Default for MockRoleDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoleDirectory for MockRoleDirectory {
    async fn roles_for(&self, principal: &PrincipalId) -> DirectoryResult<Vec<Role>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self
            .behavior
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or(DirectoryBehavior::Answer);

        match behavior {
            DirectoryBehavior::Answer => Ok(self.lookup(principal)),
            DirectoryBehavior::Fail(error) => Err(error),
            DirectoryBehavior::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(self.lookup(principal))
            },
        }
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    /// 2023-11-14T22:13:20Z, a fixed point far from any edge.
    pub const DEFAULT_START: i64 = 1_700_000_000_000;

    /// Create a clock reading `start_millis`.
    #[must_use]
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start_millis)),
        }
    }

    /// Jump to `millis`.
    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }

    /// Move forward by `by`, saturating.
    pub fn advance(&self, by: Duration) {
        let step = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
        let _ = self
            .now
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_add(step))
            });
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Self::DEFAULT_START)
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
