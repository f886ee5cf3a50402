//! Convenient re-exports for tests.

pub use crate::fixtures::{
    TestKeys, init_test_logging, test_keypair, test_principal, test_role, test_service,
};
pub use crate::mocks::{DirectoryBehavior, ManualClock, MockRoleDirectory};
