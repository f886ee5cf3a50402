//! Tessera Test - shared test utilities.
//!
//! Mock collaborators and fixtures used across Tessera crates as a
//! dev-dependency.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! tessera-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tessera_permissions::{Capabilities, PermissionEvaluator};
//! use tessera_test::{MockRoleDirectory, test_principal, test_role};
//!
//! #[tokio::test]
//! async fn test_reader() {
//!     let directory = MockRoleDirectory::new()
//!         .with_roles("alice", vec![test_role("Reader", Capabilities::USER_READ)]);
//!     let evaluator = PermissionEvaluator::new(Arc::new(directory));
//!     let alice = test_principal("alice");
//!     assert!(evaluator.has_capability(Some(&alice), Capabilities::USER_READ).await.unwrap());
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
