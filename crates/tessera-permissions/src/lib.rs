//! Tessera Permissions - capability bitmasks and role-based evaluation.
//!
//! This crate provides:
//! - A 64-bit capability set with a declared-order label table
//! - Roles and the [`RoleDirectory`] trait that supplies them
//! - An HTTP role directory client (feature `http`, on by default)
//! - [`PermissionEvaluator`], which resolves a principal's effective mask
//!   and answers "may they do this?"
//!
//! # Security model
//!
//! Checks are exact: a principal passes only when it holds every bit of the
//! requirement. "Any of this group" is a separate call. Missing principals,
//! directory denials and lookup timeouts all resolve to the empty mask.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use tessera_permissions::prelude::*;
//!
//! struct Static;
//!
//! #[async_trait]
//! impl RoleDirectory for Static {
//!     async fn roles_for(&self, _: &PrincipalId) -> DirectoryResult<Vec<Role>> {
//!         Ok(vec![Role::new("r1", "Editor", Capabilities::USER_READ)])
//!     }
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let evaluator = PermissionEvaluator::new(Arc::new(Static));
//! let alice = PrincipalId::new("alice");
//! assert!(evaluator.has_capability(Some(&alice), Capabilities::USER_READ).await.unwrap());
//! assert!(evaluator.require_capability(Some(&alice), Capabilities::ROLE_ASSIGN).await.is_err());
//! # });
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod capability;
mod directory;
mod error;
mod evaluator;
#[cfg(feature = "http")]
mod http;
mod role;

pub use capability::{
    CAPABILITY_TABLE, Capabilities, CapabilityDef, can_delegate, mask_intersects, mask_satisfies,
    render, render_keys,
};
pub use directory::{DirectoryError, DirectoryResult, RoleDirectory};
pub use error::{PermissionError, PermissionResult};
pub use evaluator::{DEFAULT_LOOKUP_TIMEOUT, PermissionEvaluator, combine};
#[cfg(feature = "http")]
pub use http::HttpRoleDirectory;
pub use role::{PrincipalId, Role};
