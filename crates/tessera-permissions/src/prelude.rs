//! Convenient re-exports for permission checks.
//!
//! ```
//! use tessera_permissions::prelude::*;
//! ```

pub use crate::{
    Capabilities, DirectoryError, DirectoryResult, PermissionError, PermissionEvaluator,
    PermissionResult, PrincipalId, Role, RoleDirectory, mask_satisfies, render,
};

#[cfg(feature = "http")]
pub use crate::HttpRoleDirectory;
