//! Prelude module - commonly used types for convenient import.
//!
//! Use `use tessera_token::prelude::*;` to import all essential types.

// Errors
pub use crate::{TokenError, TokenResult};

// Service
pub use crate::{TokenMode, TokenService};

// Time
pub use crate::{Clock, SystemClock};

// CSRF
pub use crate::CsrfGuard;
