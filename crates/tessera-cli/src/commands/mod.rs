//! CLI command implementations.

pub(crate) mod caps;
pub(crate) mod keys;
pub(crate) mod token;
